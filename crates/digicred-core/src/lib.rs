//! # digicred-core
//!
//! Core types, traits, and primitives for the DigiCred gateway.
//! This crate defines the shared vocabulary used by every other crate in the workspace:
//! runtime records, protocol states, agent events, and the agent runtime contract.

pub mod error;
pub mod event;
pub mod record;
pub mod runtime;
pub mod state;
pub mod types;

pub use error::{DigiCredError, Result};
pub use event::{AgentEvent, ConnectionEvent, CredentialEvent, EventBus};
pub use record::*;
pub use runtime::{AgentHandle, AgentRuntime};
pub use state::*;
pub use types::*;
