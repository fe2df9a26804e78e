//! # digicred-runtime
//!
//! Glue between the REST surface and the agent runtime: the registry of named
//! agents, the workflow correlator that turns completed invitations into
//! auto-accepted credentials, QR rendering, and the per-resource services.
//!
//! [`memory::MemoryRuntime`] is an in-process runtime used by the CLI's
//! default backend and by tests.

pub mod correlator;
pub mod memory;
pub mod qr;
pub mod registry;
pub mod services;

pub use correlator::{CompletionCallback, WorkflowCorrelator, WorkflowStats, WorkflowStatsSnapshot};
pub use memory::{HolderBehavior, MemoryAgent, MemoryRuntime};
pub use registry::AgentRegistry;
pub use services::{
    AgentService, AgentSummary, ConnectionService, LedgerService, MessageService, NewInvitation,
    Services,
};
