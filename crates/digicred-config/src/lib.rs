//! # digicred-config
//!
//! Configuration for the DigiCred gateway. Reads `digicred.toml`, then lets
//! environment variables override individual keys.
//!
//! Supports hot-reload via filesystem watcher.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::DigiCredConfig;
pub use schema::{
    AgentConfig, ConfigWarning, CredentialWatchMode, LedgerConfig, LoggingConfig,
    PaginationConfig, QrCodeConfig, ServerConfig, WarningSeverity, WorkflowConfig,
};
