use thiserror::Error;

/// Unified error type for the DigiCred gateway.
#[derive(Error, Debug)]
pub enum DigiCredError {
    // ── Agent errors ───────────────────────────────────────────
    #[error("agent not initialized: {0}")]
    AgentNotInitialized(String),

    #[error("agent creation failed: {name}: {reason}")]
    AgentCreation { name: String, reason: String },

    // ── Record errors ──────────────────────────────────────────
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    // ── Query errors ───────────────────────────────────────────
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // ── Runtime errors ─────────────────────────────────────────
    #[error("agent runtime error: {operation}: {reason}")]
    Runtime { operation: String, reason: String },

    #[error("ledger operation failed: {0}")]
    Ledger(String),

    // ── QR code errors ─────────────────────────────────────────
    #[error("qr code rendering failed: {0}")]
    QrCode(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl DigiCredError {
    /// Shorthand for a failure reported by the agent runtime.
    pub fn runtime(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Runtime {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether the error was caused by the caller rather than the runtime.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::InvalidCursor(_) | Self::InvalidQuery(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DigiCredError>;
