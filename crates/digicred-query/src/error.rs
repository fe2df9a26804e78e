use digicred_core::DigiCredError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    /// The cursor does not decode, or names a record that no longer exists.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("invalid page limit {0}: must be at least 1")]
    InvalidLimit(usize),

    #[error("record has no usable `{field}` attribute to anchor a cursor on")]
    MissingId { field: String },

    #[error("cursor encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<QueryError> for DigiCredError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidCursor(reason) => DigiCredError::InvalidCursor(reason),
            QueryError::InvalidLimit(_) | QueryError::MissingId { .. } => {
                DigiCredError::InvalidQuery(err.to_string())
            }
            QueryError::Encoding(e) => DigiCredError::Serialization(e),
        }
    }
}
