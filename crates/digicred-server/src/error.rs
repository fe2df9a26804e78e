//! Mapping of gateway errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use digicred_core::DigiCredError;
use digicred_query::QueryError;
use tracing::{error, warn};

/// A [`DigiCredError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub DigiCredError);

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DigiCredError::NotFound { .. } | DigiCredError::AgentNotInitialized(_) => {
                StatusCode::NOT_FOUND
            }
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DigiCredError> for ApiError {
    fn from(err: DigiCredError) -> Self {
        Self(err)
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(status = %status.as_u16(), error = %self.0, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
