//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

/// Error returned by every handler. Renders as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// Unexpected store or internal failure
    Internal(notekeep_core::Error),
    /// The store could not be reached
    Unavailable(String),
    NotFound(String),
    BadRequest(String),
}

impl From<notekeep_core::Error> for ApiError {
    fn from(err: notekeep_core::Error) -> Self {
        use notekeep_core::Error;
        match err {
            Error::NotFound(_) | Error::NoteNotFound(_) | Error::TagNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::StoreUnavailable(msg) => ApiError::Unavailable(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                error!(error = %err, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::Unavailable(msg) => {
                warn!(error = %msg, "Store unavailable");
                "Service temporarily unavailable".to_string()
            }
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg,
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
