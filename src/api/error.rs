//! HTTP error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{Error, StorageError};

const INTERNAL_MESSAGE: &str = "internal server error";
const UNAVAILABLE_MESSAGE: &str = "storage backend unavailable, retry later";

/// Any service error, rendered as the uniform error body.
#[derive(Debug)]
pub struct ApiError(pub Error);

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            kind: "error".to_string(),
            status: status.as_u16().to_string(),
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found() -> Response {
        let status = StatusCode::NOT_FOUND;
        (status, Json(Self::new(status, "NotFoundError", "not found"))).into_response()
    }
}

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Storage(StorageError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            e if e.is_caller_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();

        let message = match status {
            StatusCode::SERVICE_UNAVAILABLE => {
                warn!(error = %self.0, "store unavailable");
                UNAVAILABLE_MESSAGE.to_string()
            }
            s if s.is_server_error() => {
                error!(error = %self.0, "request failed");
                INTERNAL_MESSAGE.to_string()
            }
            _ => self.0.to_string(),
        };

        (status, Json(ErrorResponse::new(status, code, message))).into_response()
    }
}
