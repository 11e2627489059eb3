//! API error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
}

/// Errors surfaced by API handlers
#[derive(Debug)]
pub enum ApiError {
    /// Request body could not be decoded
    MalformedRequest(String),
    /// Session could not be created or written to
    Session(ravensh_core::Error),
    /// One-shot execution could not be set up
    Execution(ravensh_exec::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) | Self::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "MALFORMED_REQUEST",
            Self::Session(ravensh_core::Error::SessionCreate { .. }) => "SESSION_CREATE_FAILED",
            Self::Session(_) => "SESSION_IO_FAILED",
            Self::Execution(_) => "EXECUTION_FAILED",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRequest(msg) => write!(f, "malformed request: {}", msg),
            Self::Session(e) => write!(f, "{}", e),
            Self::Execution(e) => write!(f, "{}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Rejected request");
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedRequest(rejection.body_text())
    }
}

impl From<ravensh_core::Error> for ApiError {
    fn from(err: ravensh_core::Error) -> Self {
        Self::Session(err)
    }
}

impl From<ravensh_exec::Error> for ApiError {
    fn from(err: ravensh_exec::Error) -> Self {
        Self::Execution(err)
    }
}
