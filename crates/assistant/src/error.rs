//! Assistant error handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors from tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with the requested name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The input object is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A uniqueness rule was violated (duplicate project name).
    #[error("{0}")]
    Conflict(String),

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ToolError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::UnknownTool(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "tool execution error");
        }

        let message = if matches!(self, Self::Database(_)) {
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
