use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use versecraft_pipeline::{BatchError, UploadError};

use crate::chat::ChatError;

/// Application-level error type for HTTP handlers.
///
/// Wraps the pipeline and chat error types and implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A whole-batch failure from the orchestrator.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// An inbound image payload could not be decoded or saved.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A chat relay failure.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Batch(err @ BatchError::InputMismatch { .. }) => {
                (StatusCode::BAD_REQUEST, "INPUT_MISMATCH", err.to_string())
            }

            AppError::Upload(err) => (StatusCode::BAD_REQUEST, "INVALID_UPLOAD", err.to_string()),

            AppError::Chat(chat) => match chat {
                ChatError::Configuration => (
                    StatusCode::BAD_REQUEST,
                    "CHAT_NOT_CONFIGURED",
                    "AI_API_URL/AI_API_KEY not configured. Set them in the environment.".to_string(),
                ),
                ChatError::Upstream { status, .. } => (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    format!("Chat upstream returned status {status}"),
                ),
                ChatError::Request(err) => {
                    tracing::error!(error = %err, "Chat upstream request failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_ERROR",
                        "Chat upstream request failed".to_string(),
                    )
                }
            },

            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
