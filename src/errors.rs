use serde_json::json;
use thiserror::Error;

use crate::models::{AggregateResult, ChatResponse};

/// Maximum number of characters of an upstream error body echoed back to the caller.
pub const ERROR_EXCERPT_CHARS: usize = 200;

/// Top-level application error.
/// Every variant renders into the `{success: false, ...}` envelope; none of them
/// is surfaced as a transport-level failure.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("{field_name} is required")]
    MissingField { field_name: &'static str },

    // ── Upstream errors ──────────────────────────────────────────────────────
    #[error("Request timeout")]
    UpstreamTimeout,

    #[error("Request failed with status {status}")]
    UpstreamStatus { status: u16, excerpt: String },

    #[error("Error: {0}")]
    UpstreamTransport(#[source] reqwest::Error),

    // ── Stream errors ────────────────────────────────────────────────────────
    #[error("Stream decoding failed: {message}")]
    StreamDecode {
        message: String,
        partial: AggregateResult,
    },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Classifies a `reqwest` failure raised before the body is streamed.
    pub fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout
        } else {
            AppError::UpstreamTransport(err)
        }
    }

    pub fn upstream_status(status: u16, body: &str) -> Self {
        AppError::UpstreamStatus {
            status,
            excerpt: body.chars().take(ERROR_EXCERPT_CHARS).collect(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::MissingField { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::UpstreamTimeout)
    }

    /// Renders the error into the caller-facing envelope, attaching whatever
    /// diagnostic payload the variant carries.
    pub fn into_envelope(self) -> ChatResponse {
        let message = self.to_string();
        match self {
            AppError::UpstreamStatus { excerpt, .. } => {
                ChatResponse::failure_with_data(message, json!({ "details": excerpt }))
            }
            AppError::StreamDecode { partial, .. } => ChatResponse::failure_with_data(
                message,
                json!({
                    "partial": {
                        "response": partial.text,
                        "conversation_id": partial.conversation_id,
                        "response_id": partial.response_id,
                        "lines_processed": partial.lines_processed,
                    }
                }),
            ),
            _ => ChatResponse::failure(message),
        }
    }
}
