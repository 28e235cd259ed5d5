//! Error types for the ragctx domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// Shown to end users when context assembly fails. Internal error text is
/// never surfaced in its place.
pub const FAILED_MESSAGE_CONTENT: &str =
    "Failed to generate message from the model, please try again.";

/// The top-level error type for all ragctx operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Prompt rendering errors ---
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// The message an end user should see for this failure.
    pub fn user_message(&self) -> &'static str {
        FAILED_MESSAGE_CONTENT
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by retrieval backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Retrieval backend not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Invalid template: {0}")]
    Template(String),

    #[error("Invalid template variables: {0}")]
    InvalidVariables(String),
}
