//! Error types for the SmartFlow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all SmartFlow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Structured output ---
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure of a structured-output request.
///
/// Callers that can degrade (the planner) match on this and fall back to a
/// free-text call instead of aborting the turn.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("structured output not supported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("malformed structured output: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedDocument(String),

    #[error("Failed to parse {filename}: {reason}")]
    DocumentParse { filename: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// The model asked for a tool that is not registered.
    #[error("{name} is not a valid tool, try one of [{}].", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
