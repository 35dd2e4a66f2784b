//! Error types for the SoulTurn domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error variant.
//!
//! Note that skipping or abandoning a turn is never an error: those are
//! ordinary turn outcomes. Errors only come from the collaborators.

use thiserror::Error;

/// The top-level error type for all SoulTurn operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Step computation errors ---
    #[error("Cognition error: {0}")]
    Cognition(#[from] CognitionError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory slot errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum CognitionError {
    #[error("Step computation failed: {0}")]
    ComputationFailed(String),

    #[error("Answer {answer:?} is not one of the offered choices {choices:?}")]
    InvalidChoice { answer: String, choices: Vec<String> },

    #[error("Dialog stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Script has no answer for {kind} directive: {instruction}")]
    ScriptExhausted { kind: String, instruction: String },

    #[error("Provider failed: {0}")]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Slot {key} holds an unexpected value: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Knowledge source unavailable: {0}")]
    Unavailable(String),

    #[error("Knowledge query failed: {0}")]
    QueryFailed(String),
}
