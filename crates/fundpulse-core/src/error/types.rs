//! Core error types for Fundpulse

use thiserror::Error;

/// Result type alias for Fundpulse operations
pub type PulseResult<T> = Result<T, PulseError>;

/// Main error type for Fundpulse
#[derive(Error, Debug, Clone)]
pub enum PulseError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// LLM provider errors (unreachable, non-2xx, malformed response)
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        provider: Option<String>,
    },

    /// Outbound HTTP errors against a crawled source
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        url: Option<String>,
        status_code: Option<u16>,
    },

    /// A circuit breaker rejected the call without invoking it
    #[error("Circuit open for source '{source_name}'")]
    CircuitOpen { source_name: String },

    /// Cache backend errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
    },

    /// Operation exceeded its deadline
    #[error("Operation timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The caller canceled the operation
    #[error("Operation was cancelled")]
    Cancelled,

    /// The research loop hit its round cap while the model still wanted tools
    #[error("Research truncated after {rounds} tool rounds")]
    ResearchTruncated { rounds: u32 },

    /// Generic error
    #[error("Error: {message}")]
    Other { message: String },
}
