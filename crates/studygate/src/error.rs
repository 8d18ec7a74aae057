//! Error types for Studygate

use thiserror::Error;

/// Main error type for Studygate operations
///
/// Only `InvalidInput` ever surfaces to HTTP callers; every other category
/// is absorbed into a successful-shaped result carrying a source/method
/// discriminator (fallback output, unstructured payloads, failed WebContent).
#[derive(Error, Debug)]
pub enum StudygateError {
    /// Caller-supplied input violates a documented constraint
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream provider errors (unconfigured, network, auth, rate limit)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Web content acquisition errors
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Studygate operations
pub type Result<T> = std::result::Result<T, StudygateError>;
