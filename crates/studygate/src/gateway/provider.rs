//! Generator trait for text completion backends
//!
//! Abstracts the upstream provider so the gateway's strategy chain can
//! treat primary and test doubles uniformly.

use async_trait::async_trait;

/// Generator-specific errors
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Provider not configured: {0}")]
    Unconfigured(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A text completion backend
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt into free-form text
    async fn complete(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Whether the backend can currently serve requests
    async fn is_available(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
