//! Model invocation gateway.
//!
//! Trait-based abstraction over the external generation endpoint so the
//! orchestrator and tests can swap the real Gemini backend for a mock.

pub mod gemini;
pub mod mock;

use crate::models::{Part, Role};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations. Every failure surfaces to the caller
/// as a single generic generation failure; there is no retry and no partial
/// result.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Model returned no text candidate")]
    EmptyResponse,
}

impl From<ProviderError> for service_core::error::AppError {
    fn from(err: ProviderError) -> Self {
        service_core::error::AppError::GenerationError(err.to_string())
    }
}

/// One ordered history entry passed to the model.
#[derive(Debug, Clone)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// Trait for text generation providers.
///
/// Calls are stateless from the provider's point of view: all conversational
/// memory is re-supplied on every call via the full ordered history.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate the next assistant turn from the system instructions and the
    /// full ordered message history.
    async fn generate(
        &self,
        system_instructions: &str,
        contents: &[Content],
    ) -> Result<String, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
