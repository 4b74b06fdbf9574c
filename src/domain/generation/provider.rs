//! Text generation provider trait

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Trait for text generation backends used to narrate grounded answers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String, DomainError>;
}
