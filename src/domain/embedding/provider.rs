//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding providers (local hashing, OpenAI-compatible APIs)
///
/// Implementations must be safe for concurrent use; the pipeline bounds
/// the number of in-flight calls itself.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for every input of the request
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Model used for requests built by this provider
    fn model(&self) -> &str;

    /// Size of the vectors this provider returns
    fn dimensions(&self) -> usize;

    /// Embed a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let response = self
            .embed(EmbeddingRequest::single(self.model(), text))
            .await?;

        response
            .into_vectors()
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(self.provider_name(), "Empty embedding response"))
    }

    /// Embed many texts, one vector per input in input order
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        let vectors = self
            .embed(EmbeddingRequest::new(self.model(), texts))
            .await?
            .into_vectors();

        if vectors.len() != expected {
            return Err(DomainError::provider(
                self.provider_name(),
                format!("Expected {} embeddings, got {}", expected, vectors.len()),
            ));
        }

        Ok(vectors)
    }
}
