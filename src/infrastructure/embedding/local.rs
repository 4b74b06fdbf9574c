//! In-process embedding backend

use async_trait::async_trait;

use crate::domain::embedding::{
    hashed_ngram_vector, Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
};
use crate::domain::DomainError;

pub const LOCAL_MODEL: &str = "hashed-ngram";

/// Feature-hashed n-gram embeddings computed locally; needs no network and
/// is fully deterministic
#[derive(Debug, Clone)]
pub struct LocalEmbeddingProvider {
    dimensions: usize,
}

impl LocalEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbeddingProvider {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let dimensions = request.dimensions().unwrap_or(self.dimensions);
        let embeddings = request
            .inputs()
            .iter()
            .enumerate()
            .map(|(idx, text)| Embedding::new(idx, hashed_ngram_vector(text, dimensions)))
            .collect();

        Ok(EmbeddingResponse::new(LOCAL_MODEL, embeddings))
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }

    fn model(&self) -> &str {
        LOCAL_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::cosine_similarity;

    #[tokio::test]
    async fn test_vectors_have_configured_size() {
        let provider = LocalEmbeddingProvider::new(64);
        let vectors = provider
            .embed_batch(vec!["wheat".into(), "قمح".into()])
            .await
            .unwrap();

        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 64));
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = LocalEmbeddingProvider::new(64);
        let a = provider.embed_text("farine de riz").await.unwrap();
        let b = provider.embed_text("farine de riz").await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_spelling_variants_are_close() {
        let provider = LocalEmbeddingProvider::new(256);
        let a = provider.embed_text("kesksou").await.unwrap();
        let b = provider.embed_text("keskssou").await.unwrap();
        let c = provider.embed_text("sardines").await.unwrap();

        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[test]
    fn test_zero_dimensions_clamped() {
        assert_eq!(LocalEmbeddingProvider::new(0).dimensions(), 1);
    }
}
