use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::embedding::{Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Cache key: text plus requested vector size
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    dimensions: Option<usize>,
}

/// Embedding provider wrapper that memoizes vectors per text with a TTL.
///
/// Only texts missing from the cache are forwarded, in one batch.
#[derive(Debug)]
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: Cache<CacheKey, Arc<Vec<f32>>>,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { inner, cache }
    }

    /// Invalidate all cached vectors
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Get cache statistics
    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let keys: Vec<CacheKey> = request
            .inputs()
            .iter()
            .map(|text| CacheKey {
                text: text.clone(),
                dimensions: request.dimensions(),
            })
            .collect();

        let mut vectors: Vec<Option<Arc<Vec<f32>>>> = Vec::with_capacity(keys.len());
        let mut misses = Vec::new();
        for (idx, key) in keys.iter().enumerate() {
            let cached = self.cache.get(key).await;
            if cached.is_none() {
                misses.push(idx);
            }
            vectors.push(cached);
        }

        tracing::debug!(
            provider = self.inner.provider_name(),
            hits = keys.len() - misses.len(),
            misses = misses.len(),
            "Embedding cache lookup"
        );

        if !misses.is_empty() {
            let texts: Vec<String> = misses.iter().map(|idx| keys[*idx].text.clone()).collect();
            let mut forwarded = EmbeddingRequest::new(request.model(), texts);
            if let Some(dimensions) = request.dimensions() {
                forwarded = forwarded.with_dimensions(dimensions);
            }

            let fetched = self.inner.embed(forwarded).await?.into_vectors();
            if fetched.len() != misses.len() {
                return Err(DomainError::provider(
                    self.inner.provider_name(),
                    format!("Expected {} embeddings, got {}", misses.len(), fetched.len()),
                ));
            }

            for (idx, vector) in misses.into_iter().zip(fetched) {
                let vector = Arc::new(vector);
                self.cache.insert(keys[idx].clone(), Arc::clone(&vector)).await;
                vectors[idx] = Some(vector);
            }
        }

        let embeddings = vectors
            .into_iter()
            .enumerate()
            .map(|(idx, vector)| {
                vector
                    .map(|v| Embedding::new(idx, v.as_ref().clone()))
                    .ok_or_else(|| DomainError::internal("Embedding missing after cache fill"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmbeddingResponse::new(request.model(), embeddings))
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
