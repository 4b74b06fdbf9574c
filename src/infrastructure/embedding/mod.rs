//! Embedding backends

mod cached;
mod local;
mod openai;

pub use cached::CachedEmbeddingProvider;
pub use local::{LocalEmbeddingProvider, LOCAL_MODEL};
pub use openai::{OpenAiEmbeddingProvider, DEFAULT_OPENAI_BASE_URL};

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::domain::{DomainError, EmbeddingProvider};
use crate::infrastructure::http_client::HttpClient;

/// Build the configured embedding backend, wrapped in a vector cache when
/// `cache_capacity` is non-zero
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, DomainError> {
    let provider: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Local => Arc::new(LocalEmbeddingProvider::new(config.dimensions)),
        EmbeddingBackend::Openai => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                DomainError::configuration(format!(
                    "Embedding backend 'openai' requires the {} environment variable",
                    config.api_key_env
                ))
            })?;
            let client =
                HttpClient::with_timeout(Duration::from_millis(config.request_timeout_ms))?;

            Arc::new(OpenAiEmbeddingProvider::with_base_url(
                client,
                api_key,
                &config.model,
                config.dimensions,
                &config.base_url,
            ))
        }
    };

    info!(
        provider = provider.provider_name(),
        model = provider.model(),
        dimensions = provider.dimensions(),
        "Embedding provider created"
    );

    if config.cache_capacity == 0 {
        return Ok(provider);
    }

    Ok(Arc::new(CachedEmbeddingProvider::new(
        provider,
        Duration::from_secs(config.cache_ttl_secs),
        config.cache_capacity,
    )))
}
