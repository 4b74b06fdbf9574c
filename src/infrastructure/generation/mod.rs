//! Narration backends

mod openai;

pub use openai::OpenAiGenerationProvider;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::GenerationConfig;
use crate::domain::{DomainError, GenerationProvider};
use crate::infrastructure::http_client::HttpClient;

/// Build the narration backend, or `None` when narration is disabled
pub fn create_generation_provider(
    config: &GenerationConfig,
) -> Result<Option<Arc<dyn GenerationProvider>>, DomainError> {
    if !config.enabled {
        return Ok(None);
    }

    let api_key = std::env::var(&config.api_key_env).map_err(|_| {
        DomainError::configuration(format!(
            "Narration requires the {} environment variable",
            config.api_key_env
        ))
    })?;
    let client = HttpClient::with_timeout(Duration::from_millis(config.request_timeout_ms))?;

    let provider =
        OpenAiGenerationProvider::with_base_url(client, api_key, &config.model, &config.base_url)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);

    info!(model = %config.model, "Narration provider created");

    Ok(Some(Arc::new(provider)))
}
