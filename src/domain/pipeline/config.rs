//! Pipeline configuration

use serde::{Deserialize, Serialize};

use crate::domain::resolver::ResolverConfig;
use crate::domain::suggester::SuggesterConfig;

/// Tunables of the query pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub suggester: SuggesterConfig,
    /// Deadline of each embedding/generation call in milliseconds
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    /// Concurrent embedding/generation calls allowed across sessions
    #[serde(default = "default_max_concurrent_upstream")]
    pub max_concurrent_upstream: usize,
    /// Region used for substitute ranking when the query gives none
    #[serde(default = "default_region")]
    pub default_region: Option<String>,
}

fn default_upstream_timeout_ms() -> u64 {
    1500
}

fn default_max_concurrent_upstream() -> usize {
    4
}

fn default_region() -> Option<String> {
    Some("MA".to_string())
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            suggester: SuggesterConfig::default(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            max_concurrent_upstream: default_max_concurrent_upstream(),
            default_region: default_region(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_suggester(mut self, suggester: SuggesterConfig) -> Self {
        self.suggester = suggester;
        self
    }

    /// Set the upstream deadline (minimum 1ms)
    pub fn with_upstream_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.upstream_timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn with_max_concurrent_upstream(mut self, max: usize) -> Self {
        self.max_concurrent_upstream = max.max(1);
        self
    }

    pub fn with_default_region(mut self, region: Option<String>) -> Self {
        self.default_region = region.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.resolver.validate().map_err(|e| format!("resolver: {}", e))?;
        self.suggester.validate().map_err(|e| format!("suggester: {}", e))?;

        if self.upstream_timeout_ms == 0 {
            return Err("upstream_timeout_ms must be positive".to_string());
        }
        if self.max_concurrent_upstream == 0 {
            return Err("max_concurrent_upstream must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();

        assert_eq!(config.upstream_timeout_ms, 1500);
        assert_eq!(config.max_concurrent_upstream, 4);
        assert_eq!(config.default_region.as_deref(), Some("MA"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_nested_partial() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"resolver": {"min_confidence": 0.6}, "upstream_timeout_ms": 300}"#,
        )
        .unwrap();

        assert_eq!(config.resolver.min_confidence, 0.6);
        assert_eq!(config.resolver.neighbor_k, 5);
        assert_eq!(config.upstream_timeout_ms, 300);
        assert_eq!(config.suggester.top_n, 3);
    }

    #[test]
    fn test_validate_reports_section() {
        let mut config = PipelineConfig::default();
        config.resolver.min_confidence = 2.0;

        assert!(config.validate().unwrap_err().starts_with("resolver:"));
    }

    #[test]
    fn test_builders_clamp() {
        let config = PipelineConfig::new()
            .with_upstream_timeout_ms(0)
            .with_max_concurrent_upstream(0)
            .with_default_region(Some("  ".to_string()));

        assert_eq!(config.upstream_timeout_ms, 1);
        assert_eq!(config.max_concurrent_upstream, 1);
        assert!(config.default_region.is_none());
    }
}
