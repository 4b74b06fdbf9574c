use thiserror::Error;

use super::pipeline::PipelineStage;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Knowledge index unavailable: no knowledge base has been loaded")]
    IndexUnavailable,

    #[error("Upstream timeout in {stage}: {operation} exceeded {timeout_ms}ms")]
    UpstreamTimeout {
        stage: PipelineStage,
        operation: String,
        timeout_ms: u64,
    },

    #[error("Malformed input in {stage}: {message}")]
    MalformedInput {
        stage: PipelineStage,
        message: String,
    },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn upstream_timeout(
        stage: PipelineStage,
        operation: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self::UpstreamTimeout {
            stage,
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn malformed_input(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            stage,
            message: message.into(),
        }
    }

    /// Whether the error comes from a slow or failing external model call
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::UpstreamTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Ingredient 'wheat' not found");
        assert_eq!(error.to_string(), "Not found: Ingredient 'wheat' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Duplicate identifier");
        assert_eq!(error.to_string(), "Validation error: Duplicate identifier");
    }

    #[test]
    fn test_upstream_timeout_carries_stage() {
        let error = DomainError::upstream_timeout(PipelineStage::Resolution, "embed 'قمح'", 1500);

        assert_eq!(
            error.to_string(),
            "Upstream timeout in resolution: embed 'قمح' exceeded 1500ms"
        );
        assert!(error.is_upstream());
    }

    #[test]
    fn test_index_unavailable_is_not_upstream() {
        assert!(!DomainError::IndexUnavailable.is_upstream());
    }
}
