//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingBackend, EmbeddingConfig, GenerationConfig, KnowledgeBaseConfig,
    LogFormat, LoggingConfig,
};
