//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod generation;
pub mod http_client;
pub mod knowledge_base;
pub mod logging;
