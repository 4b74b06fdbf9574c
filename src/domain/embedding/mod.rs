//! Embedding provider domain models and traits

mod hashing;
mod provider;
mod request;
mod response;

pub use hashing::hashed_ngram_vector;
pub use provider::EmbeddingProvider;
pub use request::EmbeddingRequest;
pub use response::{cosine_similarity, mean_vector, normalize, Embedding, EmbeddingResponse};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
