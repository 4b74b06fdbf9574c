//! Gluten RAG
//!
//! Answers "does this contain gluten?" for free-form questions written in
//! Arabic, Moroccan Darija (Arabic script or Arabizi), French or English:
//! - Script normalization for mixed Arabic/Latin input
//! - Ingredient resolution against a multilingual knowledge base
//! - Gluten classification with evidence and caveats
//! - Region-aware gluten-free substitutes
//! - Answers composed in the language of the question

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::{GlutenPipeline, KnowledgeIndex};
use infrastructure::{
    embedding::create_embedding_provider, generation::create_generation_provider,
    knowledge_base::load_or_seed,
};

/// Wire the pipeline from configuration: embedding backend, knowledge base
/// (file or seed), index and optional narrator
pub async fn build_pipeline(config: &AppConfig) -> anyhow::Result<GlutenPipeline> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let embedder = create_embedding_provider(&config.embedding)?;
    let index = Arc::new(KnowledgeIndex::new(embedder));

    let file = load_or_seed(config.knowledge_base.path.as_deref()).await?;
    let snapshot = index.load(file).await?;
    info!(
        version = snapshot.version(),
        ingredients = snapshot.len(),
        recipes = snapshot.recipe_count(),
        "Knowledge index ready"
    );

    let mut pipeline = GlutenPipeline::new(index, config.pipeline.clone());
    if let Some(generator) = create_generation_provider(&config.generation)? {
        pipeline = pipeline.with_generator(generator);
    }

    Ok(pipeline)
}
