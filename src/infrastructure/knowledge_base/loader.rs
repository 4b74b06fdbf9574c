//! JSON knowledge base files

use std::path::Path;

use tracing::{debug, info, instrument};

use super::seed::seed_knowledge_base;
use crate::domain::{validate_knowledge_base, DomainError, KnowledgeBaseFile};

/// Parse and validate a knowledge base document
pub fn parse_knowledge_base(json: &str) -> Result<KnowledgeBaseFile, DomainError> {
    let file: KnowledgeBaseFile = serde_json::from_str(json)
        .map_err(|e| DomainError::validation(format!("Invalid knowledge base JSON: {}", e)))?;

    validate_knowledge_base(&file.ingredients, &file.recipes)?;

    Ok(file)
}

/// Serialize a knowledge base in the same layout `parse_knowledge_base` reads
pub fn knowledge_base_to_json(file: &KnowledgeBaseFile) -> Result<String, DomainError> {
    serde_json::to_string_pretty(file)
        .map_err(|e| DomainError::internal(format!("Failed to serialize knowledge base: {}", e)))
}

/// Read a knowledge base file from disk
#[instrument(skip(path), fields(path = %path.display()))]
pub async fn load_knowledge_base(path: &Path) -> Result<KnowledgeBaseFile, DomainError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        DomainError::configuration(format!(
            "Failed to read knowledge base {}: {}",
            path.display(),
            e
        ))
    })?;

    let file = parse_knowledge_base(&content)?;
    info!(
        ingredients = file.ingredients.len(),
        recipes = file.recipes.len(),
        "Knowledge base loaded"
    );

    Ok(file)
}

/// Load the given file, or the embedded seed when no path is configured
pub async fn load_or_seed(path: Option<&Path>) -> Result<KnowledgeBaseFile, DomainError> {
    match path {
        Some(path) => load_knowledge_base(path).await,
        None => {
            debug!("No knowledge base path configured, using seed");
            seed_knowledge_base()
        }
    }
}
