//! Builds knowledge snapshots from validated records

use std::collections::HashSet;

use tracing::{debug, info};

use super::snapshot::{KnowledgeSnapshot, NameEntry, NameOwner};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::ingredient::{validate_knowledge_base, KnowledgeBaseFile};
use crate::domain::script::{match_key, Language};
use crate::domain::DomainError;

/// Texts embedded per provider call while building
const EMBED_BATCH_SIZE: usize = 64;

/// Validate the records, embed every display name and alias, and assemble
/// an immutable snapshot.
pub async fn build_snapshot(
    file: KnowledgeBaseFile,
    embedder: &dyn EmbeddingProvider,
    version: u64,
) -> Result<KnowledgeSnapshot, DomainError> {
    validate_knowledge_base(&file.ingredients, &file.recipes)?;

    let mut pending: Vec<(NameOwner, String, Option<Language>)> = Vec::new();
    for (i, record) in file.ingredients.iter().enumerate() {
        collect_names(&mut pending, NameOwner::Ingredient(i), record.surface_forms());
    }
    for (i, recipe) in file.recipes.iter().enumerate() {
        collect_names(&mut pending, NameOwner::Recipe(i), recipe.surface_forms());
    }

    debug!(
        names = pending.len(),
        provider = embedder.provider_name(),
        "Embedding knowledge base names"
    );

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(pending.len());
    for chunk in pending.chunks(EMBED_BATCH_SIZE) {
        let texts = chunk.iter().map(|(_, surface, _)| surface.clone()).collect();
        vectors.extend(embedder.embed_batch(texts).await?);
    }

    let names = pending
        .into_iter()
        .zip(vectors)
        .map(|((owner, surface, language), vector)| NameEntry::new(owner, surface, language, vector))
        .collect::<Vec<_>>();

    let snapshot = KnowledgeSnapshot::new(version, file.ingredients, file.recipes, names);

    info!(
        version,
        ingredients = snapshot.len(),
        recipes = snapshot.recipe_count(),
        names = snapshot.names().len(),
        "Knowledge snapshot built"
    );

    Ok(snapshot)
}

/// Push each non-empty surface form once per owner (by folded key)
fn collect_names<'a>(
    pending: &mut Vec<(NameOwner, String, Option<Language>)>,
    owner: NameOwner,
    forms: impl Iterator<Item = (&'a str, Option<Language>)>,
) {
    let mut seen: HashSet<String> = HashSet::new();
    for (surface, language) in forms {
        let surface = surface.trim();
        let key = match_key(surface);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        pending.push((owner, surface.to_string(), language));
    }
}
