//! Validate command - checks a knowledge base and reports its contents

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::domain::script::match_key;
use crate::domain::{GlutenStatus, KnowledgeBaseFile, KnowledgeIndex, KnowledgeSnapshot, RecordId};
use crate::infrastructure::embedding::LocalEmbeddingProvider;
use crate::infrastructure::knowledge_base::load_or_seed;

/// Arguments for the validate command
#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Knowledge base file; the built-in seed when omitted
    #[arg(long)]
    pub kb: Option<PathBuf>,
}

/// Summary of a valid knowledge base
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub ingredients: usize,
    pub recipes: usize,
    pub contains: usize,
    pub free: usize,
    pub unknown: usize,
    pub names: usize,
    /// Recipe mentions that match no known name exactly; they are still
    /// resolved fuzzily at query time
    pub unmatched_mentions: Vec<(RecordId, String)>,
}

impl ValidationReport {
    pub fn new(file: &KnowledgeBaseFile, snapshot: &KnowledgeSnapshot) -> Self {
        let count = |status: GlutenStatus| {
            file.ingredients
                .iter()
                .filter(|r| r.gluten_status == status)
                .count()
        };

        let unmatched_mentions = file
            .recipes
            .iter()
            .flat_map(|recipe| {
                recipe
                    .ingredients
                    .iter()
                    .filter(|m| !snapshot.lexicon().contains(&match_key(m)))
                    .map(|m| (recipe.id.clone(), m.clone()))
            })
            .collect();

        Self {
            ingredients: file.ingredients.len(),
            recipes: file.recipes.len(),
            contains: count(GlutenStatus::Contains),
            free: count(GlutenStatus::Free),
            unknown: count(GlutenStatus::Unknown),
            names: snapshot.names().len(),
            unmatched_mentions,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "OK: {} ingredients ({} contain gluten, {} gluten-free, {} unknown), {} recipes, {} names",
            self.ingredients, self.contains, self.free, self.unknown, self.recipes, self.names
        )?;

        for (recipe, mention) in &self.unmatched_mentions {
            writeln!(f, "  note: recipe '{}' mention '{}' has no exact match", recipe, mention)?;
        }

        Ok(())
    }
}

/// Run the validate command
pub async fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let path = args.kb.or(config.knowledge_base.path);

    let file = load_or_seed(path.as_deref()).await?;

    // Exact-name coverage needs only the lexicon, so the offline backend is enough
    let index = KnowledgeIndex::new(Arc::new(LocalEmbeddingProvider::new(
        config.embedding.dimensions,
    )));
    let snapshot = index.load(file.clone()).await?;

    print!("{}", ValidationReport::new(&file, &snapshot));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IngredientRecord, Language, RecipeRecord};
    use crate::infrastructure::knowledge_base::seed_knowledge_base;

    async fn report(file: KnowledgeBaseFile) -> ValidationReport {
        let index = KnowledgeIndex::new(Arc::new(LocalEmbeddingProvider::new(64)));
        let snapshot = index.load(file.clone()).await.unwrap();
        ValidationReport::new(&file, &snapshot)
    }

    #[tokio::test]
    async fn test_seed_recipes_fully_matched() {
        let report = report(seed_knowledge_base().unwrap()).await;

        assert_eq!(report.recipes, 8);
        assert_eq!(report.ingredients, report.contains + report.free + report.unknown);
        assert!(report.unmatched_mentions.is_empty(), "{:?}", report.unmatched_mentions);
    }

    #[tokio::test]
    async fn test_unmatched_mention_is_reported() {
        let id = |v: &str| RecordId::new(v).unwrap();
        let file = KnowledgeBaseFile::new(
            vec![IngredientRecord::new(id("wheat"), GlutenStatus::Contains)
                .with_name(Language::English, "wheat")],
            vec![RecipeRecord::new(id("porridge"))
                .with_name(Language::English, "porridge")
                .with_ingredient("wheat")
                .with_ingredient("whaet")],
        );

        let report = report(file).await;

        assert_eq!(report.unmatched_mentions, vec![(id("porridge"), "whaet".to_string())]);
        assert!(report.to_string().contains("'whaet'"));
    }
}
