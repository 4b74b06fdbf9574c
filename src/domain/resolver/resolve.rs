//! Ingredient resolver: spans to canonical ingredient records

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use super::config::ResolverConfig;
use super::embedding_scorer::{EmbeddingScorer, EmbeddingScores};
use super::merge::{merge_signals, MergeOutcome, SignalScores};
use super::segment::MentionSpan;
use super::string_scorer::StringMatchScorer;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::index::{KnowledgeSnapshot, NameOwner};
use crate::domain::ingredient::{IngredientRecord, RecipeRecord};
use crate::domain::pipeline::PipelineStage;
use crate::domain::upstream::UpstreamLimiter;
use crate::domain::DomainError;

/// A mention mapped (or not) to a canonical ingredient
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMention {
    pub span: MentionSpan,
    /// `None` when resolution failed; the mention is then UNKNOWN
    pub record: Option<Arc<IngredientRecord>>,
    /// Display name or alias that matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
    /// Resolution confidence in [0, 1]
    pub confidence: f32,
    pub signals: SignalScores,
}

impl ResolvedMention {
    fn unresolved(span: MentionSpan, degraded: bool) -> Self {
        Self {
            span,
            record: None,
            matched_name: None,
            confidence: 0.0,
            signals: SignalScores {
                degraded,
                ..Default::default()
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.record.is_some()
    }

    pub fn is_degraded(&self) -> bool {
        self.signals.degraded
    }
}

/// Embedding failure for one span, recovered by the string-only path
#[derive(Debug)]
pub struct SpanFailure {
    pub span: String,
    pub error: DomainError,
}

/// Output of resolving all spans of a query
#[derive(Debug, Default)]
pub struct Resolution {
    /// One mention per span (recipes expanded in place), in span order
    pub mentions: Vec<ResolvedMention>,
    pub failures: Vec<SpanFailure>,
}

impl Resolution {
    pub fn degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum Step {
    Mention(ResolvedMention, Option<SpanFailure>),
    Recipe(Arc<RecipeRecord>, MentionSpan, Option<SpanFailure>),
}

/// Resolves mention spans with two independent signals merged by
/// [`merge_signals`]. Spans are resolved concurrently; each embedding call
/// runs under the upstream limiter and falls back to string matching alone
/// when it fails or exceeds its deadline.
#[derive(Debug, Clone)]
pub struct IngredientResolver {
    embedder: Arc<dyn EmbeddingProvider>,
    limiter: UpstreamLimiter,
    config: ResolverConfig,
    string_scorer: StringMatchScorer,
    embedding_scorer: EmbeddingScorer,
}

impl IngredientResolver {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        limiter: UpstreamLimiter,
        config: ResolverConfig,
    ) -> Self {
        let string_scorer = StringMatchScorer::new(config.max_edit_ratio);
        let embedding_scorer = EmbeddingScorer::new(config.neighbor_k);

        Self {
            embedder,
            limiter,
            config,
            string_scorer,
            embedding_scorer,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve every span against the snapshot, preserving order.
    ///
    /// A span naming a recipe is replaced by the recipe's ingredient
    /// mentions, each tagged with the recipe.
    pub async fn resolve(&self, spans: &[MentionSpan], snapshot: &KnowledgeSnapshot) -> Resolution {
        let steps = join_all(
            spans
                .iter()
                .map(|span| self.resolve_span(span.clone(), snapshot, true)),
        )
        .await;

        let mut resolution = Resolution::default();
        for step in steps {
            match step {
                Step::Mention(mention, failure) => {
                    resolution.mentions.push(mention);
                    resolution.failures.extend(failure);
                }
                Step::Recipe(recipe, span, failure) => {
                    resolution.failures.extend(failure);
                    debug!(recipe = %recipe.id, span = %span.text, "Expanding recipe mention");

                    let expanded = recipe.ingredients.iter().map(|mention| {
                        MentionSpan::from_text(mention.as_str())
                            .at(span.start, span.end)
                            .from_recipe(recipe.id.clone())
                    });
                    let steps = join_all(
                        expanded.map(|span| self.resolve_span(span, snapshot, false)),
                    )
                    .await;

                    for step in steps {
                        if let Step::Mention(mention, failure) = step {
                            resolution.mentions.push(mention);
                            resolution.failures.extend(failure);
                        }
                    }
                }
            }
        }

        resolution
    }

    /// Resolve a single span; string matching only, as used when no
    /// embedding is available
    pub fn resolve_without_embedding(
        &self,
        span: &MentionSpan,
        snapshot: &KnowledgeSnapshot,
    ) -> ResolvedMention {
        let outcome = self.merge(span, None, snapshot, false);
        self.to_mention(span.clone(), outcome, snapshot)
    }

    async fn resolve_span(
        &self,
        span: MentionSpan,
        snapshot: &KnowledgeSnapshot,
        allow_recipes: bool,
    ) -> Step {
        let operation = format!("embed '{}'", span.text);
        let embedded = self
            .limiter
            .call(
                PipelineStage::Resolution,
                &operation,
                self.embedder.embed_text(&span.text),
            )
            .await;

        let (scores, failure) = match embedded {
            Ok(vector) => (Some(self.embedding_scorer.score(&vector, snapshot)), None),
            Err(error) => {
                warn!(span = %span.text, error = %error, "Embedding unavailable, using string match only");
                (
                    None,
                    Some(SpanFailure {
                        span: span.text.clone(),
                        error,
                    }),
                )
            }
        };

        let outcome = self.merge(&span, scores.as_ref(), snapshot, allow_recipes);

        if let Some(NameOwner::Recipe(position)) = outcome.owner {
            if let Some(recipe) = snapshot.recipe_at(position) {
                return Step::Recipe(recipe, span, failure);
            }
        }

        let mention = self.to_mention(span, outcome, snapshot);
        debug!(
            span = %mention.span.text,
            record = mention.record.as_ref().map(|r| r.id.as_str()).unwrap_or("-"),
            confidence = mention.confidence,
            degraded = mention.signals.degraded,
            "Resolved mention"
        );
        Step::Mention(mention, failure)
    }

    fn merge(
        &self,
        span: &MentionSpan,
        scores: Option<&EmbeddingScores>,
        snapshot: &KnowledgeSnapshot,
        allow_recipes: bool,
    ) -> MergeOutcome {
        let mut string = self.string_scorer.score(span, snapshot);
        if !allow_recipes {
            string.retain(|c| matches!(c.owner, NameOwner::Ingredient(_)));
        }

        let outcome = merge_signals(span, &string, scores, snapshot, &self.config);

        // Recipes are expanded only on a genuine name match
        match outcome.owner {
            Some(NameOwner::Recipe(_)) if !allow_recipes || outcome.signals.string.is_none() => {
                let ingredients_only: Vec<_> = string
                    .into_iter()
                    .filter(|c| matches!(c.owner, NameOwner::Ingredient(_)))
                    .collect();
                let filtered = scores.map(|s| s.without_recipes());
                merge_signals(span, &ingredients_only, filtered.as_ref(), snapshot, &self.config)
            }
            _ => outcome,
        }
    }

    fn to_mention(
        &self,
        span: MentionSpan,
        outcome: MergeOutcome,
        snapshot: &KnowledgeSnapshot,
    ) -> ResolvedMention {
        match (outcome.owner, outcome.entry) {
            (Some(NameOwner::Ingredient(position)), Some(entry)) => {
                match snapshot.ingredient_at(position) {
                    Some(record) => ResolvedMention {
                        span,
                        record: Some(record),
                        matched_name: snapshot.name(entry).map(|n| n.surface.clone()),
                        confidence: outcome.confidence,
                        signals: outcome.signals,
                    },
                    None => ResolvedMention::unresolved(span, outcome.signals.degraded),
                }
            }
            _ => ResolvedMention::unresolved(span, outcome.signals.degraded),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::index::build_snapshot;
    use crate::domain::ingredient::{GlutenStatus, KnowledgeBaseFile, RecordId};
    use crate::domain::script::Language;

    fn id(value: &str) -> RecordId {
        RecordId::new(value).unwrap()
    }

    fn file() -> KnowledgeBaseFile {
        KnowledgeBaseFile::new(
            vec![
                IngredientRecord::new(id("wheat"), GlutenStatus::Contains)
                    .with_name(Language::English, "wheat")
                    .with_name(Language::Arabic, "قمح")
                    .with_alias("9am7"),
                IngredientRecord::new(id("semolina"), GlutenStatus::Contains)
                    .with_name(Language::English, "semolina")
                    .with_name(Language::French, "semoule"),
                IngredientRecord::new(id("lamb"), GlutenStatus::Free)
                    .with_name(Language::English, "lamb")
                    .with_name(Language::Arabic, "لحم الغنم"),
                IngredientRecord::new(id("rice"), GlutenStatus::Free)
                    .with_name(Language::English, "rice"),
            ],
            vec![RecipeRecord::new(id("tagine"))
                .with_name(Language::English, "tagine")
                .with_name(Language::Arabic, "طاجين")
                .with_ingredient("lamb")
                .with_ingredient("semolina")],
        )
    }

    async fn setup(provider: MockEmbeddingProvider, timeout_ms: u64) -> (IngredientResolver, KnowledgeSnapshot) {
        let snapshot = build_snapshot(file(), &MockEmbeddingProvider::new(128), 1)
            .await
            .unwrap();
        let resolver = IngredientResolver::new(
            Arc::new(provider),
            UpstreamLimiter::new(4, timeout_ms),
            ResolverConfig::default(),
        );
        (resolver, snapshot)
    }

    #[tokio::test]
    async fn test_known_names_resolve_with_high_confidence() {
        let (resolver, snapshot) = setup(MockEmbeddingProvider::new(128), 1000).await;
        let spans = vec![
            MentionSpan::from_text("قمح"),
            MentionSpan::from_text("rice"),
            MentionSpan::from_text("9am7"),
        ];

        let resolution = resolver.resolve(&spans, &snapshot).await;

        assert_eq!(resolution.mentions.len(), 3);
        assert!(!resolution.degraded());
        for mention in &resolution.mentions {
            assert!(mention.confidence >= 0.95, "{:?}", mention);
        }
        assert_eq!(resolution.mentions[0].record.as_ref().unwrap().id.as_str(), "wheat");
        assert_eq!(resolution.mentions[2].record.as_ref().unwrap().id.as_str(), "wheat");
    }

    #[tokio::test]
    async fn test_unknown_span_is_unresolved() {
        let (resolver, snapshot) = setup(MockEmbeddingProvider::new(128), 1000).await;
        let spans = vec![MentionSpan::from_text("zzqx")];

        let resolution = resolver.resolve(&spans, &snapshot).await;

        assert_eq!(resolution.mentions.len(), 1);
        assert!(!resolution.mentions[0].is_resolved());
        assert_eq!(resolution.mentions[0].confidence, 0.0);
    }

    #[tokio::test]
    async fn test_recipe_is_expanded_in_place() {
        let (resolver, snapshot) = setup(MockEmbeddingProvider::new(128), 1000).await;
        let spans = vec![MentionSpan::from_text("طاجين"), MentionSpan::from_text("rice")];

        let resolution = resolver.resolve(&spans, &snapshot).await;
        let ids: Vec<&str> = resolution
            .mentions
            .iter()
            .map(|m| m.record.as_ref().map(|r| r.id.as_str()).unwrap_or("-"))
            .collect();

        assert_eq!(ids, vec!["lamb", "semolina", "rice"]);
        assert_eq!(resolution.mentions[0].span.recipe, Some(id("tagine")));
        assert_eq!(resolution.mentions[2].span.recipe, None);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_string_match() {
        let slow = MockEmbeddingProvider::new(128).with_delay(Duration::from_millis(200));
        let (resolver, snapshot) = setup(slow, 20).await;
        let spans = vec![MentionSpan::from_text("wheat")];

        let resolution = resolver.resolve(&spans, &snapshot).await;
        let mention = &resolution.mentions[0];

        assert!(resolution.degraded());
        assert!(matches!(
            resolution.failures[0].error,
            DomainError::UpstreamTimeout { .. }
        ));
        assert_eq!(mention.record.as_ref().unwrap().id.as_str(), "wheat");
        assert!(mention.is_degraded());
        assert!(mention.confidence < 0.95);
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let (resolver, snapshot) = setup(MockEmbeddingProvider::new(128), 1000).await;
        let spans = vec![MentionSpan::from_text("semoul")];

        let first = resolver.resolve(&spans, &snapshot).await;
        let second = resolver.resolve(&spans, &snapshot).await;

        assert_eq!(first.mentions[0].confidence, second.mentions[0].confidence);
        assert_eq!(
            first.mentions[0].record.as_ref().map(|r| r.id.clone()),
            second.mentions[0].record.as_ref().map(|r| r.id.clone())
        );
        assert_eq!(first.mentions[0].signals, second.mentions[0].signals);
    }

    #[tokio::test]
    async fn test_timeout_never_raises_fuzzy_confidence() {
        let (fast, snapshot) = setup(MockEmbeddingProvider::new(128), 1000).await;
        let slow = MockEmbeddingProvider::new(128).with_delay(Duration::from_millis(200));
        let (slow, _) = setup(slow, 20).await;

        for text in ["smoulinna", "smolinna", "smeolina"] {
            let spans = vec![MentionSpan::from_text(text)];
            let full = fast.resolve(&spans, &snapshot).await;
            let degraded = slow.resolve(&spans, &snapshot).await;

            let degraded = &degraded.mentions[0];
            assert!(degraded.is_degraded());
            assert_eq!(degraded.record.as_ref().unwrap().id.as_str(), "semolina", "{}", text);
            assert!(
                degraded.confidence < full.mentions[0].confidence,
                "{}: degraded {} vs full {}",
                text,
                degraded.confidence,
                full.mentions[0].confidence
            );
        }
    }

    #[tokio::test]
    async fn test_resolve_without_embedding_is_degraded() {
        let (resolver, snapshot) = setup(MockEmbeddingProvider::new(128), 1000).await;
        let mention = resolver.resolve_without_embedding(&MentionSpan::from_text("rice"), &snapshot);

        assert!(mention.is_degraded());
        assert!((mention.confidence - 0.95 * 0.85).abs() < 1e-6);
    }
}
