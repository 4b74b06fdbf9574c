//! End-to-end query pipeline

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, field, info, instrument, warn, Span};

use super::config::PipelineConfig;
use super::response::{QueryRequest, QueryResponse};
use super::session::{PipelineStage, QuerySession, StageFailure};
use crate::domain::classifier::{ClassificationResult, GlutenClassifier};
use crate::domain::composer::{AnswerComposer, ComposedAnswer, CompositionInput};
use crate::domain::generation::GenerationProvider;
use crate::domain::index::KnowledgeIndex;
use crate::domain::ingredient::{KnowledgeBaseFile, RecipeRecord};
use crate::domain::resolver::{IngredientResolver, MentionSegmenter};
use crate::domain::script::{detect_locale, Language, Locale, ScriptNormalizer};
use crate::domain::suggester::AlternativeSuggester;
use crate::domain::upstream::UpstreamLimiter;
use crate::domain::DomainError;

/// Normalizer → resolver → classifier → suggester → composer.
///
/// Sessions share only the knowledge index and the upstream limiter. Each
/// session pins the snapshot current when it starts.
#[derive(Debug, Clone)]
pub struct GlutenPipeline {
    index: Arc<KnowledgeIndex>,
    config: PipelineConfig,
    normalizer: ScriptNormalizer,
    segmenter: MentionSegmenter,
    resolver: IngredientResolver,
    classifier: GlutenClassifier,
    suggester: AlternativeSuggester,
    composer: AnswerComposer,
}

impl GlutenPipeline {
    pub fn new(index: Arc<KnowledgeIndex>, config: PipelineConfig) -> Self {
        let limiter = UpstreamLimiter::new(config.max_concurrent_upstream, config.upstream_timeout_ms);
        let resolver = IngredientResolver::new(
            Arc::clone(index.embedder()),
            limiter.clone(),
            config.resolver.clone(),
        );

        Self {
            classifier: GlutenClassifier::new(config.resolver.min_confidence),
            suggester: AlternativeSuggester::new(config.suggester.clone()),
            composer: AnswerComposer::new(limiter),
            normalizer: ScriptNormalizer::new(),
            segmenter: MentionSegmenter::new(),
            resolver,
            index,
            config,
        }
    }

    /// Enable grounded narration of answers
    pub fn with_generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.composer = self.composer.with_generator(generator);
        self
    }

    pub fn index(&self) -> &Arc<KnowledgeIndex> {
        &self.index
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replace the knowledge base; running sessions are unaffected
    pub async fn reload(&self, file: KnowledgeBaseFile) -> Result<u64, DomainError> {
        Ok(self.index.reload(file).await?.version())
    }

    /// Answer a query.
    ///
    /// Fails only when no knowledge base is loaded; every later failure is
    /// recovered and reported in the response.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse, DomainError> {
        let session = self.run(request).await?;
        Ok(QueryResponse::from_session(&session))
    }

    /// Answer a query and keep every intermediate artifact
    #[instrument(skip(self, request), fields(session_id = field::Empty, language = field::Empty))]
    pub async fn run(&self, request: QueryRequest) -> Result<QuerySession, DomainError> {
        let snapshot = self.index.snapshot()?;
        let mut session = QuerySession::new(request.text.as_str());
        session.index_version = snapshot.version();

        let span = Span::current();
        span.record("session_id", field::display(session.id));

        // Normalization
        let started = Instant::now();
        let normalized = match &request.raw {
            Some(raw) => self.normalizer.normalize_bytes(raw),
            None => self.normalizer.normalize(&request.text),
        };
        if normalized.repaired {
            session.fail(StageFailure::new(
                PipelineStage::Normalization,
                "Input contained malformed text and was repaired",
            ));
        }
        let locale = detect_locale(&normalized);
        span.record("language", field::display(locale));
        session.locale = Some(locale);
        session.complete(PipelineStage::Normalization, elapsed_ms(started));
        info!(chars = normalized.char_len(), repaired = normalized.repaired, "Normalized query");

        // Segmentation
        let started = Instant::now();
        let spans = self.segmenter.segment(&normalized, snapshot.lexicon());
        session.normalized = Some(normalized);
        session.complete(PipelineStage::Segmentation, elapsed_ms(started));
        debug!(spans = spans.len(), "Segmented query");

        // Resolution
        let started = Instant::now();
        let resolution = self.resolver.resolve(&spans, &snapshot).await;
        for failure in &resolution.failures {
            session.fail(
                StageFailure::new(PipelineStage::Resolution, failure.error.to_string())
                    .with_span(failure.span.as_str()),
            );
        }
        session.spans = spans;
        session.complete(PipelineStage::Resolution, elapsed_ms(started));
        info!(
            mentions = resolution.mentions.len(),
            resolved = resolution.mentions.iter().filter(|m| m.is_resolved()).count(),
            degraded = resolution.degraded(),
            "Resolved mentions"
        );

        // Classification
        let started = Instant::now();
        let result = self.classifier.classify(&resolution.mentions);
        session.mentions = resolution.mentions;
        session.complete(PipelineStage::Classification, elapsed_ms(started));
        info!(status = %result.status, confidence = result.confidence, "Classified query");

        // Suggestion
        let started = Instant::now();
        let region = self.region_for(&request, locale.language);
        let suggestions = self.suggester.suggest(&result, &snapshot, region.as_deref());
        session.region = region;
        session.complete(PipelineStage::Suggestion, elapsed_ms(started));
        debug!(suggestions = suggestions.len(), "Suggested substitutes");

        // Composition
        let started = Instant::now();
        let recipes: Vec<Arc<RecipeRecord>> = {
            let mut ids = Vec::new();
            for mention in &session.mentions {
                if let Some(id) = &mention.span.recipe {
                    if !ids.contains(id) {
                        ids.push(id.clone());
                    }
                }
            }
            ids.iter().filter_map(|id| snapshot.get_recipe(id)).collect()
        };

        let input = CompositionInput {
            result: &result,
            suggestions: &suggestions,
            locale,
            recipes: &recipes,
        };

        match self.composer.render(&input) {
            Ok(mut answer) => {
                match self.composer.narrate(&input, &answer).await {
                    Ok(narration) => answer.narration = narration,
                    Err(e) => {
                        warn!(error = %e, "Narration failed, keeping templated answer");
                        session.fail(StageFailure::new(PipelineStage::Composition, e.to_string()));
                    }
                }
                session.answer = Some(answer);
                session.classification = Some(result);
                session.suggestions = suggestions;
            }
            Err(e) => {
                warn!(error = %e, "Composition failed, answering UNKNOWN");
                session.fail(StageFailure::new(PipelineStage::Composition, e.to_string()));
                session.answer = Some(self.unknown_answer(locale));
                session.classification = Some(ClassificationResult::unknown());
            }
        }
        session.complete(PipelineStage::Composition, elapsed_ms(started));

        info!(
            status = %session
                .classification
                .as_ref()
                .map(|c| c.status.to_string())
                .unwrap_or_default(),
            failures = session.failures.len(),
            "Query answered"
        );

        Ok(session)
    }

    /// Explicit hint, else the language's home region, else the configured
    /// default
    fn region_for(&self, request: &QueryRequest, language: Language) -> Option<String> {
        request
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .or_else(|| language.default_region().map(str::to_string))
            .or_else(|| self.config.default_region.clone())
    }

    fn unknown_answer(&self, locale: Locale) -> ComposedAnswer {
        let unknown = ClassificationResult::unknown();
        let input = CompositionInput {
            result: &unknown,
            suggestions: &[],
            locale,
            recipes: &[],
        };

        self.composer.render(&input).unwrap_or_else(|_| {
            let text = crate::domain::composer::phrases(locale).unknown.to_string();
            ComposedAnswer {
                locale,
                display_text: self.normalizer.render_for_display(&text),
                text,
                narration: None,
            }
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::classifier::AggregateStatus;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::generation::MockGenerationProvider;
    use crate::domain::ingredient::{GlutenStatus, IngredientRecord, RecordId};
    use crate::domain::resolver::MentionSpan;

    fn id(value: &str) -> RecordId {
        RecordId::new(value).unwrap()
    }

    fn knowledge_base() -> KnowledgeBaseFile {
        KnowledgeBaseFile::new(
            vec![
                IngredientRecord::new(id("wheat"), GlutenStatus::Contains)
                    .with_name(Language::Arabic, "قمح")
                    .with_name(Language::French, "blé")
                    .with_name(Language::English, "wheat")
                    .with_alias("zraa")
                    .with_category("grain")
                    .with_evidence("Codex STAN 118-1979")
                    .with_substitute(id("rice_flour"))
                    .with_substitute(id("chickpea_flour")),
                IngredientRecord::new(id("bread"), GlutenStatus::Contains)
                    .with_name(Language::Arabic, "خبز")
                    .with_name(Language::French, "pain")
                    .with_name(Language::English, "bread")
                    .with_category("bread")
                    .with_evidence("Wheat flour bread"),
                IngredientRecord::new(id("rice_flour"), GlutenStatus::Free)
                    .with_name(Language::Arabic, "دقيق الأرز")
                    .with_name(Language::French, "farine de riz")
                    .with_name(Language::English, "rice flour")
                    .with_category("flour")
                    .with_region("MA"),
                IngredientRecord::new(id("chickpea_flour"), GlutenStatus::Free)
                    .with_name(Language::Arabic, "دقيق الحمص")
                    .with_name(Language::English, "chickpea flour")
                    .with_category("flour")
                    .with_region("MA"),
                IngredientRecord::new(id("vegetables"), GlutenStatus::Free)
                    .with_name(Language::Arabic, "خضار")
                    .with_name(Language::English, "vegetables")
                    .with_evidence("Fresh produce"),
                IngredientRecord::new(id("salad"), GlutenStatus::Free)
                    .with_name(Language::Arabic, "سلطة")
                    .with_name(Language::English, "salad"),
            ],
            vec![
                RecipeRecord::new(id("harira"))
                    .with_name(Language::Arabic, "حريرة")
                    .with_name(Language::English, "harira")
                    .with_ingredient("قمح")
                    .with_ingredient("خضار")
                    .with_region("MA"),
            ],
        )
    }

    async fn pipeline_with(embedder: MockEmbeddingProvider, config: PipelineConfig) -> GlutenPipeline {
        let index = Arc::new(KnowledgeIndex::new(Arc::new(embedder)));
        index.load(knowledge_base()).await.unwrap();
        GlutenPipeline::new(index, config)
    }

    async fn pipeline() -> GlutenPipeline {
        pipeline_with(MockEmbeddingProvider::new(256), PipelineConfig::default()).await
    }

    #[tokio::test]
    async fn test_query_without_index_is_rejected() {
        let index = Arc::new(KnowledgeIndex::new(Arc::new(MockEmbeddingProvider::new(64))));
        let pipeline = GlutenPipeline::new(index, PipelineConfig::default());

        let result = pipeline.query(QueryRequest::new("خبز بالقمح")).await;
        assert!(matches!(result, Err(DomainError::IndexUnavailable)));
    }

    #[tokio::test]
    async fn test_bread_with_wheat_contains_gluten() {
        let response = pipeline().await.query(QueryRequest::new("خبز بالقمح")).await.unwrap();

        assert_eq!(response.language, Language::Arabic);
        assert_eq!(response.status, AggregateStatus::Contains);
        assert!(response.mentions.iter().any(|m| m.record.as_ref().map(|r| r.as_str()) == Some("wheat")));
        assert!(!response.suggestions.is_empty());
        assert!(response.text.contains("يحتوي على الغلوتين"));
        assert!(!response.degraded);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_repaired_not_rejected() {
        let request = QueryRequest::from_bytes(b"wheat \xff\xfe bread");
        let response = pipeline().await.query(request).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Contains);
        assert!(response
            .failures
            .iter()
            .any(|f| f.stage == PipelineStage::Normalization));
        assert!(!response.degraded);
    }

    #[tokio::test]
    async fn test_vegetable_salad_is_free() {
        let response = pipeline().await.query(QueryRequest::new("سلطة بالخضار")).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Free);
        assert!(response.suggestions.is_empty());
        assert!(response.text.contains("خال من الغلوتين"));
    }

    #[tokio::test]
    async fn test_unknown_token_is_caveat() {
        let response = pipeline()
            .await
            .query(QueryRequest::new("salad, vegetables, zzqxv"))
            .await
            .unwrap();

        assert_eq!(response.status, AggregateStatus::Free);
        assert!(response.caveats.contains(&"zzqxv".to_string()));
        let unknown = response.mentions.iter().find(|m| m.span == "zzqxv").unwrap();
        assert_eq!(unknown.status, GlutenStatus::Unknown);
        assert_eq!(unknown.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_embedding_timeout_falls_back_with_lower_confidence() {
        let fast = pipeline().await.query(QueryRequest::new("wheat")).await.unwrap();

        let index = Arc::new(KnowledgeIndex::new(Arc::new(MockEmbeddingProvider::new(256))));
        index.load(knowledge_base()).await.unwrap();
        let slow_resolver = IngredientResolver::new(
            Arc::new(MockEmbeddingProvider::new(256).with_delay(Duration::from_millis(300))),
            UpstreamLimiter::new(4, 20),
            PipelineConfig::default().resolver,
        );
        let mut slow = GlutenPipeline::new(index, PipelineConfig::default());
        slow.resolver = slow_resolver;

        let degraded = slow.query(QueryRequest::new("wheat")).await.unwrap();

        assert_eq!(fast.status, AggregateStatus::Contains);
        assert_eq!(degraded.status, AggregateStatus::Contains);
        assert!(degraded.degraded);
        assert!(degraded.confidence < fast.confidence);
        assert!(degraded
            .failures
            .iter()
            .any(|f| f.stage == PipelineStage::Resolution && f.span.as_deref() == Some("wheat")));
    }

    #[tokio::test]
    async fn test_recipe_is_expanded() {
        let session = pipeline().await.run(QueryRequest::new("harira")).await.unwrap();
        let result = session.classification.as_ref().unwrap();

        assert_eq!(result.status, AggregateStatus::Mixed);
        assert!(session.mentions.iter().all(|m| m.span.recipe == Some(id("harira"))));
        assert!(session.answer.as_ref().unwrap().text.contains("From harira"));
    }

    #[tokio::test]
    async fn test_session_records_stages_in_order() {
        let session = pipeline().await.run(QueryRequest::new("pain")).await.unwrap();

        assert_eq!(
            session.stage_order(),
            vec![
                PipelineStage::Normalization,
                PipelineStage::Segmentation,
                PipelineStage::Resolution,
                PipelineStage::Classification,
                PipelineStage::Suggestion,
                PipelineStage::Composition,
            ]
        );
        assert_eq!(session.locale.map(|l| l.language), Some(Language::French));
        assert_eq!(session.index_version, 1);
    }

    #[tokio::test]
    async fn test_region_hint_overrides_default() {
        let pipeline = pipeline().await;
        let request = QueryRequest::new("wheat").with_region(" TN ");

        assert_eq!(pipeline.region_for(&request, Language::English).as_deref(), Some("TN"));
        assert_eq!(
            pipeline
                .region_for(&QueryRequest::new("wheat"), Language::English)
                .as_deref(),
            Some("MA")
        );
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let pipeline = pipeline().await;
        let snapshot = pipeline.index().snapshot().unwrap();
        let spans = vec![MentionSpan::from_text("قمح"), MentionSpan::from_text("blé")];

        let first = pipeline.resolver.resolve(&spans, &snapshot).await;
        let second = pipeline.resolver.resolve(&spans, &snapshot).await;

        let summary = |r: &crate::domain::resolver::Resolution| {
            r.mentions
                .iter()
                .map(|m| (m.record.as_ref().map(|r| r.id.clone()), m.confidence, m.signals.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&first), summary(&second));
    }

    #[tokio::test]
    async fn test_known_names_resolve_with_high_confidence() {
        let response = pipeline()
            .await
            .query(QueryRequest::new("wheat, rice flour, salad"))
            .await
            .unwrap();

        assert_eq!(response.mentions.len(), 3);
        assert!(response.mentions.iter().all(|m| m.confidence >= 0.95));
    }

    #[tokio::test]
    async fn test_session_keeps_snapshot_across_reload() {
        let pipeline = pipeline().await;
        let pinned = pipeline.index().snapshot().unwrap();

        let version = pipeline.reload(knowledge_base()).await.unwrap();

        assert_eq!(version, 2);
        assert_eq!(pinned.version(), 1);
        assert!(pinned.get(&id("wheat")).is_some());
        assert_eq!(pipeline.index().version(), 2);
    }

    #[tokio::test]
    async fn test_narration_failure_is_reported() {
        let mut generator = MockGenerationProvider::new();
        generator
            .expect_generate()
            .returning(|_| Err(DomainError::provider("mock", "unavailable")));

        let pipeline = pipeline().await.with_generator(Arc::new(generator));
        let response = pipeline.query(QueryRequest::new("wheat")).await.unwrap();

        assert_eq!(response.status, AggregateStatus::Contains);
        assert!(response.narration.is_none());
        assert!(response
            .failures
            .iter()
            .any(|f| f.stage == PipelineStage::Composition));
        assert!(!response.degraded);
    }
}
