//! Domain layer - Core pipeline logic and entities

pub mod classifier;
pub mod composer;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod ingredient;
pub mod pipeline;
pub mod resolver;
pub mod script;
pub mod suggester;
pub mod upstream;

pub use classifier::{AggregateStatus, ClassificationResult, EvidenceCitation, GlutenClassifier};
pub use composer::{AnswerComposer, ComposedAnswer};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use generation::GenerationProvider;
pub use index::{KnowledgeIndex, KnowledgeSnapshot, NeighborQuery};
pub use ingredient::{
    validate_knowledge_base, GlutenStatus, IngredientRecord, KnowledgeBaseFile,
    KnowledgeBaseValidationError, RecipeRecord, RecordId,
};
pub use pipeline::{
    GlutenPipeline, PipelineConfig, PipelineStage, QueryRequest, QueryResponse, QuerySession,
    StageFailure,
};
pub use resolver::{IngredientResolver, MentionSegmenter, ResolvedMention, ResolverConfig};
pub use script::{detect_language, Language, Locale, NormalizedText, ScriptNormalizer, ScriptTag};
pub use suggester::{AlternativeSuggester, SubstitutionSuggestion, SuggesterConfig};
pub use upstream::UpstreamLimiter;
