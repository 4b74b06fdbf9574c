//! Ingredient resolver domain
//!
//! Segments normalized queries into mentions and maps each mention to a
//! canonical ingredient using two independent scorers (edit distance over
//! folded names, embedding similarity) combined by an explicit weighted
//! merge.

mod config;
mod embedding_scorer;
mod merge;
mod resolve;
mod segment;
mod string_scorer;

pub use config::ResolverConfig;
pub use embedding_scorer::{EmbeddingCandidate, EmbeddingScorer, EmbeddingScores};
pub use merge::{merge_signals, MergeOutcome, SignalScores};
pub use resolve::{IngredientResolver, Resolution, ResolvedMention, SpanFailure};
pub use segment::{MentionSegmenter, MentionSpan};
pub use string_scorer::{StringCandidate, StringMatchScorer};
