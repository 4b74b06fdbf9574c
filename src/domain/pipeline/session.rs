//! Per-query session state

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::classifier::ClassificationResult;
use crate::domain::composer::ComposedAnswer;
use crate::domain::resolver::{MentionSpan, ResolvedMention};
use crate::domain::script::{Locale, NormalizedText};
use crate::domain::suggester::SubstitutionSuggestion;

/// Stage of the query pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Normalization,
    Segmentation,
    Resolution,
    Classification,
    Suggestion,
    Composition,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalization => write!(f, "normalization"),
            Self::Segmentation => write!(f, "segmentation"),
            Self::Resolution => write!(f, "resolution"),
            Self::Classification => write!(f, "classification"),
            Self::Suggestion => write!(f, "suggestion"),
            Self::Composition => write!(f, "composition"),
        }
    }
}

/// Structured record of a failure recovered inside the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: PipelineStage,
    /// Span being processed, when the failure is tied to one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    pub message: String,
}

impl StageFailure {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            span: None,
            message: message.into(),
        }
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }
}

/// Completed stage with its duration
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed_ms: u64,
}

/// Transient state of one query, kept for debugging and tests.
/// Never persisted; dropped with the response.
#[derive(Debug, Clone, Serialize)]
pub struct QuerySession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub input: String,
    /// Language and script of the query
    pub locale: Option<Locale>,
    /// Region used for substitute ranking
    pub region: Option<String>,
    /// Knowledge snapshot the session ran against
    pub index_version: u64,
    pub normalized: Option<NormalizedText>,
    pub spans: Vec<MentionSpan>,
    pub mentions: Vec<ResolvedMention>,
    pub classification: Option<ClassificationResult>,
    pub suggestions: Vec<SubstitutionSuggestion>,
    pub answer: Option<ComposedAnswer>,
    /// Completed stages in execution order
    pub stages: Vec<StageTiming>,
    pub failures: Vec<StageFailure>,
}

impl QuerySession {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            input: input.into(),
            locale: None,
            region: None,
            index_version: 0,
            normalized: None,
            spans: Vec::new(),
            mentions: Vec::new(),
            classification: None,
            suggestions: Vec::new(),
            answer: None,
            stages: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Record a completed stage
    pub fn complete(&mut self, stage: PipelineStage, elapsed_ms: u64) {
        self.stages.push(StageTiming { stage, elapsed_ms });
    }

    pub fn fail(&mut self, failure: StageFailure) {
        self.failures.push(failure);
    }

    /// Whether resolution fell back to string matching for any span
    pub fn degraded(&self) -> bool {
        self.failures.iter().any(|f| f.stage == PipelineStage::Resolution)
            || self.classification.as_ref().is_some_and(|c| c.degraded)
    }

    pub fn completed(&self, stage: PipelineStage) -> bool {
        self.stages.iter().any(|s| s.stage == stage)
    }

    /// Stages completed so far, in order
    pub fn stage_order(&self) -> Vec<PipelineStage> {
        self.stages.iter().map(|s| s.stage).collect()
    }
}
