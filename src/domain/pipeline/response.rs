//! Query request and structured response

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::{QuerySession, StageFailure};
use crate::domain::classifier::{AggregateStatus, EvidenceCitation, MentionVerdict};
use crate::domain::ingredient::{GlutenStatus, RecordId};
use crate::domain::script::{Language, Locale, ScriptTag};
use crate::domain::suggester::{RationaleTag, SubstitutionSuggestion};

/// A free-form question with an optional region hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Undecoded input, set when the question arrived as invalid UTF-8
    #[serde(skip)]
    pub raw: Option<Vec<u8>>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            region: None,
            raw: None,
        }
    }

    /// Request from undecoded input. Invalid UTF-8 is kept so normalization
    /// can repair it and report the repair.
    pub fn from_bytes(raw: &[u8]) -> Self {
        match std::str::from_utf8(raw) {
            Ok(text) => Self::new(text),
            Err(_) => Self {
                text: String::from_utf8_lossy(raw).into_owned(),
                region: None,
                raw: Some(raw.to_vec()),
            },
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

/// One mention of the breakdown
#[derive(Debug, Clone, Serialize)]
pub struct MentionReport {
    pub span: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
    /// Display name in the query language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: GlutenStatus,
    pub confidence: f32,
    /// Recipe the mention was expanded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecordId>,
    pub degraded: bool,
}

impl MentionReport {
    fn from_verdict(verdict: &MentionVerdict, locale: Locale) -> Self {
        let mention = &verdict.mention;
        Self {
            span: mention.span.text.clone(),
            record: mention.record.as_ref().map(|r| r.id.clone()),
            name: mention
                .record
                .as_ref()
                .map(|r| r.localized_name(locale).to_string()),
            status: verdict.status,
            confidence: mention.confidence,
            recipe: mention.span.recipe.clone(),
            degraded: mention.is_degraded(),
        }
    }
}

/// One suggested substitute
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionReport {
    pub source: RecordId,
    pub target: RecordId,
    /// Target display name in the query language
    pub name: String,
    pub similarity: f32,
    pub score: f32,
    pub rationale: Vec<RationaleTag>,
}

impl SuggestionReport {
    fn from_suggestion(suggestion: &SubstitutionSuggestion, locale: Locale) -> Self {
        Self {
            source: suggestion.source.id.clone(),
            target: suggestion.target.id.clone(),
            name: suggestion.target.localized_name(locale).to_string(),
            similarity: suggestion.similarity,
            score: suggestion.score,
            rationale: suggestion.rationale.clone(),
        }
    }
}

/// Structured answer to a query
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub session_id: Uuid,
    pub language: Language,
    /// Script the question and the answer are written in
    pub script: ScriptTag,
    pub status: AggregateStatus,
    pub confidence: f32,
    pub mentions: Vec<MentionReport>,
    pub evidence: Vec<EvidenceCitation>,
    pub caveats: Vec<String>,
    pub suggestions: Vec<SuggestionReport>,
    /// Composed answer in the query language (logical order)
    pub text: String,
    /// Same answer shaped and reordered for terminals without bidi support
    pub display_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    /// Resolution fell back to string matching for at least one span
    pub degraded: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StageFailure>,
    pub index_version: u64,
}

impl QueryResponse {
    /// Summarize a finished session
    pub fn from_session(session: &QuerySession) -> Self {
        let locale = session
            .locale
            .unwrap_or_else(|| Locale::native(Language::English));

        let (status, confidence, mentions, evidence, caveats) = match &session.classification {
            Some(result) => (
                result.status,
                result.confidence,
                result
                    .breakdown
                    .iter()
                    .map(|v| MentionReport::from_verdict(v, locale))
                    .collect(),
                result.evidence.clone(),
                result.caveats.clone(),
            ),
            None => (AggregateStatus::Unknown, 0.0, Vec::new(), Vec::new(), Vec::new()),
        };

        let (text, display_text, narration) = match &session.answer {
            Some(answer) => (
                answer.text.clone(),
                answer.display_text.clone(),
                answer.narration.clone(),
            ),
            None => (String::new(), String::new(), None),
        };

        Self {
            session_id: session.id,
            language: locale.language,
            script: locale.script,
            status,
            confidence,
            mentions,
            evidence,
            caveats,
            suggestions: session
                .suggestions
                .iter()
                .map(|s| SuggestionReport::from_suggestion(s, locale))
                .collect(),
            text,
            display_text,
            narration,
            degraded: session.degraded(),
            failures: session.failures.clone(),
            index_version: session.index_version,
        }
    }

    /// Text to show: the narration when accepted, else the templated text
    pub fn answer(&self) -> &str {
        self.narration.as_deref().unwrap_or(&self.text)
    }
}
