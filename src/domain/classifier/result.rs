//! Classification result types

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ingredient::{GlutenStatus, IngredientRecord, RecordId};
use crate::domain::resolver::ResolvedMention;

/// Aggregate gluten status of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregateStatus {
    Contains,
    Free,
    Unknown,
    /// Both gluten-containing and gluten-free ingredients were found
    Mixed,
}

impl AggregateStatus {
    /// Whether substitutes should be suggested
    pub fn needs_substitutes(&self) -> bool {
        matches!(self, Self::Contains | Self::Mixed)
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "CONTAINS"),
            Self::Free => write!(f, "FREE"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Mixed => write!(f, "MIXED"),
        }
    }
}

/// Status assigned to one mention
#[derive(Debug, Clone, Serialize)]
pub struct MentionVerdict {
    pub mention: ResolvedMention,
    pub status: GlutenStatus,
}

impl MentionVerdict {
    /// Counts towards the aggregate (CONTAINS or FREE)
    pub fn is_determined(&self) -> bool {
        matches!(self.status, GlutenStatus::Contains | GlutenStatus::Free)
    }

    pub fn record(&self) -> Option<&Arc<IngredientRecord>> {
        self.mention.record.as_ref()
    }
}

/// Source justifying a status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCitation {
    pub record: RecordId,
    /// Citation text from the record, when it carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Aggregate classification of a query
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationResult {
    pub status: AggregateStatus,
    /// Per-mention verdicts, in mention order
    pub breakdown: Vec<MentionVerdict>,
    /// Weakest confidence among determined mentions; 0 when UNKNOWN
    pub confidence: f32,
    pub evidence: Vec<EvidenceCitation>,
    /// Mentions that stayed UNKNOWN
    pub caveats: Vec<String>,
    /// At least one determined mention was resolved without embeddings
    pub degraded: bool,
}

impl ClassificationResult {
    /// UNKNOWN result with no mentions
    pub fn unknown() -> Self {
        Self {
            status: AggregateStatus::Unknown,
            breakdown: Vec::new(),
            confidence: 0.0,
            evidence: Vec::new(),
            caveats: Vec::new(),
            degraded: false,
        }
    }

    /// Distinct records with the given status, in mention order
    pub fn records_with(&self, status: GlutenStatus) -> Vec<Arc<IngredientRecord>> {
        let mut records: Vec<Arc<IngredientRecord>> = Vec::new();
        for verdict in self.breakdown.iter().filter(|v| v.status == status) {
            if let Some(record) = verdict.record() {
                if !records.iter().any(|r| r.id == record.id) {
                    records.push(Arc::clone(record));
                }
            }
        }
        records
    }
}
