//! Gluten classifier

use tracing::debug;

use super::result::{AggregateStatus, ClassificationResult, EvidenceCitation, MentionVerdict};
use crate::domain::ingredient::GlutenStatus;
use crate::domain::resolver::ResolvedMention;

/// Aggregates per-mention gluten statuses.
///
/// A mention counts only when resolved at or above the confidence
/// threshold. Any CONTAINS with any FREE is MIXED, otherwise any CONTAINS
/// is CONTAINS, otherwise any FREE is FREE; with nothing determined the
/// result is UNKNOWN. UNKNOWN mentions never lower the confidence of a
/// determined verdict and are reported as caveats.
#[derive(Debug, Clone)]
pub struct GlutenClassifier {
    min_confidence: f32,
}

impl GlutenClassifier {
    pub fn new(min_confidence: f32) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Status of a single mention
    pub fn mention_status(&self, mention: &ResolvedMention) -> GlutenStatus {
        match &mention.record {
            Some(record) if mention.confidence >= self.min_confidence => record.gluten_status,
            _ => GlutenStatus::Unknown,
        }
    }

    pub fn classify(&self, mentions: &[ResolvedMention]) -> ClassificationResult {
        let breakdown: Vec<MentionVerdict> = mentions
            .iter()
            .map(|mention| MentionVerdict {
                status: self.mention_status(mention),
                mention: mention.clone(),
            })
            .collect();

        let has_contains = breakdown.iter().any(|v| v.status == GlutenStatus::Contains);
        let has_free = breakdown.iter().any(|v| v.status == GlutenStatus::Free);

        let status = match (has_contains, has_free) {
            (true, true) => AggregateStatus::Mixed,
            (true, false) => AggregateStatus::Contains,
            (false, true) => AggregateStatus::Free,
            (false, false) => AggregateStatus::Unknown,
        };

        let determined: Vec<&MentionVerdict> =
            breakdown.iter().filter(|v| v.is_determined()).collect();

        let confidence = determined
            .iter()
            .map(|v| v.mention.confidence)
            .reduce(f32::min)
            .unwrap_or(0.0);

        let degraded = determined.iter().any(|v| v.mention.is_degraded());

        let mut evidence: Vec<EvidenceCitation> = Vec::new();
        for record in determined.iter().filter_map(|v| v.record()) {
            if !evidence.iter().any(|e| e.record == record.id) {
                evidence.push(EvidenceCitation {
                    record: record.id.clone(),
                    source: record.evidence.clone(),
                });
            }
        }

        let mut caveats: Vec<String> = Vec::new();
        for verdict in breakdown.iter().filter(|v| !v.is_determined()) {
            let text = &verdict.mention.span.text;
            if !caveats.contains(text) {
                caveats.push(text.clone());
            }
        }

        debug!(
            status = %status,
            confidence,
            mentions = breakdown.len(),
            caveats = caveats.len(),
            "Classified query"
        );

        ClassificationResult {
            status,
            breakdown,
            confidence,
            evidence,
            caveats,
            degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ingredient::{IngredientRecord, RecordId};
    use crate::domain::resolver::{MentionSpan, SignalScores};
    use crate::domain::script::Language;

    fn record(id: &str, status: GlutenStatus) -> Arc<IngredientRecord> {
        Arc::new(
            IngredientRecord::new(RecordId::new(id).unwrap(), status)
                .with_name(Language::English, id)
                .with_evidence(format!("{} reference", id)),
        )
    }

    fn mention(text: &str, record: Option<Arc<IngredientRecord>>, confidence: f32) -> ResolvedMention {
        ResolvedMention {
            span: MentionSpan::from_text(text),
            record,
            matched_name: None,
            confidence,
            signals: SignalScores::default(),
        }
    }

    fn classify(mentions: &[ResolvedMention]) -> ClassificationResult {
        GlutenClassifier::new(0.5).classify(mentions)
    }

    #[test]
    fn test_all_free_is_free() {
        let result = classify(&[
            mention("rice", Some(record("rice", GlutenStatus::Free)), 0.9),
            mention("lamb", Some(record("lamb", GlutenStatus::Free)), 0.8),
        ]);

        assert_eq!(result.status, AggregateStatus::Free);
        assert!((result.confidence - 0.8).abs() < 1e-6);
        assert!(result.caveats.is_empty());
    }

    #[test]
    fn test_any_contains_is_never_free() {
        let result = classify(&[mention("wheat", Some(record("wheat", GlutenStatus::Contains)), 0.97)]);
        assert_eq!(result.status, AggregateStatus::Contains);

        let result = classify(&[
            mention("wheat", Some(record("wheat", GlutenStatus::Contains)), 0.97),
            mention("rice", Some(record("rice", GlutenStatus::Free)), 0.6),
        ]);
        assert_eq!(result.status, AggregateStatus::Mixed);
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert!(result.status.needs_substitutes());
    }

    #[test]
    fn test_low_confidence_mention_is_unknown() {
        let result = classify(&[mention("whet", Some(record("wheat", GlutenStatus::Contains)), 0.4)]);

        assert_eq!(result.status, AggregateStatus::Unknown);
        assert_eq!(result.breakdown[0].status, GlutenStatus::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.caveats, vec!["whet".to_string()]);
    }

    #[test]
    fn test_unknown_mention_does_not_downgrade_free() {
        let result = classify(&[
            mention("salad", Some(record("salad", GlutenStatus::Free)), 0.96),
            mention("zzqx", None, 0.0),
        ]);

        assert_eq!(result.status, AggregateStatus::Free);
        assert!((result.confidence - 0.96).abs() < 1e-6);
        assert_eq!(result.caveats, vec!["zzqx".to_string()]);
    }

    #[test]
    fn test_evidence_deduplicated_in_order() {
        let wheat = record("wheat", GlutenStatus::Contains);
        let result = classify(&[
            mention("wheat", Some(Arc::clone(&wheat)), 0.97),
            mention("barley", Some(record("barley", GlutenStatus::Contains)), 0.9),
            mention("blé", Some(wheat), 0.96),
        ]);

        let ids: Vec<&str> = result.evidence.iter().map(|e| e.record.as_str()).collect();
        assert_eq!(ids, vec!["wheat", "barley"]);
        assert_eq!(result.evidence[0].source.as_deref(), Some("wheat reference"));
        assert_eq!(result.records_with(GlutenStatus::Contains).len(), 2);
    }

    #[test]
    fn test_record_with_unknown_status() {
        let result = classify(&[mention("oats", Some(record("oats", GlutenStatus::Unknown)), 0.99)]);

        assert_eq!(result.status, AggregateStatus::Unknown);
        assert_eq!(result.caveats, vec!["oats".to_string()]);
    }

    #[test]
    fn test_no_mentions() {
        let result = classify(&[]);

        assert_eq!(result.status, AggregateStatus::Unknown);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_degraded_flag_from_contributing_mentions() {
        let mut degraded = mention("wheat", Some(record("wheat", GlutenStatus::Contains)), 0.85);
        degraded.signals.degraded = true;

        let result = classify(&[degraded]);
        assert!(result.degraded);
    }
}
