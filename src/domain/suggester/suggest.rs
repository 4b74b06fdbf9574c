//! Alternative suggester

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::config::SuggesterConfig;
use super::suggestion::{RationaleTag, SubstitutionSuggestion};
use crate::domain::classifier::ClassificationResult;
use crate::domain::embedding::cosine_similarity;
use crate::domain::index::{KnowledgeSnapshot, NeighborQuery};
use crate::domain::ingredient::{GlutenStatus, IngredientRecord, RecordId};
use crate::domain::script::Language;

struct Candidate {
    target: Arc<IngredientRecord>,
    similarity: f32,
    curated: bool,
}

/// Proposes FREE substitutes for the CONTAINS ingredients of a result.
///
/// Candidates are the source's nearest FREE neighbours that reach the
/// similarity floor, plus its curated substitutes (exempt from the floor).
/// Score is similarity with additive curated, regional and category
/// bonuses.
#[derive(Debug, Clone, Default)]
pub struct AlternativeSuggester {
    config: SuggesterConfig,
}

impl AlternativeSuggester {
    pub fn new(config: SuggesterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuggesterConfig {
        &self.config
    }

    /// Suggestions for every gluten-containing ingredient of the result,
    /// deduplicated by target across sources. Empty when the result is not
    /// CONTAINS/MIXED or when no candidate qualifies.
    pub fn suggest(
        &self,
        result: &ClassificationResult,
        snapshot: &KnowledgeSnapshot,
        region: Option<&str>,
    ) -> Vec<SubstitutionSuggestion> {
        if !result.status.needs_substitutes() {
            return Vec::new();
        }

        let mut suggested: HashSet<RecordId> = HashSet::new();
        let mut suggestions = Vec::new();

        for source in result.records_with(GlutenStatus::Contains) {
            let ranked = self.rank(&source, snapshot, region);
            let before = suggestions.len();

            for suggestion in ranked {
                if suggestions.len() - before >= self.config.top_n {
                    break;
                }
                if suggested.insert(suggestion.target.id.clone()) {
                    suggestions.push(suggestion);
                }
            }

            debug!(
                source = %source.id,
                count = suggestions.len() - before,
                "Suggested substitutes"
            );
        }

        suggestions
    }

    /// Every qualifying substitute of one source, best first
    pub fn rank(
        &self,
        source: &Arc<IngredientRecord>,
        snapshot: &KnowledgeSnapshot,
        region: Option<&str>,
    ) -> Vec<SubstitutionSuggestion> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let source_vector = snapshot.record_vector(&source.id);

        if let Some(vector) = source_vector {
            let query = NeighborQuery::new(vector.to_vec())
                .with_top_k(self.config.neighbor_k)
                .with_status(GlutenStatus::Free)
                .excluding(source.id.clone())
                .with_probe(source.display_name(Language::English));

            for neighbor in snapshot.nearest(&query) {
                let similarity = neighbor.similarity.clamp(0.0, 1.0);
                if similarity < self.config.min_similarity {
                    continue;
                }
                candidates.push(Candidate {
                    curated: source.substitutes.contains(&neighbor.record.id),
                    target: neighbor.record,
                    similarity,
                });
            }
        }

        for id in &source.substitutes {
            if candidates.iter().any(|c| &c.target.id == id) {
                continue;
            }
            let Some(target) = snapshot.get(id) else {
                continue;
            };
            if target.gluten_status != GlutenStatus::Free {
                continue;
            }

            let similarity = match (source_vector, snapshot.record_vector(id)) {
                (Some(a), Some(b)) => cosine_similarity(a, b).clamp(0.0, 1.0),
                _ => 0.0,
            };
            candidates.push(Candidate {
                target,
                similarity,
                curated: true,
            });
        }

        let mut ranked: Vec<SubstitutionSuggestion> = candidates
            .into_iter()
            .map(|candidate| self.score(source, candidate, region))
            .collect();

        ranked.sort_by(|a, b| {
            (Reverse(quantize(a.score)), &a.target.id).cmp(&(Reverse(quantize(b.score)), &b.target.id))
        });
        ranked
    }

    fn score(
        &self,
        source: &Arc<IngredientRecord>,
        candidate: Candidate,
        region: Option<&str>,
    ) -> SubstitutionSuggestion {
        let mut rationale = Vec::new();
        let mut score = candidate.similarity;

        if candidate.curated {
            score += self.config.curated_bonus;
            rationale.push(RationaleTag::CuratedSubstitute);
        }
        if region.is_some_and(|r| candidate.target.is_staple_of(r)) {
            score += self.config.regional_bonus;
            rationale.push(RationaleTag::RegionalStaple);
        }
        let same_category = matches!(
            (&source.category, &candidate.target.category),
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
        );
        if same_category {
            score += self.config.category_bonus;
            rationale.push(RationaleTag::SameCulinaryRole);
        }
        if rationale.is_empty() {
            rationale.push(RationaleTag::SemanticNeighbor);
        }

        SubstitutionSuggestion {
            source: Arc::clone(source),
            target: candidate.target,
            similarity: candidate.similarity,
            score,
            rationale,
        }
    }
}

fn quantize(score: f32) -> i64 {
    (score as f64 * 1_000_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classifier::{AggregateStatus, GlutenClassifier};
    use crate::domain::index::{NameEntry, NameOwner};
    use crate::domain::resolver::{MentionSpan, ResolvedMention, SignalScores};

    fn id(value: &str) -> RecordId {
        RecordId::new(value).unwrap()
    }

    fn snapshot() -> KnowledgeSnapshot {
        let ingredients = vec![
            IngredientRecord::new(id("wheat"), GlutenStatus::Contains)
                .with_name(Language::English, "wheat")
                .with_category("flour")
                .with_substitute(id("rice_flour")),
            IngredientRecord::new(id("rice_flour"), GlutenStatus::Free)
                .with_name(Language::English, "rice flour")
                .with_category("flour")
                .with_region("MA"),
            IngredientRecord::new(id("chickpea_flour"), GlutenStatus::Free)
                .with_name(Language::English, "chickpea flour")
                .with_category("flour"),
            IngredientRecord::new(id("corn"), GlutenStatus::Free)
                .with_name(Language::English, "corn")
                .with_category("grain"),
            IngredientRecord::new(id("barley"), GlutenStatus::Contains)
                .with_name(Language::English, "barley")
                .with_category("grain"),
            IngredientRecord::new(id("stone_salt"), GlutenStatus::Free)
                .with_name(Language::English, "salt"),
        ];
        let vectors: [&[f32]; 6] = [
            &[1.0, 0.0, 0.0],
            &[0.5, 0.866_025_4, 0.0],
            &[0.8, 0.6, 0.0],
            &[0.7, 0.0, 0.714_142_8],
            &[0.95, 0.0, 0.312_25],
            &[0.0, 0.0, -1.0],
        ];
        let names = ingredients
            .iter()
            .enumerate()
            .map(|(i, r)| {
                NameEntry::new(
                    NameOwner::Ingredient(i),
                    r.display_name(Language::English),
                    Some(Language::English),
                    vectors[i].to_vec(),
                )
            })
            .collect();

        KnowledgeSnapshot::new(1, ingredients, Vec::new(), names)
    }

    fn classify(snapshot: &KnowledgeSnapshot, ids: &[&str]) -> ClassificationResult {
        let mentions: Vec<ResolvedMention> = ids
            .iter()
            .map(|value| ResolvedMention {
                span: MentionSpan::from_text(*value),
                record: snapshot.get(&id(value)),
                matched_name: None,
                confidence: 0.97,
                signals: SignalScores::default(),
            })
            .collect();
        GlutenClassifier::new(0.5).classify(&mentions)
    }

    fn targets(suggestions: &[SubstitutionSuggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.target.id.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_composite_score() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["wheat"]);
        let suggestions = AlternativeSuggester::default().suggest(&result, &snapshot, None);

        assert_eq!(targets(&suggestions), vec!["chickpea_flour", "rice_flour", "corn"]);
        assert_eq!(suggestions[1].primary_rationale(), RationaleTag::CuratedSubstitute);
        assert_eq!(suggestions[2].rationale, vec![RationaleTag::SemanticNeighbor]);
    }

    #[test]
    fn test_regional_bonus_promotes_staple() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["wheat"]);
        let suggestions = AlternativeSuggester::default().suggest(&result, &snapshot, Some("ma"));

        assert_eq!(suggestions[0].target.id.as_str(), "rice_flour");
        assert!(suggestions[0].rationale.contains(&RationaleTag::RegionalStaple));
    }

    #[test]
    fn test_targets_are_always_free() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["wheat", "barley"]);
        let suggestions = AlternativeSuggester::new(SuggesterConfig::new().with_top_n(10))
            .suggest(&result, &snapshot, Some("MA"));

        assert!(!suggestions.is_empty());
        assert!(
            suggestions
                .iter()
                .all(|s| s.target.gluten_status == GlutenStatus::Free)
        );
        assert!(!targets(&suggestions).contains(&"stone_salt"));
    }

    #[test]
    fn test_deduplicated_across_sources() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["wheat", "barley"]);
        let suggestions = AlternativeSuggester::default().suggest(&result, &snapshot, None);

        let mut seen = HashSet::new();
        assert!(suggestions.iter().all(|s| seen.insert(s.target.id.clone())));
        assert!(suggestions.iter().all(|s| s.source.id.as_str() == "wheat"));
    }

    #[test]
    fn test_no_candidate_above_floor_is_empty() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["barley"]);
        let suggester = AlternativeSuggester::new(SuggesterConfig::new().with_min_similarity(0.99));

        assert!(suggester.suggest(&result, &snapshot, None).is_empty());
    }

    #[test]
    fn test_curated_substitute_bypasses_floor() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["wheat"]);
        let suggester = AlternativeSuggester::new(SuggesterConfig::new().with_min_similarity(0.99));

        assert_eq!(targets(&suggester.suggest(&result, &snapshot, None)), vec!["rice_flour"]);
    }

    #[test]
    fn test_free_result_gets_no_suggestions() {
        let snapshot = snapshot();
        let result = classify(&snapshot, &["corn"]);

        assert_eq!(result.status, AggregateStatus::Free);
        assert!(AlternativeSuggester::default().suggest(&result, &snapshot, None).is_empty());
    }
}
