//! Exact and fuzzy string matching against known names

use std::collections::HashMap;

use super::segment::MentionSpan;
use crate::domain::index::{KnowledgeSnapshot, NameOwner};
use crate::domain::script::bounded_edit_distance;

/// Keys shorter than this only match exactly
const MIN_FUZZY_LEN: usize = 4;

/// Best string match of a span against one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringCandidate {
    pub owner: NameOwner,
    /// Name entry that matched
    pub entry: usize,
    /// 1.0 for an exact key match, `1 - distance / longest` otherwise
    pub confidence: f32,
    pub exact: bool,
}

/// Edit-distance scorer over folded keys.
///
/// The allowed distance scales with the span length, so short words must
/// match exactly and longer ones may carry a few transliteration or typing
/// differences.
#[derive(Debug, Clone)]
pub struct StringMatchScorer {
    max_edit_ratio: f32,
}

impl StringMatchScorer {
    pub fn new(max_edit_ratio: f32) -> Self {
        Self {
            max_edit_ratio: max_edit_ratio.clamp(0.0, 1.0),
        }
    }

    /// Maximum edit distance tolerated for a key of this length
    pub fn allowed_distance(&self, key_len: usize) -> usize {
        if key_len < MIN_FUZZY_LEN {
            return 0;
        }
        (key_len as f32 * self.max_edit_ratio).floor() as usize
    }

    /// Candidates for the span, best per record, by descending confidence
    pub fn score(&self, span: &MentionSpan, snapshot: &KnowledgeSnapshot) -> Vec<StringCandidate> {
        if span.key.is_empty() {
            return Vec::new();
        }

        let span_len = span.key.chars().count();
        let allowed = self.allowed_distance(span_len);
        let mut best: HashMap<NameOwner, StringCandidate> = HashMap::new();

        for (entry, name) in snapshot.names().iter().enumerate() {
            let candidate = if name.key == span.key {
                Some(StringCandidate {
                    owner: name.owner,
                    entry,
                    confidence: 1.0,
                    exact: true,
                })
            } else if allowed > 0 {
                bounded_edit_distance(&span.key, &name.key, allowed).map(|distance| {
                    let longest = span_len.max(name.key.chars().count()).max(1);
                    StringCandidate {
                        owner: name.owner,
                        entry,
                        confidence: 1.0 - distance as f32 / longest as f32,
                        exact: false,
                    }
                })
            } else {
                None
            };

            if let Some(candidate) = candidate {
                best.entry(name.owner)
                    .and_modify(|current| {
                        if candidate.confidence > current.confidence {
                            *current = candidate;
                        }
                    })
                    .or_insert(candidate);
            }
        }

        let mut candidates: Vec<StringCandidate> = best.into_values().collect();
        candidates.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.entry.cmp(&b.entry))
        });
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::index::NameEntry;
    use crate::domain::ingredient::{GlutenStatus, IngredientRecord, RecordId};
    use crate::domain::script::Language;

    fn snapshot() -> KnowledgeSnapshot {
        let ingredients = vec![
            IngredientRecord::new(RecordId::new("couscous").unwrap(), GlutenStatus::Contains)
                .with_name(Language::French, "couscous"),
            IngredientRecord::new(RecordId::new("wheat").unwrap(), GlutenStatus::Contains)
                .with_name(Language::Arabic, "قمح"),
        ];
        let names = vec![
            NameEntry::new(NameOwner::Ingredient(0), "couscous", Some(Language::French), vec![]),
            NameEntry::new(NameOwner::Ingredient(0), "كسكس", Some(Language::Darija), vec![]),
            NameEntry::new(NameOwner::Ingredient(1), "قمح", Some(Language::Arabic), vec![]),
        ];
        KnowledgeSnapshot::new(1, ingredients, Vec::new(), names)
    }

    #[test]
    fn test_exact_match() {
        let scorer = StringMatchScorer::new(0.34);
        let candidates = scorer.score(&MentionSpan::from_text("القمح"), &snapshot());

        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].exact);
        assert_eq!(candidates[0].confidence, 1.0);
        assert_eq!(candidates[0].owner, NameOwner::Ingredient(1));
    }

    #[test]
    fn test_fuzzy_match_scaled_by_length() {
        let scorer = StringMatchScorer::new(0.34);
        let candidates = scorer.score(&MentionSpan::from_text("couscouss"), &snapshot());

        assert_eq!(candidates.len(), 1);
        assert!(!candidates[0].exact);
        assert!((candidates[0].confidence - (1.0 - 1.0 / 9.0)).abs() < 1e-6);
    }

    #[test]
    fn test_short_words_need_exact_match() {
        let scorer = StringMatchScorer::new(0.34);

        assert_eq!(scorer.allowed_distance(3), 0);
        assert_eq!(scorer.allowed_distance(9), 3);
        assert!(scorer.score(&MentionSpan::from_text("قمخ"), &snapshot()).is_empty());
    }

    #[test]
    fn test_best_name_per_record() {
        let scorer = StringMatchScorer::new(0.5);
        let candidates = scorer.score(&MentionSpan::from_text("كسكسو"), &snapshot());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entry, 1);
    }

    #[test]
    fn test_no_match() {
        let scorer = StringMatchScorer::new(0.34);
        assert!(scorer.score(&MentionSpan::from_text("sardines"), &snapshot()).is_empty());
    }
}
