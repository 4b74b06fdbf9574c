//! Weighted merge of the string and embedding signals

use std::cmp::Reverse;
use std::collections::BTreeSet;

use serde::Serialize;

use super::config::ResolverConfig;
use super::embedding_scorer::EmbeddingScores;
use super::segment::MentionSpan;
use super::string_scorer::StringCandidate;
use crate::domain::index::{KnowledgeSnapshot, NameOwner};

/// Raw signal values behind a resolution
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SignalScores {
    /// String-match confidence of the chosen record
    pub string: Option<f32>,
    /// Embedding similarity of the chosen record
    pub embedding: Option<f32>,
    pub exact: bool,
    /// Embedding signal was unavailable (timeout or provider failure)
    pub degraded: bool,
}

/// Result of merging both signals for one span
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeOutcome {
    /// Chosen record, `None` when nothing cleared the resolution floor
    pub owner: Option<NameOwner>,
    /// Name entry that justified the choice
    pub entry: Option<usize>,
    /// Final confidence in [0, 1]
    pub confidence: f32,
    pub signals: SignalScores,
}

impl MergeOutcome {
    fn unresolved(degraded: bool) -> Self {
        Self {
            owner: None,
            entry: None,
            confidence: 0.0,
            signals: SignalScores {
                degraded,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Scored {
    owner: NameOwner,
    entry: usize,
    confidence: f32,
    signals: SignalScores,
}

/// Combine the two independent signals into a single resolution.
///
/// With both signals, a record's confidence is the weighted sum of its
/// string and embedding scores, raised to the exact-match floor when the
/// string match is exact. Records found by embedding alone are scaled down
/// so a semantic near-miss never outranks a spelling match. Without
/// embeddings (`embedding == None`) only string matches count: the score is
/// the weighted formula with a zero embedding term (or the exact floor),
/// times the degraded factor, so it stays below the full-path score. Ties prefer a name written in the span's script, then
/// ingredients over recipes, then the lower identifier.
pub fn merge_signals(
    span: &MentionSpan,
    string: &[StringCandidate],
    embedding: Option<&EmbeddingScores>,
    snapshot: &KnowledgeSnapshot,
    config: &ResolverConfig,
) -> MergeOutcome {
    let degraded = embedding.is_none();
    let mut scored: Vec<Scored> = Vec::new();

    for candidate in string {
        let (confidence, embedding_similarity) = match embedding {
            Some(scores) => {
                let similarity = scores.similarity(candidate.owner).unwrap_or(0.0);
                let mut confidence = config.string_weight * candidate.confidence
                    + config.embedding_weight * similarity;
                if candidate.exact {
                    confidence = confidence.max(config.exact_match_floor);
                }
                (confidence, Some(similarity))
            }
            None => {
                // Full-path score with the embedding term at zero, then discounted
                let base = if candidate.exact {
                    config.exact_match_floor
                } else {
                    config.string_weight * candidate.confidence
                };
                (base * config.degraded_factor, None)
            }
        };

        scored.push(Scored {
            owner: candidate.owner,
            entry: candidate.entry,
            confidence,
            signals: SignalScores {
                string: Some(candidate.confidence),
                embedding: embedding_similarity,
                exact: candidate.exact,
                degraded,
            },
        });
    }

    if let Some(scores) = embedding {
        let matched: BTreeSet<usize> = string.iter().map(|c| owner_rank(c.owner)).collect();
        for candidate in scores.nearest() {
            if matched.contains(&owner_rank(candidate.owner)) {
                continue;
            }
            scored.push(Scored {
                owner: candidate.owner,
                entry: candidate.entry,
                confidence: candidate.similarity * config.embedding_only_scale,
                signals: SignalScores {
                    string: None,
                    embedding: Some(candidate.similarity),
                    exact: false,
                    degraded: false,
                },
            });
        }
    }

    let best = scored.into_iter().min_by_key(|s| {
        let script_match = snapshot
            .name(s.entry)
            .map(|n| n.script == span.script)
            .unwrap_or(false);
        (
            Reverse(quantize(s.confidence)),
            !script_match,
            matches!(s.owner, NameOwner::Recipe(_)),
            owner_id(snapshot, s.owner),
        )
    });

    match best {
        Some(best) if best.confidence >= config.resolution_floor => MergeOutcome {
            owner: Some(best.owner),
            entry: Some(best.entry),
            confidence: best.confidence.clamp(0.0, 1.0),
            signals: best.signals,
        },
        _ => MergeOutcome::unresolved(degraded),
    }
}

/// Stable key distinguishing ingredient and recipe positions
fn owner_rank(owner: NameOwner) -> usize {
    match owner {
        NameOwner::Ingredient(i) => i * 2,
        NameOwner::Recipe(i) => i * 2 + 1,
    }
}

fn owner_id(snapshot: &KnowledgeSnapshot, owner: NameOwner) -> String {
    match owner {
        NameOwner::Ingredient(i) => snapshot
            .ingredient_at(i)
            .map(|r| r.id.to_string())
            .unwrap_or_default(),
        NameOwner::Recipe(i) => snapshot
            .recipe_at(i)
            .map(|r| r.id.to_string())
            .unwrap_or_default(),
    }
}

fn quantize(confidence: f32) -> i64 {
    (confidence * 1_000_000.0).round() as i64
}
