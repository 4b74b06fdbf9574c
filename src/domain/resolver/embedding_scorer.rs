//! Semantic similarity signal from the knowledge index

use std::collections::HashMap;

use crate::domain::index::{KnowledgeSnapshot, NameOwner};

/// Best embedding match of a span against one record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddingCandidate {
    pub owner: NameOwner,
    pub entry: usize,
    /// Cosine similarity clamped to [0, 1]
    pub similarity: f32,
}

/// Embedding similarity of a span to every record
#[derive(Debug, Clone, Default)]
pub struct EmbeddingScores {
    by_owner: HashMap<NameOwner, EmbeddingCandidate>,
    ranked: Vec<EmbeddingCandidate>,
}

impl EmbeddingScores {
    /// Similarity of the span to the record, if it has any embedded name
    pub fn similarity(&self, owner: NameOwner) -> Option<f32> {
        self.by_owner.get(&owner).map(|c| c.similarity)
    }

    /// Nearest records (bounded), by descending similarity
    pub fn nearest(&self) -> &[EmbeddingCandidate] {
        &self.ranked
    }

    /// Same scores restricted to ingredient records
    pub fn without_recipes(&self) -> Self {
        let is_ingredient = |c: &EmbeddingCandidate| matches!(c.owner, NameOwner::Ingredient(_));

        Self {
            by_owner: self
                .by_owner
                .iter()
                .filter(|(_, c)| is_ingredient(c))
                .map(|(owner, c)| (*owner, *c))
                .collect(),
            ranked: self.ranked.iter().copied().filter(is_ingredient).collect(),
        }
    }
}

/// Nearest-name scorer over the snapshot's name vectors
#[derive(Debug, Clone)]
pub struct EmbeddingScorer {
    neighbor_k: usize,
}

impl EmbeddingScorer {
    pub fn new(neighbor_k: usize) -> Self {
        Self {
            neighbor_k: neighbor_k.max(1),
        }
    }

    /// Score the span vector against every name; keeps the best name per
    /// record and the `neighbor_k` nearest records
    pub fn score(&self, vector: &[f32], snapshot: &KnowledgeSnapshot) -> EmbeddingScores {
        let hits = snapshot.nearest_names(vector, snapshot.names().len());

        let mut by_owner: HashMap<NameOwner, EmbeddingCandidate> = HashMap::new();
        let mut ranked = Vec::new();

        // Hits arrive best first, so the first hit per owner is its best
        for hit in hits {
            let Some(name) = snapshot.name(hit.entry) else {
                continue;
            };
            if by_owner.contains_key(&name.owner) {
                continue;
            }

            let candidate = EmbeddingCandidate {
                owner: name.owner,
                entry: hit.entry,
                similarity: hit.similarity.clamp(0.0, 1.0),
            };
            by_owner.insert(name.owner, candidate);
            if ranked.len() < self.neighbor_k {
                ranked.push(candidate);
            }
        }

        EmbeddingScores { by_owner, ranked }
    }
}
