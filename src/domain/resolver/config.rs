//! Ingredient resolver configuration

use serde::{Deserialize, Serialize};

/// Tunables for mention resolution and the classification threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum confidence for a mention's status to count (0.0 - 1.0)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Merged confidence below which a mention stays unresolved
    #[serde(default = "default_resolution_floor")]
    pub resolution_floor: f32,
    /// Weight of the string-match signal when both signals agree
    #[serde(default = "default_string_weight")]
    pub string_weight: f32,
    /// Weight of the embedding signal when both signals agree
    #[serde(default = "default_embedding_weight")]
    pub embedding_weight: f32,
    /// Scale applied to a candidate found by embedding similarity alone
    #[serde(default = "default_embedding_only_scale")]
    pub embedding_only_scale: f32,
    /// Lower bound of the merged confidence for an exact name match
    #[serde(default = "default_exact_match_floor")]
    pub exact_match_floor: f32,
    /// Scale applied to string-only confidence when embeddings are unavailable
    #[serde(default = "default_degraded_factor")]
    pub degraded_factor: f32,
    /// Allowed edit distance as a fraction of the span length
    #[serde(default = "default_max_edit_ratio")]
    pub max_edit_ratio: f32,
    /// Nearest names considered from the embedding signal
    #[serde(default = "default_neighbor_k")]
    pub neighbor_k: usize,
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_resolution_floor() -> f32 {
    0.3
}

fn default_string_weight() -> f32 {
    0.65
}

fn default_embedding_weight() -> f32 {
    0.35
}

fn default_embedding_only_scale() -> f32 {
    0.6
}

fn default_exact_match_floor() -> f32 {
    0.95
}

fn default_degraded_factor() -> f32 {
    0.85
}

fn default_max_edit_ratio() -> f32 {
    0.34
}

fn default_neighbor_k() -> usize {
    5
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            resolution_floor: default_resolution_floor(),
            string_weight: default_string_weight(),
            embedding_weight: default_embedding_weight(),
            embedding_only_scale: default_embedding_only_scale(),
            exact_match_floor: default_exact_match_floor(),
            degraded_factor: default_degraded_factor(),
            max_edit_ratio: default_max_edit_ratio(),
            neighbor_k: default_neighbor_k(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the classification threshold
    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_resolution_floor(mut self, floor: f32) -> Self {
        self.resolution_floor = floor.clamp(0.0, 1.0);
        self
    }

    /// Set the signal weights; they are rescaled to sum to 1 with the
    /// string signal never weighted below the embedding signal
    pub fn with_weights(mut self, string_weight: f32, embedding_weight: f32) -> Self {
        let string_weight = string_weight.max(0.0);
        let embedding_weight = embedding_weight.max(0.0).min(string_weight);
        let total = string_weight + embedding_weight;
        if total > 0.0 {
            self.string_weight = string_weight / total;
            self.embedding_weight = embedding_weight / total;
        }
        self
    }

    pub fn with_embedding_only_scale(mut self, scale: f32) -> Self {
        self.embedding_only_scale = scale.clamp(0.0, 1.0);
        self
    }

    pub fn with_exact_match_floor(mut self, floor: f32) -> Self {
        self.exact_match_floor = floor.clamp(0.0, 1.0);
        self
    }

    pub fn with_degraded_factor(mut self, factor: f32) -> Self {
        self.degraded_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_edit_ratio(mut self, ratio: f32) -> Self {
        self.max_edit_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_neighbor_k(mut self, k: usize) -> Self {
        self.neighbor_k = k.max(1);
        self
    }

    /// Check cross-field consistency of values loaded from configuration
    pub fn validate(&self) -> Result<(), String> {
        let unit = [
            ("min_confidence", self.min_confidence),
            ("resolution_floor", self.resolution_floor),
            ("string_weight", self.string_weight),
            ("embedding_weight", self.embedding_weight),
            ("embedding_only_scale", self.embedding_only_scale),
            ("exact_match_floor", self.exact_match_floor),
            ("degraded_factor", self.degraded_factor),
            ("max_edit_ratio", self.max_edit_ratio),
        ];
        if let Some((name, value)) = unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(format!("{} must be between 0.0 and 1.0, got {}", name, value));
        }

        if self.string_weight < self.embedding_weight {
            return Err("string_weight must not be lower than embedding_weight".to_string());
        }

        if self.neighbor_k == 0 {
            return Err("neighbor_k must be at least 1".to_string());
        }

        Ok(())
    }
}
