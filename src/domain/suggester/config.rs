//! Alternative suggester configuration

use serde::{Deserialize, Serialize};

/// Ranking tunables for substitute suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggesterConfig {
    /// Suggestions returned per gluten-containing ingredient
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Similarity a non-curated candidate must reach
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
    /// Added when the candidate is a staple of the query region
    #[serde(default = "default_regional_bonus")]
    pub regional_bonus: f32,
    /// Added when the candidate is a curated substitute of the source
    #[serde(default = "default_curated_bonus")]
    pub curated_bonus: f32,
    /// Added when the candidate shares the source's culinary category
    #[serde(default = "default_category_bonus")]
    pub category_bonus: f32,
    /// Nearest FREE neighbours fetched per source
    #[serde(default = "default_neighbor_k")]
    pub neighbor_k: usize,
}

fn default_top_n() -> usize {
    3
}

fn default_min_similarity() -> f32 {
    0.2
}

fn default_regional_bonus() -> f32 {
    0.15
}

fn default_curated_bonus() -> f32 {
    0.2
}

fn default_category_bonus() -> f32 {
    0.1
}

fn default_neighbor_k() -> usize {
    10
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            min_similarity: default_min_similarity(),
            regional_bonus: default_regional_bonus(),
            curated_bonus: default_curated_bonus(),
            category_bonus: default_category_bonus(),
            neighbor_k: default_neighbor_k(),
        }
    }
}

impl SuggesterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_min_similarity(mut self, floor: f32) -> Self {
        self.min_similarity = floor.clamp(0.0, 1.0);
        self
    }

    pub fn with_regional_bonus(mut self, bonus: f32) -> Self {
        self.regional_bonus = bonus.clamp(0.0, 1.0);
        self
    }

    pub fn with_curated_bonus(mut self, bonus: f32) -> Self {
        self.curated_bonus = bonus.clamp(0.0, 1.0);
        self
    }

    pub fn with_category_bonus(mut self, bonus: f32) -> Self {
        self.category_bonus = bonus.clamp(0.0, 1.0);
        self
    }

    pub fn with_neighbor_k(mut self, k: usize) -> Self {
        self.neighbor_k = k.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.top_n == 0 {
            return Err("top_n must be at least 1".to_string());
        }
        if self.neighbor_k == 0 {
            return Err("neighbor_k must be at least 1".to_string());
        }

        let unit = [
            ("min_similarity", self.min_similarity),
            ("regional_bonus", self.regional_bonus),
            ("curated_bonus", self.curated_bonus),
            ("category_bonus", self.category_bonus),
        ];
        match unit.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            Some((name, value)) => Err(format!("{} must be between 0.0 and 1.0, got {}", name, value)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SuggesterConfig::default();

        assert_eq!(config.top_n, 3);
        assert_eq!(config.regional_bonus, 0.15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps() {
        let config = SuggesterConfig::new().with_top_n(0).with_min_similarity(2.0);

        assert_eq!(config.top_n, 1);
        assert_eq!(config.min_similarity, 1.0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SuggesterConfig = serde_json::from_str(r#"{"top_n": 5}"#).unwrap();

        assert_eq!(config.top_n, 5);
        assert_eq!(config.neighbor_k, 10);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = SuggesterConfig {
            curated_bonus: 1.5,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("curated_bonus"));
    }
}
