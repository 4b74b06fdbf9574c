//! Substitution suggestion types

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ingredient::IngredientRecord;

/// Why a substitute was proposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RationaleTag {
    CuratedSubstitute,
    RegionalStaple,
    SameCulinaryRole,
    SemanticNeighbor,
}

impl fmt::Display for RationaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CuratedSubstitute => write!(f, "curated substitute"),
            Self::RegionalStaple => write!(f, "regional staple"),
            Self::SameCulinaryRole => write!(f, "same culinary role"),
            Self::SemanticNeighbor => write!(f, "semantic neighbor"),
        }
    }
}

/// A gluten-free replacement for a gluten-containing ingredient
#[derive(Debug, Clone, Serialize)]
pub struct SubstitutionSuggestion {
    pub source: Arc<IngredientRecord>,
    /// Always a FREE record
    pub target: Arc<IngredientRecord>,
    /// Cosine similarity between source and target, clamped to [0, 1]
    pub similarity: f32,
    /// Similarity plus ranking bonuses
    pub score: f32,
    /// Most specific reason first
    pub rationale: Vec<RationaleTag>,
}

impl SubstitutionSuggestion {
    /// Primary rationale
    pub fn primary_rationale(&self) -> RationaleTag {
        self.rationale
            .first()
            .copied()
            .unwrap_or(RationaleTag::SemanticNeighbor)
    }
}
