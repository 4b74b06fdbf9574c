//! Knowledge base validation utilities

use std::collections::{HashMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::entity::{GlutenStatus, IngredientRecord, RecipeRecord, RecordId};
use crate::domain::DomainError;

/// Maximum length for record IDs
pub const MAX_RECORD_ID_LENGTH: usize = 64;

static RECORD_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").unwrap());

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    /// ID is empty
    EmptyId,
    /// ID exceeds maximum length
    IdTooLong { length: usize, max: usize },
    /// ID contains invalid characters
    InvalidIdFormat { id: String },
    /// Same ID used by two records
    DuplicateId { id: String },
    /// Record has no non-empty display name in any supported language
    MissingDisplayName { id: String },
    /// Curated substitute points at an unknown ingredient
    UnknownSubstitute { id: String, substitute: String },
    /// Curated substitute is not gluten-free
    SubstituteNotGlutenFree { id: String, substitute: String },
    /// Recipe lists no ingredients, or an empty mention
    InvalidRecipe { id: String, reason: String },
    /// Nothing to load
    Empty,
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Record ID cannot be empty"),
            Self::IdTooLong { length, max } => {
                write!(f, "Record ID too long: {} characters (max {})", length, max)
            }
            Self::InvalidIdFormat { id } => {
                write!(
                    f,
                    "Invalid record ID format '{}': must be lowercase alphanumeric with underscores or hyphens",
                    id
                )
            }
            Self::DuplicateId { id } => write!(f, "Duplicate record ID '{}'", id),
            Self::MissingDisplayName { id } => {
                write!(f, "Record '{}' has no display name in any supported language", id)
            }
            Self::UnknownSubstitute { id, substitute } => {
                write!(
                    f,
                    "Ingredient '{}' lists unknown substitute '{}'",
                    id, substitute
                )
            }
            Self::SubstituteNotGlutenFree { id, substitute } => {
                write!(
                    f,
                    "Ingredient '{}' lists substitute '{}' which is not gluten-free",
                    id, substitute
                )
            }
            Self::InvalidRecipe { id, reason } => write!(f, "Invalid recipe '{}': {}", id, reason),
            Self::Empty => write!(f, "Knowledge base contains no ingredients"),
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

impl From<KnowledgeBaseValidationError> for DomainError {
    fn from(error: KnowledgeBaseValidationError) -> Self {
        DomainError::validation(error.to_string())
    }
}

/// Validate a record ID
pub fn validate_record_id(id: &str) -> Result<(), KnowledgeBaseValidationError> {
    if id.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyId);
    }

    if id.len() > MAX_RECORD_ID_LENGTH {
        return Err(KnowledgeBaseValidationError::IdTooLong {
            length: id.len(),
            max: MAX_RECORD_ID_LENGTH,
        });
    }

    if !RECORD_ID_PATTERN.is_match(id) {
        return Err(KnowledgeBaseValidationError::InvalidIdFormat { id: id.to_string() });
    }

    Ok(())
}

/// Validate a full set of records before an index is built from them.
///
/// Checks identifier uniqueness across ingredients and recipes, that every
/// record has a display name, that curated substitutes reference known
/// gluten-free ingredients and that recipes list non-empty mentions.
pub fn validate_knowledge_base(
    ingredients: &[IngredientRecord],
    recipes: &[RecipeRecord],
) -> Result<(), KnowledgeBaseValidationError> {
    if ingredients.is_empty() {
        return Err(KnowledgeBaseValidationError::Empty);
    }

    let mut seen: HashSet<&RecordId> = HashSet::new();
    let all_ids = ingredients
        .iter()
        .map(|r| &r.id)
        .chain(recipes.iter().map(|r| &r.id));
    for id in all_ids {
        if !seen.insert(id) {
            return Err(KnowledgeBaseValidationError::DuplicateId { id: id.to_string() });
        }
    }

    let statuses: HashMap<&RecordId, GlutenStatus> = ingredients
        .iter()
        .map(|r| (&r.id, r.gluten_status))
        .collect();

    for record in ingredients {
        if !has_display_name(record.names.values()) {
            return Err(KnowledgeBaseValidationError::MissingDisplayName {
                id: record.id.to_string(),
            });
        }

        for substitute in &record.substitutes {
            match statuses.get(substitute) {
                None => {
                    return Err(KnowledgeBaseValidationError::UnknownSubstitute {
                        id: record.id.to_string(),
                        substitute: substitute.to_string(),
                    });
                }
                Some(GlutenStatus::Free) => {}
                Some(_) => {
                    return Err(KnowledgeBaseValidationError::SubstituteNotGlutenFree {
                        id: record.id.to_string(),
                        substitute: substitute.to_string(),
                    });
                }
            }
        }
    }

    for recipe in recipes {
        if !has_display_name(recipe.names.values()) {
            return Err(KnowledgeBaseValidationError::MissingDisplayName {
                id: recipe.id.to_string(),
            });
        }

        if recipe.ingredients.is_empty() {
            return Err(KnowledgeBaseValidationError::InvalidRecipe {
                id: recipe.id.to_string(),
                reason: "no ingredients listed".to_string(),
            });
        }

        if recipe.ingredients.iter().any(|m| m.trim().is_empty()) {
            return Err(KnowledgeBaseValidationError::InvalidRecipe {
                id: recipe.id.to_string(),
                reason: "empty ingredient mention".to_string(),
            });
        }
    }

    Ok(())
}

fn has_display_name<'a>(mut names: impl Iterator<Item = &'a String>) -> bool {
    names.any(|name| !name.trim().is_empty())
}
