//! Ingredient domain - canonical ingredient and recipe records

mod entity;
mod validation;

pub use entity::{GlutenStatus, IngredientRecord, KnowledgeBaseFile, RecipeRecord, RecordId};
pub use validation::{validate_knowledge_base, validate_record_id, KnowledgeBaseValidationError};
