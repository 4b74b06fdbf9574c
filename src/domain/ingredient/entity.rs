//! Ingredient and recipe records

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::{validate_record_id, KnowledgeBaseValidationError};
use crate::domain::script::{Language, Locale, ScriptTag};

/// Record identifier - lowercase alphanumeric with underscores/hyphens, max 64 characters.
/// Shared by ingredients and recipes; unique across the whole knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a new RecordId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
        let id = id.into();
        validate_record_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordId {
    type Error = KnowledgeBaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gluten status of a single ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlutenStatus {
    Contains,
    Free,
    Unknown,
}

impl fmt::Display for GlutenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "CONTAINS"),
            Self::Free => write!(f, "FREE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Canonical ingredient entry of the knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub id: RecordId,
    /// Display name per supported language
    pub names: BTreeMap<Language, String>,
    /// Transliterations and spelling variants (Arabizi, dialect forms)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub gluten_status: GlutenStatus,
    /// Citation justifying the status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Culinary role, e.g. "flour", "grain", "bread"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Region tags where the ingredient is a staple (ISO country codes)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    /// Curated gluten-free substitutes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substitutes: Vec<RecordId>,
}

impl IngredientRecord {
    pub fn new(id: RecordId, gluten_status: GlutenStatus) -> Self {
        Self {
            id,
            names: BTreeMap::new(),
            aliases: Vec::new(),
            gluten_status,
            evidence: None,
            category: None,
            regions: Vec::new(),
            substitutes: Vec::new(),
        }
    }

    pub fn with_name(mut self, language: Language, name: impl Into<String>) -> Self {
        self.names.insert(language, name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.regions.push(region.into());
        self
    }

    pub fn with_substitute(mut self, substitute: RecordId) -> Self {
        self.substitutes.push(substitute);
        self
    }

    /// Display name in the given language, following its fallback chain
    pub fn display_name(&self, language: Language) -> &str {
        display_name(&self.names, language, self.id.as_str())
    }

    /// Display name in the locale's script; Arabizi prefers Latin aliases
    pub fn localized_name(&self, locale: Locale) -> &str {
        localized_name(&self.names, &self.aliases, locale, self.id.as_str())
    }

    /// Whether the ingredient is a staple of the region (case-insensitive)
    pub fn is_staple_of(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r.eq_ignore_ascii_case(region))
    }

    /// Every searchable surface form with the language it belongs to.
    /// Aliases carry no language.
    pub fn surface_forms(&self) -> impl Iterator<Item = (&str, Option<Language>)> {
        self.names
            .iter()
            .map(|(lang, name)| (name.as_str(), Some(*lang)))
            .chain(self.aliases.iter().map(|a| (a.as_str(), None)))
    }
}

/// Recipe or packaged product: an ordered list of raw ingredient mentions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub id: RecordId,
    pub names: BTreeMap<Language, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Unresolved mentions in recipe order
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Source of the ingredient list, e.g. a product's brand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl RecipeRecord {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            names: BTreeMap::new(),
            aliases: Vec::new(),
            ingredients: Vec::new(),
            region: None,
            evidence: None,
        }
    }

    pub fn with_name(mut self, language: Language, name: impl Into<String>) -> Self {
        self.names.insert(language, name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_ingredient(mut self, mention: impl Into<String>) -> Self {
        self.ingredients.push(mention.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn display_name(&self, language: Language) -> &str {
        display_name(&self.names, language, self.id.as_str())
    }

    pub fn localized_name(&self, locale: Locale) -> &str {
        localized_name(&self.names, &self.aliases, locale, self.id.as_str())
    }

    pub fn surface_forms(&self) -> impl Iterator<Item = (&str, Option<Language>)> {
        self.names
            .iter()
            .map(|(lang, name)| (name.as_str(), Some(*lang)))
            .chain(self.aliases.iter().map(|a| (a.as_str(), None)))
    }
}

fn display_name<'a>(
    names: &'a BTreeMap<Language, String>,
    language: Language,
    fallback: &'a str,
) -> &'a str {
    language
        .fallback_chain()
        .iter()
        .find_map(|lang| names.get(lang).filter(|n| !n.trim().is_empty()))
        .map(String::as_str)
        .unwrap_or(fallback)
}

/// Name for a locale whose script differs from its language's native one:
/// the first alias in that script, then a name in that script along the
/// fallback chain, then the plain display name.
fn localized_name<'a>(
    names: &'a BTreeMap<Language, String>,
    aliases: &'a [String],
    locale: Locale,
    fallback: &'a str,
) -> &'a str {
    if locale.is_native() {
        return display_name(names, locale.language, fallback);
    }

    aliases
        .iter()
        .map(String::as_str)
        .find(|alias| written_in(alias, locale.script))
        .or_else(|| {
            locale
                .language
                .fallback_chain()
                .iter()
                .filter_map(|lang| names.get(lang))
                .map(String::as_str)
                .find(|name| written_in(name, locale.script))
        })
        .unwrap_or_else(|| display_name(names, locale.language, fallback))
}

/// Whether the text has letters and all of them are in `script`
fn written_in(text: &str, script: ScriptTag) -> bool {
    let mut letters = text
        .chars()
        .map(ScriptTag::of)
        .filter(ScriptTag::is_letter)
        .peekable();
    letters.peek().is_some() && letters.all(|tag| tag == script)
}

/// On-disk knowledge base layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseFile {
    #[serde(default)]
    pub ingredients: Vec<IngredientRecord>,
    #[serde(default)]
    pub recipes: Vec<RecipeRecord>,
}

impl KnowledgeBaseFile {
    pub fn new(ingredients: Vec<IngredientRecord>, recipes: Vec<RecipeRecord>) -> Self {
        Self {
            ingredients,
            recipes,
        }
    }

    pub fn len(&self) -> usize {
        self.ingredients.len() + self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.recipes.is_empty()
    }
}
