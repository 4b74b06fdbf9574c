//! Immutable knowledge index snapshot

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::lexicon::Lexicon;
use crate::domain::embedding::{cosine_similarity, mean_vector};
use crate::domain::ingredient::{GlutenStatus, IngredientRecord, RecipeRecord, RecordId};
use crate::domain::script::{edit_distance, match_key, Language, ScriptTag};

/// Similarities closer than this are treated as ties
const SIMILARITY_RESOLUTION: f32 = 1e-6;

/// Record a searchable name belongs to (position in the snapshot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameOwner {
    Ingredient(usize),
    Recipe(usize),
}

/// A display name or alias with its folded key and embedding
#[derive(Debug, Clone)]
pub struct NameEntry {
    pub owner: NameOwner,
    pub surface: String,
    pub key: String,
    /// Language tag of the name; `None` for aliases
    pub language: Option<Language>,
    /// Script the name is written in
    pub script: ScriptTag,
    pub vector: Vec<f32>,
}

impl NameEntry {
    pub fn new(
        owner: NameOwner,
        surface: impl Into<String>,
        language: Option<Language>,
        vector: Vec<f32>,
    ) -> Self {
        let surface = surface.into();
        let key = match_key(&surface);
        let script = language
            .map(|l| l.script())
            .unwrap_or_else(|| script_of(&surface));

        Self {
            owner,
            surface,
            key,
            language,
            script,
            vector,
        }
    }
}

/// Dominant letter script of a text (Latin when no letters)
pub fn script_of(text: &str) -> ScriptTag {
    let (arabic, latin) = text.chars().map(ScriptTag::of).fold((0, 0), |(a, l), tag| match tag {
        ScriptTag::Arabic => (a + 1, l),
        ScriptTag::Latin => (a, l + 1),
        _ => (a, l),
    });
    if arabic > latin {
        ScriptTag::Arabic
    } else {
        ScriptTag::Latin
    }
}

/// Nearest-neighbour query over ingredient vectors
#[derive(Debug, Clone)]
pub struct NeighborQuery {
    vector: Vec<f32>,
    top_k: usize,
    status: Option<GlutenStatus>,
    exclude: Vec<RecordId>,
    probe: Option<String>,
}

impl NeighborQuery {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            top_k: 10,
            status: None,
            exclude: Vec::new(),
            probe: None,
        }
    }

    /// Bound the result count (minimum 1)
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Only return records with this gluten status
    pub fn with_status(mut self, status: GlutenStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn excluding(mut self, id: RecordId) -> Self {
        self.exclude.push(id);
        self
    }

    /// Text used to break similarity ties by lexical proximity
    pub fn with_probe(mut self, probe: impl AsRef<str>) -> Self {
        self.probe = Some(match_key(probe.as_ref()));
        self
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// Ingredient returned by a nearest-neighbour query
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub record: Arc<IngredientRecord>,
    pub similarity: f32,
}

/// Name entry returned by a name-level nearest-neighbour query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameHit {
    pub entry: usize,
    pub similarity: f32,
}

/// Read-only view of one loaded knowledge base.
///
/// Built once, never mutated; readers share it through an `Arc` and keep
/// using it after a newer snapshot has been swapped in.
#[derive(Debug)]
pub struct KnowledgeSnapshot {
    version: u64,
    built_at: DateTime<Utc>,
    ingredients: Vec<Arc<IngredientRecord>>,
    ingredient_index: HashMap<RecordId, usize>,
    recipes: Vec<Arc<RecipeRecord>>,
    recipe_index: HashMap<RecordId, usize>,
    names: Vec<NameEntry>,
    /// Per ingredient: normalized mean of its name vectors
    record_vectors: Vec<Vec<f32>>,
    lexicon: Lexicon,
}

impl KnowledgeSnapshot {
    /// Assemble a snapshot from validated records and embedded names
    pub fn new(
        version: u64,
        ingredients: Vec<IngredientRecord>,
        recipes: Vec<RecipeRecord>,
        names: Vec<NameEntry>,
    ) -> Self {
        let ingredients: Vec<Arc<IngredientRecord>> = ingredients.into_iter().map(Arc::new).collect();
        let recipes: Vec<Arc<RecipeRecord>> = recipes.into_iter().map(Arc::new).collect();

        let ingredient_index = ingredients
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        let recipe_index = recipes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        let mut lexicon = Lexicon::new();
        for (i, entry) in names.iter().enumerate() {
            lexicon.insert(&entry.key, i);
        }

        let record_vectors = (0..ingredients.len())
            .map(|i| {
                mean_vector(
                    names
                        .iter()
                        .filter(|n| n.owner == NameOwner::Ingredient(i))
                        .map(|n| n.vector.as_slice()),
                )
                .unwrap_or_default()
            })
            .collect();

        Self {
            version,
            built_at: Utc::now(),
            ingredients,
            ingredient_index,
            recipes,
            recipe_index,
            names,
            record_vectors,
            lexicon,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of ingredient records
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    /// Exact lookup by identifier
    pub fn get(&self, id: &RecordId) -> Option<Arc<IngredientRecord>> {
        self.ingredient_index
            .get(id)
            .map(|&i| Arc::clone(&self.ingredients[i]))
    }

    pub fn get_recipe(&self, id: &RecordId) -> Option<Arc<RecipeRecord>> {
        self.recipe_index
            .get(id)
            .map(|&i| Arc::clone(&self.recipes[i]))
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &Arc<IngredientRecord>> {
        self.ingredients.iter()
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Arc<RecipeRecord>> {
        self.recipes.iter()
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn names(&self) -> &[NameEntry] {
        &self.names
    }

    pub fn name(&self, entry: usize) -> Option<&NameEntry> {
        self.names.get(entry)
    }

    pub fn ingredient_at(&self, position: usize) -> Option<Arc<IngredientRecord>> {
        self.ingredients.get(position).cloned()
    }

    pub fn recipe_at(&self, position: usize) -> Option<Arc<RecipeRecord>> {
        self.recipes.get(position).cloned()
    }

    /// Aggregate vector of an ingredient
    pub fn record_vector(&self, id: &RecordId) -> Option<&[f32]> {
        self.ingredient_index
            .get(id)
            .map(|&i| self.record_vectors[i].as_slice())
            .filter(|v| !v.is_empty())
    }

    /// Ingredients closest to the query vector, by descending cosine
    /// similarity. Ties are broken by lexical proximity of the display
    /// names to the probe text, then by identifier.
    pub fn nearest(&self, query: &NeighborQuery) -> Vec<Neighbor> {
        let mut scored: Vec<(i64, usize, usize, f32)> = self
            .ingredients
            .iter()
            .enumerate()
            .filter(|(_, r)| query.status.is_none_or(|s| r.gluten_status == s))
            .filter(|(_, r)| !query.exclude.contains(&r.id))
            .map(|(i, _)| {
                let similarity = cosine_similarity(query.vector(), &self.record_vectors[i]);
                let lexical = query
                    .probe
                    .as_deref()
                    .map(|probe| self.lexical_distance(i, probe))
                    .unwrap_or(0);
                (quantize(similarity), lexical, i, similarity)
            })
            .collect();

        scored.sort_by(|a, b| {
            (Reverse(a.0), a.1, &self.ingredients[a.2].id)
                .cmp(&(Reverse(b.0), b.1, &self.ingredients[b.2].id))
        });

        scored
            .into_iter()
            .take(query.top_k)
            .map(|(_, _, i, similarity)| Neighbor {
                record: Arc::clone(&self.ingredients[i]),
                similarity,
            })
            .collect()
    }

    /// Individual names closest to the query vector (ingredients and recipes)
    pub fn nearest_names(&self, vector: &[f32], top_k: usize) -> Vec<NameHit> {
        let mut hits: Vec<(i64, NameHit)> = self
            .names
            .iter()
            .enumerate()
            .map(|(entry, name)| {
                let similarity = cosine_similarity(vector, &name.vector);
                (quantize(similarity), NameHit { entry, similarity })
            })
            .collect();

        hits.sort_by(|a, b| (Reverse(a.0), a.1.entry).cmp(&(Reverse(b.0), b.1.entry)));
        hits.into_iter().take(top_k).map(|(_, hit)| hit).collect()
    }

    fn lexical_distance(&self, position: usize, probe: &str) -> usize {
        self.names
            .iter()
            .filter(|n| n.owner == NameOwner::Ingredient(position))
            .map(|n| edit_distance(&n.key, probe))
            .min()
            .unwrap_or(usize::MAX)
    }
}

fn quantize(similarity: f32) -> i64 {
    (similarity / SIMILARITY_RESOLUTION).round() as i64
}
