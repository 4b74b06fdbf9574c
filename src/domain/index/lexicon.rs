//! Folded-key lexicon over every searchable name

use std::collections::HashMap;

/// Maps folded name keys to the name entries carrying them.
///
/// Used by the segmenter to find known multi-word names and to decide
/// whether an Arabic clitic prefix should be split off.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    keys: HashMap<String, Vec<usize>>,
    max_words: usize,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name entry under its folded key
    pub fn insert(&mut self, key: &str, entry: usize) {
        if key.is_empty() {
            return;
        }
        self.max_words = self.max_words.max(key.split(' ').count());
        let entries = self.keys.entry(key.to_string()).or_default();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Name entries registered under the key
    pub fn entries(&self, key: &str) -> &[usize] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Longest name, in words
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over all keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}
