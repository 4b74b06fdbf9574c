//! Feature-hashed character n-gram vectors
//!
//! A deterministic, model-free text embedding: the folded text is broken
//! into whole-word tokens and boundary-marked character trigrams, each hashed
//! (FNV-1a) into a signed bucket. Spelling variants that share most trigrams
//! land close together; unrelated words are near-orthogonal.

use super::response::normalize;
use crate::domain::script::match_key;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Weight of a whole-word feature relative to a trigram
const WORD_WEIGHT: f32 = 2.0;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn add_feature(vector: &mut [f32], feature: &str, weight: f32) {
    let hash = fnv1a(feature.as_bytes());
    let bucket = (hash % vector.len() as u64) as usize;
    let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
    vector[bucket] += sign * weight;
}

/// Embed text into a unit vector of the given size.
///
/// Returns a zero vector for text with no word characters.
pub fn hashed_ngram_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let dimensions = dimensions.max(1);
    let mut vector = vec![0.0f32; dimensions];
    let key = match_key(text);

    for word in key.split(' ').filter(|w| !w.is_empty()) {
        add_feature(&mut vector, word, WORD_WEIGHT);

        let marked: Vec<char> = std::iter::once('^')
            .chain(word.chars())
            .chain(std::iter::once('$'))
            .collect();
        for window in marked.windows(3) {
            let trigram: String = window.iter().collect();
            add_feature(&mut vector, &trigram, 1.0);
        }
    }

    normalize(&mut vector);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::cosine_similarity;

    #[test]
    fn test_deterministic() {
        assert_eq!(hashed_ngram_vector("wheat", 128), hashed_ngram_vector("wheat", 128));
    }

    #[test]
    fn test_folded_variants_are_identical() {
        let a = hashed_ngram_vector("القمح", 256);
        let b = hashed_ngram_vector("قمح", 256);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_spelling_variants_are_close() {
        let a = hashed_ngram_vector("couscous", 256);
        let b = hashed_ngram_vector("kuskus couscous", 256);
        let unrelated = hashed_ngram_vector("sardines", 256);

        assert!(cosine_similarity(&a, &b) > 0.4);
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let vector = hashed_ngram_vector("  ", 16);
        assert_eq!(vector.len(), 16);
        assert!(vector.iter().all(|x| *x == 0.0));
    }
}
