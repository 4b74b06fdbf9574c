//! Script handling domain
//!
//! Normalization of mixed Arabic/Latin input: per-character script tags,
//! orthographic folding for matching, contextual shaping and bidirectional
//! reordering for display, and query language detection.

mod bidi;
mod distance;
mod fold;
mod language;
mod normalizer;
mod reshape;
mod tag;

pub use bidi::{mirror, reorder, BidiReorder};
pub use distance::{bounded_edit_distance, edit_distance};
pub use fold::{fold_char, fold_word, match_key, strip_article};
pub use language::{detect_language, detect_locale, Language, Locale};
pub use normalizer::{NormalizedText, ScriptNormalizer};
pub use reshape::{is_presentation_form, reshape, unshape};
pub use tag::{is_arabic_digit, is_arabic_letter, is_arabic_mark, BidiClass, Direction, ScriptTag};
