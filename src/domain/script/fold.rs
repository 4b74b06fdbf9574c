//! Orthographic folding used to build comparable match keys
//!
//! Display names and query spans are compared on folded keys: presentation
//! forms are unshaped, diacritics and tatweel removed, hamza-carrying and
//! final-form letters unified, Latin lowercased and stripped of accents,
//! and the Arabic definite article and French elisions dropped per word.

use super::reshape::{is_presentation_form, unshape};
use super::tag::is_arabic_mark;

const ARTICLE: &str = "ال";

/// Fold a single character into the buffer
pub fn fold_char(c: char, out: &mut String) {
    if is_presentation_form(c) {
        let mut base = String::new();
        unshape(c, &mut base);
        for b in base.chars() {
            fold_char(b, out);
        }
        return;
    }

    if is_arabic_mark(c) || c == '\u{0640}' {
        return;
    }

    match c {
        'أ' | 'إ' | 'آ' | 'ٱ' => out.push('ا'),
        'ى' | 'ئ' | 'ی' => out.push('ي'),
        'ة' => out.push('ه'),
        'ؤ' => out.push('و'),
        'ک' => out.push('ك'),
        '\u{0660}'..='\u{0669}' => out.push(char::from(b'0' + (c as u32 - 0x0660) as u8)),
        '\u{06F0}'..='\u{06F9}' => out.push(char::from(b'0' + (c as u32 - 0x06F0) as u8)),
        'à' | 'â' | 'ä' | 'á' | 'À' | 'Â' | 'Ä' | 'Á' => out.push('a'),
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => out.push('e'),
        'î' | 'ï' | 'í' | 'Î' | 'Ï' | 'Í' => out.push('i'),
        'ô' | 'ö' | 'ó' | 'Ô' | 'Ö' | 'Ó' => out.push('o'),
        'ù' | 'û' | 'ü' | 'ú' | 'Ù' | 'Û' | 'Ü' | 'Ú' => out.push('u'),
        'ç' | 'Ç' => out.push('c'),
        'ñ' | 'Ñ' => out.push('n'),
        'œ' | 'Œ' => out.push_str("oe"),
        'æ' | 'Æ' => out.push_str("ae"),
        '’' | '‘' | '`' => out.push('\''),
        _ => {
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        }
    }
}

/// Fold a single word and drop articles/elisions
pub fn fold_word(word: &str) -> String {
    let mut folded = String::with_capacity(word.len());
    for c in word.chars() {
        fold_char(c, &mut folded);
    }

    for elision in ["l'", "d'", "qu'"] {
        if let Some(rest) = folded.strip_prefix(elision) {
            if !rest.is_empty() {
                folded = rest.to_string();
                break;
            }
        }
    }

    strip_article(&folded).to_string()
}

/// Strip the Arabic definite article when enough of the word remains
pub fn strip_article(word: &str) -> &str {
    match word.strip_prefix(ARTICLE) {
        Some(rest) if rest.chars().count() >= 2 => rest,
        _ => word,
    }
}

/// Build the comparable key for a multi-word text
pub fn match_key(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|w| !w.is_empty())
        .map(fold_word)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_is_stripped() {
        assert_eq!(match_key("القمح"), "قمح");
        assert_eq!(match_key("ال"), "ال");
    }

    #[test]
    fn test_hamza_and_teh_marbuta_folding() {
        assert_eq!(match_key("أرز"), "ارز");
        assert_eq!(match_key("سلطة"), "سلطه");
    }

    #[test]
    fn test_diacritics_and_tatweel_removed() {
        assert_eq!(match_key("قَمْح"), "قمح");
        assert_eq!(match_key("قـمـح"), "قمح");
    }

    #[test]
    fn test_presentation_forms_unshaped() {
        assert_eq!(match_key("\u{FED7}\u{FEE4}\u{FEA2}"), "قمح");
    }

    #[test]
    fn test_latin_accents_and_case() {
        assert_eq!(match_key("Farine de Blé"), "farine de ble");
        assert_eq!(match_key("l'orge"), "orge");
        assert_eq!(match_key("Œufs"), "oeufs");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(match_key("  rice   flour "), "rice flour");
    }
}
