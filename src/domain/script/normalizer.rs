//! Script normalizer
//!
//! Produces a logical-order normalized text with one script tag per
//! character, plus a display rendering (reshaped, visually reordered) with
//! its own parallel tags. Each pass builds fresh buffers; nothing is mutated
//! in place across passes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::bidi::{self, mirror};
use super::reshape::{self, is_presentation_form, unshape};
use super::tag::{BidiClass, Direction, ScriptTag, is_arabic_mark};

/// Normalized query text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedText {
    /// Logical-order text: controls removed, presentation forms unshaped,
    /// diacritics/tatweel dropped, whitespace collapsed
    pub text: String,
    /// One tag per character of `text`
    pub tags: Vec<ScriptTag>,
    /// Display-order text with contextual Arabic letterforms
    pub display: String,
    /// One tag per character of `display`
    pub display_tags: Vec<ScriptTag>,
    /// Paragraph direction (first strong character)
    pub base_direction: Direction,
    /// Majority direction of strong characters
    pub dominant_direction: Direction,
    /// True when the input needed repair (invalid encoding or unterminated
    /// directional controls)
    pub repaired: bool,
}

impl NormalizedText {
    /// Number of characters in the logical text
    pub fn char_len(&self) -> usize {
        self.tags.len()
    }

    /// Characters `[start, end)` of the logical text
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Most frequent letter script over `[start, end)`; digits/punctuation
    /// only spans fall back to the most frequent tag overall
    pub fn dominant_script(&self, start: usize, end: usize) -> ScriptTag {
        let end = end.min(self.tags.len());
        if start >= end {
            return ScriptTag::Other;
        }

        let window = &self.tags[start..end];
        let arabic = window.iter().filter(|t| **t == ScriptTag::Arabic).count();
        let latin = window.iter().filter(|t| **t == ScriptTag::Latin).count();

        match (arabic, latin) {
            (0, 0) => window
                .iter()
                .copied()
                .find(|t| *t != ScriptTag::Whitespace)
                .unwrap_or(ScriptTag::Whitespace),
            (a, l) if a >= l => ScriptTag::Arabic,
            _ => ScriptTag::Latin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Canonicalizes mixed Arabic/Latin text
#[derive(Debug, Clone, Default)]
pub struct ScriptNormalizer;

impl ScriptNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize raw bytes, repairing invalid UTF-8 instead of failing
    pub fn normalize_bytes(&self, raw: &[u8]) -> NormalizedText {
        match std::str::from_utf8(raw) {
            Ok(text) => self.normalize(text),
            Err(e) => {
                debug!(valid_up_to = e.valid_up_to(), "Repairing invalid UTF-8 input");
                let lossy = String::from_utf8_lossy(raw);
                let mut normalized = self.normalize(&lossy);
                normalized.repaired = true;
                normalized
            }
        }
    }

    /// Normalize text; never fails
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let sanitized = sanitize(raw);

        // Logical text excludes explicit directional controls
        let text: String = sanitized
            .iter()
            .filter(|c| !BidiClass::of(**c).is_explicit_control())
            .collect();
        let tags: Vec<ScriptTag> = text.chars().map(ScriptTag::of).collect();

        // Display: shape in logical order, then reorder visually
        let shaped = reshape::reshape(&sanitized);
        let shaped_chars: Vec<char> = shaped.iter().map(|(c, _)| *c).collect();
        let order = bidi::reorder(&shaped_chars);

        let mut display = String::with_capacity(text.len());
        let mut display_tags = Vec::with_capacity(order.visual.len());
        for &i in &order.visual {
            let c = shaped_chars[i];
            let c = if order.levels[i] % 2 == 1 { mirror(c) } else { c };
            display.push(c);
            display_tags.push(ScriptTag::of(c));
        }

        if order.repaired {
            debug!("Repaired unterminated directional controls");
        }

        NormalizedText {
            text,
            tags,
            display,
            display_tags,
            base_direction: order.base_direction,
            dominant_direction: order.dominant_direction,
            repaired: order.repaired || raw.contains('\u{FFFD}'),
        }
    }

    /// Render arbitrary (already composed) text for a terminal that does not
    /// shape or reorder Arabic itself
    pub fn render_for_display(&self, text: &str) -> String {
        text.lines()
            .map(|line| self.normalize(line).display)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Canonical logical characters: presentation forms unshaped, diacritics,
/// tatweel, replacement and stray control characters dropped, whitespace
/// runs collapsed and trimmed. Directional controls are kept for the bidi
/// pass.
fn sanitize(raw: &str) -> Vec<char> {
    let mut unshaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if is_presentation_form(c) {
            unshape(c, &mut unshaped);
        } else {
            unshaped.push(c);
        }
    }

    let mut out: Vec<char> = Vec::with_capacity(unshaped.len());
    for c in unshaped.chars() {
        if is_arabic_mark(c) || c == '\u{0640}' || c == '\u{FFFD}' || c == '\u{FEFF}' {
            continue;
        }
        if BidiClass::of(c).is_explicit_control() {
            out.push(c);
            continue;
        }

        let c = match c {
            '\r' => continue,
            '\n' => '\n',
            c if c.is_whitespace() => ' ',
            c if c.is_control() || c == '\u{200B}' || c == '\u{200C}' || c == '\u{200D}' => {
                continue;
            }
            c => c,
        };

        let prev_visible = out
            .iter()
            .rev()
            .find(|p| !BidiClass::of(**p).is_explicit_control())
            .copied();

        match (c, prev_visible) {
            (' ', None) | (' ', Some(' ')) | (' ', Some('\n')) => continue,
            ('\n', Some(' ')) => {
                if let Some(pos) = out.iter().rposition(|p| *p == ' ') {
                    out.remove(pos);
                }
                out.push('\n');
            }
            _ => out.push(c),
        }
    }

    while let Some(pos) = out
        .iter()
        .rposition(|p| !BidiClass::of(*p).is_explicit_control())
    {
        if out[pos] == ' ' || out[pos] == '\n' {
            out.remove(pos);
        } else {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_parallel_to_text() {
        let normalized = ScriptNormalizer::new().normalize("خبز with قمح 100g");

        assert_eq!(normalized.text.chars().count(), normalized.tags.len());
        assert_eq!(normalized.display.chars().count(), normalized.display_tags.len());
        assert_eq!(normalized.tags[0], ScriptTag::Arabic);
        assert_eq!(normalized.tags[4], ScriptTag::Latin);
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        let normalized = ScriptNormalizer::new().normalize("  rice \t\t flour  ");
        assert_eq!(normalized.text, "rice flour");
    }

    #[test]
    fn test_diacritics_and_tatweel_removed() {
        let normalized = ScriptNormalizer::new().normalize("قَمْـح");
        assert_eq!(normalized.text, "قمح");
    }

    #[test]
    fn test_presentation_forms_are_canonicalized() {
        let normalized = ScriptNormalizer::new().normalize("\u{FED7}\u{FEE4}\u{FEA2}");
        assert_eq!(normalized.text, "قمح");
    }

    #[test]
    fn test_display_is_shaped_and_reordered() {
        let normalized = ScriptNormalizer::new().normalize("قمح");

        // Visual order puts the final hah first
        assert_eq!(normalized.display, "\u{FEA2}\u{FEE4}\u{FED7}");
        assert_eq!(normalized.base_direction, Direction::Rtl);
    }

    #[test]
    fn test_unterminated_control_is_repaired() {
        let normalized = ScriptNormalizer::new().normalize("pain \u{202E}خبز");

        assert!(normalized.repaired);
        assert_eq!(normalized.text, "pain خبز");
    }

    #[test]
    fn test_invalid_utf8_is_repaired() {
        let normalized = ScriptNormalizer::new().normalize_bytes(b"rice \xFF flour");

        assert!(normalized.repaired);
        assert_eq!(normalized.text, "rice flour");
    }

    #[test]
    fn test_dominant_script_of_range() {
        let normalized = ScriptNormalizer::new().normalize("blé قمح");

        assert_eq!(normalized.dominant_script(0, 3), ScriptTag::Latin);
        assert_eq!(normalized.dominant_script(4, 7), ScriptTag::Arabic);
        assert_eq!(normalized.slice(4, 7), "قمح");
    }

    #[test]
    fn test_empty_input() {
        let normalized = ScriptNormalizer::new().normalize("   ");

        assert!(normalized.is_empty());
        assert!(normalized.display.is_empty());
    }

    #[test]
    fn test_render_for_display_handles_lines() {
        let rendered = ScriptNormalizer::new().render_for_display("wheat\nrice");
        assert_eq!(rendered, "wheat\nrice");
    }
}
