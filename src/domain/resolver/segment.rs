//! Mention segmentation
//!
//! Splits normalized query text into candidate ingredient mentions.
//! Separators (commas, semicolons, slashes, sentence punctuation, line
//! breaks) always end a mention. Conjunctions, prepositions and query
//! scaffolding words ("does", "واش", "est-ce que", "gluten") end a run of
//! unknown words but may still appear inside a known multi-word name such
//! as "farine de riz". Arabic proclitics (بال، وال، و، ب) are split off
//! when what remains is a word of its own.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::index::{script_of, Lexicon};
use crate::domain::ingredient::RecordId;
use crate::domain::script::{fold_word, match_key, NormalizedText, ScriptTag};

/// Punctuation that always separates mentions
const SEPARATORS: &[&str] = &[
    ",", "،", ";", "؛", "/", "+", "&", "?", "!", "؟", ".", "(", ")", "[", "]", ":", "|", "\n",
];

/// Words joining or introducing ingredients (folded)
const CONNECTORS: &[&str] = &[
    // en
    "and", "with", "or", "without", "plus",
    // fr
    "et", "avec", "ou", "sans",
    // ar / ary
    "و", "مع", "او", "ولا", "ب", "بلا", "غير", "في", "من",
    // arabizi
    "w", "wla", "m3a", "bla", "b",
];

/// Query scaffolding and function words that never name an ingredient (folded)
const STOPWORDS: &[&str] = &[
    // en
    "does", "do", "is", "are", "there", "any", "contain", "contains", "containing", "have", "has",
    "a", "an", "the", "of", "in", "it", "this", "my", "gluten", "free", "glutenfree", "what",
    "about", "can", "i", "eat", "some",
    // fr
    "est", "ce", "que", "qu", "il", "y", "a", "le", "la", "les", "un", "une", "des", "du", "de",
    "contient", "contiennent", "dans", "gluten", "sans", "mon", "ma", "puis", "je", "manger",
    "c", "quoi", "au", "aux",
    // ar
    "هل", "يحتوي", "تحتوي", "علي", "غلوتين", "جلوتين", "الغلوتين", "ما", "هذا", "هذه", "فيه",
    "فيها", "به", "بها", "يوجد", "خالي", "خال", "اكل", "يمكن", "ان",
    // ary
    "واش", "فيه", "فيها", "كاين", "كاينه", "شي", "ديال", "ديالي", "هاد", "هادا", "هادي", "نقدر",
    "ناكل", "كنقدر", "شنو", "بغيت",
    // arabizi
    "wach", "wash", "fih", "fiha", "kayn", "kayen", "chi", "dial", "dyal", "had", "chno",
    "nakol", "n9der",
    // units and quantities
    "g", "kg", "gr", "ml", "cl", "l", "cup", "cups", "tbsp", "tsp", "كيلو", "غرام", "كاس",
];

/// Proclitic + article prefixes that are always split (folded)
const ARTICLE_PROCLITICS: &[&str] = &["بال", "وال", "فال", "كال"];

/// Single-letter proclitics split only when the remainder is a known word
const PROCLITICS: &[&str] = &["لل", "و", "ب", "ف", "ل", "ك"];

/// A candidate ingredient mention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionSpan {
    /// Surface text in logical order
    pub text: String,
    /// Folded comparison key
    pub key: String,
    /// Character offsets into the normalized query text
    pub start: usize,
    pub end: usize,
    /// Dominant script of the span
    pub script: ScriptTag,
    /// Recipe this mention was expanded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecordId>,
}

impl MentionSpan {
    /// Build a span from free text (not located in a query), e.g. a recipe
    /// ingredient mention
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let key = match_key(&text);
        let script = script_of(&text);
        let end = text.chars().count();

        Self {
            text,
            key,
            start: 0,
            end,
            script,
            recipe: None,
        }
    }

    /// Place the span at a query position
    pub fn at(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn from_recipe(mut self, recipe: RecordId) -> Self {
        self.recipe = Some(recipe);
        self
    }

    pub fn word_count(&self) -> usize {
        self.key.split(' ').filter(|w| !w.is_empty()).count()
    }
}

#[derive(Debug, Clone)]
enum Token {
    Separator,
    Word(Word),
}

#[derive(Debug, Clone)]
struct Word {
    key: String,
    start: usize,
    end: usize,
    /// Connector or stopword
    weak: bool,
}

/// Splits normalized text into mention spans
#[derive(Debug, Clone, Default)]
pub struct MentionSegmenter;

impl MentionSegmenter {
    pub fn new() -> Self {
        Self
    }

    /// Segment the query into mentions, in text order
    pub fn segment(&self, text: &NormalizedText, lexicon: &Lexicon) -> Vec<MentionSpan> {
        let tokens = tokenize(&text.text, lexicon);
        let max_words = lexicon.max_words().max(1);

        let mut spans = Vec::new();
        for chunk in tokens.split(|t| matches!(t, Token::Separator)) {
            let words: Vec<&Word> = chunk
                .iter()
                .filter_map(|t| match t {
                    Token::Word(w) => Some(w),
                    Token::Separator => None,
                })
                .collect();
            segment_chunk(text, &words, lexicon, max_words, &mut spans);
        }

        spans
    }
}

/// Greedy longest lexicon match inside a separator-free chunk; adjacent
/// unmatched strong words are merged into one span
fn segment_chunk(
    text: &NormalizedText,
    words: &[&Word],
    lexicon: &Lexicon,
    max_words: usize,
    spans: &mut Vec<MentionSpan>,
) {
    let mut unmatched: Vec<&Word> = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let longest = (1..=max_words.min(words.len() - i)).rev().find(|&n| {
            let window = &words[i..i + n];
            // A known name never starts or ends with a weak word
            if n > 1 && (window[0].weak || window[n - 1].weak) {
                return false;
            }
            let key = window.iter().map(|w| w.key.as_str()).collect::<Vec<_>>().join(" ");
            lexicon.contains(&key) && !(n == 1 && window[0].weak)
        });

        match longest {
            Some(n) => {
                flush(text, &mut unmatched, spans);
                spans.push(make_span(text, &words[i..i + n]));
                i += n;
            }
            None if words[i].weak => {
                flush(text, &mut unmatched, spans);
                i += 1;
            }
            None => {
                unmatched.push(words[i]);
                i += 1;
            }
        }
    }

    flush(text, &mut unmatched, spans);
}

fn flush(text: &NormalizedText, unmatched: &mut Vec<&Word>, spans: &mut Vec<MentionSpan>) {
    if !unmatched.is_empty() {
        spans.push(make_span(text, unmatched));
        unmatched.clear();
    }
}

fn make_span(text: &NormalizedText, words: &[&Word]) -> MentionSpan {
    let start = words[0].start;
    let end = words[words.len() - 1].end;
    let key = words.iter().map(|w| w.key.as_str()).collect::<Vec<_>>().join(" ");

    MentionSpan {
        text: text.slice(start, end),
        key,
        start,
        end,
        script: text.dominant_script(start, end),
        recipe: None,
    }
}

fn tokenize(text: &str, lexicon: &Lexicon) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut position = 0usize;

    for segment in text.split_word_bounds() {
        let start = position;
        let length = segment.chars().count();
        position += length;

        if SEPARATORS.contains(&segment) || segment.contains('\n') {
            tokens.push(Token::Separator);
            continue;
        }
        if !segment.chars().any(char::is_alphabetic) {
            continue;
        }

        let (key, offset) = split_proclitic(segment, lexicon);
        if key.is_empty() {
            continue;
        }

        let weak = CONNECTORS.contains(&key.as_str()) || STOPWORDS.contains(&key.as_str());
        tokens.push(Token::Word(Word {
            key,
            start: start + offset,
            end: start + length,
            weak,
        }));
    }

    tokens
}

/// Folded key of a word and the number of leading characters that belong
/// to a split-off proclitic
fn split_proclitic(word: &str, lexicon: &Lexicon) -> (String, usize) {
    let key = fold_word(word);

    if lexicon.contains(&key) {
        return (key, 0);
    }

    for prefix in ARTICLE_PROCLITICS {
        if let Some(rest) = key.strip_prefix(prefix) {
            if rest.chars().count() >= 2 {
                return (rest.to_string(), prefix.chars().count());
            }
        }
    }

    for prefix in PROCLITICS {
        if let Some(rest) = key.strip_prefix(prefix) {
            let rest_key = fold_word(rest);
            if rest.chars().count() >= 2 && lexicon.contains(&rest_key) {
                let offset = prefix.chars().count() + rest.chars().count() - rest_key.chars().count();
                return (rest_key, offset);
            }
        }
    }

    (key, 0)
}
