//! Supported languages and query language detection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fold::fold_word;
use super::normalizer::NormalizedText;
use super::tag::ScriptTag;

/// Languages the pipeline understands and answers in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    /// Modern Standard Arabic
    #[serde(rename = "ar")]
    Arabic,
    /// Moroccan Arabic, written in Arabic script or Arabizi
    #[serde(rename = "ary")]
    Darija,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Arabic,
        Language::Darija,
        Language::French,
        Language::English,
    ];

    /// BCP-47 style tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Arabic => "ar",
            Self::Darija => "ary",
            Self::French => "fr",
            Self::English => "en",
        }
    }

    /// Script the language is natively written in
    pub fn script(&self) -> ScriptTag {
        match self {
            Self::Arabic | Self::Darija => ScriptTag::Arabic,
            Self::French | Self::English => ScriptTag::Latin,
        }
    }

    /// Order in which display names are looked up when rendering in this
    /// language
    pub fn fallback_chain(&self) -> [Language; 4] {
        match self {
            Self::Arabic => [Self::Arabic, Self::Darija, Self::French, Self::English],
            Self::Darija => [Self::Darija, Self::Arabic, Self::French, Self::English],
            Self::French => [Self::French, Self::English, Self::Arabic, Self::Darija],
            Self::English => [Self::English, Self::French, Self::Arabic, Self::Darija],
        }
    }

    /// Default region associated with the language, used for regional boosts
    pub fn default_region(&self) -> Option<&'static str> {
        match self {
            Self::Darija => Some("MA"),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ar" | "arabic" | "msa" => Ok(Self::Arabic),
            "ary" | "darija" | "ma" => Ok(Self::Darija),
            "fr" | "french" | "francais" => Ok(Self::French),
            "en" | "english" => Ok(Self::English),
            other => Err(format!("Unsupported language '{}'", other)),
        }
    }
}

/// A language together with the script a text is written in.
///
/// Darija is written both in Arabic script and in Latin letters (Arabizi);
/// answers follow the script of the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Locale {
    pub language: Language,
    pub script: ScriptTag,
}

impl Locale {
    /// Every locale answers are rendered in
    pub const SUPPORTED: [Locale; 5] = [
        Locale::native(Language::Arabic),
        Locale::native(Language::Darija),
        Locale::arabizi(),
        Locale::native(Language::French),
        Locale::native(Language::English),
    ];

    /// The language in the script it is natively written in
    pub const fn native(language: Language) -> Self {
        let script = match language {
            Language::Arabic | Language::Darija => ScriptTag::Arabic,
            Language::French | Language::English => ScriptTag::Latin,
        };
        Self { language, script }
    }

    /// Darija in Latin letters
    pub const fn arabizi() -> Self {
        Self {
            language: Language::Darija,
            script: ScriptTag::Latin,
        }
    }

    pub fn is_native(&self) -> bool {
        self.script == self.language.script()
    }
}

impl From<Language> for Locale {
    fn from(language: Language) -> Self {
        Self::native(language)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.is_native(), self.script) {
            (true, _) => write!(f, "{}", self.language),
            (false, ScriptTag::Latin) => write!(f, "{}-Latn", self.language),
            (false, _) => write!(f, "{}-Arab", self.language),
        }
    }
}

/// Words that mark Moroccan Arabic in Arabic script (folded)
const DARIJA_MARKERS: &[&str] = &[
    "واش", "ديال", "شنو", "شي", "كاين", "كاينه", "بزاف", "دابا", "علاش", "كيفاش", "فين",
    "هادا", "هادي", "هاد", "ماشي", "بغيت", "عندي", "والو", "زرع", "ديالي", "كنقدر", "نقدر",
];

/// Words that mark Modern Standard Arabic (folded)
const ARABIC_MARKERS: &[&str] = &[
    "هل", "يحتوي", "تحتوي", "علي", "الذي", "التي", "ماذا", "ليس", "خالي", "خال", "هذا", "هذه",
    "يوجد", "لا",
];

/// Arabizi (Latin-script Darija) markers
const ARABIZI_MARKERS: &[&str] = &[
    "wach", "wash", "fih", "fiha", "dial", "dyal", "chno", "shno", "kayn", "kayen", "bzaf",
    "wla", "khobz", "zraa", "zar3", "bghit", "3ndi", "ma3a", "m3a", "daba",
];

const FRENCH_MARKERS: &[&str] = &[
    "le", "la", "les", "est", "avec", "sans", "du", "de", "des", "et", "pain", "farine",
    "contient", "que", "ce", "il", "y", "a", "ble", "orge", "seigle", "est-ce", "un", "une",
    "au", "aux", "gateau",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "is", "with", "and", "does", "contain", "contains", "bread", "flour", "in", "of",
    "there", "any", "wheat", "barley", "rye", "free", "a", "an", "cake",
];

/// Detect the language of a normalized query
pub fn detect_language(text: &NormalizedText) -> Language {
    detect_locale(text).language
}

/// Detect the language and script of a normalized query.
///
/// Script decides between the Arabic-script and Latin-script families;
/// marker words then pick the language inside the family. Arabic script
/// without Darija markers is answered in Modern Standard Arabic; Latin
/// script with Arabizi markers (or Arabizi digits inside words) is Darija
/// in Latin letters.
pub fn detect_locale(text: &NormalizedText) -> Locale {
    let (arabic, latin) = text.tags.iter().fold((0usize, 0usize), |(a, l), tag| match tag {
        ScriptTag::Arabic => (a + 1, l),
        ScriptTag::Latin => (a, l + 1),
        _ => (a, l),
    });

    let words: Vec<String> = text
        .text
        .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '،' || c == '؟')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut folded = String::new();
            for c in w.chars() {
                super::fold::fold_char(c, &mut folded);
            }
            folded
        })
        .collect();

    let count = |markers: &[&str]| {
        words
            .iter()
            .filter(|w| markers.contains(&w.as_str()) || markers.contains(&fold_word(w).as_str()))
            .count()
    };

    if arabic > 0 && arabic >= latin {
        let darija = count(DARIJA_MARKERS)
            + text
                .text
                .chars()
                .filter(|c| matches!(c, 'ڭ' | 'ڤ' | 'گ' | 'پ'))
                .count();
        let msa = count(ARABIC_MARKERS);

        return Locale::native(if darija > msa {
            Language::Darija
        } else {
            Language::Arabic
        });
    }

    if latin == 0 {
        return Locale::native(Language::English);
    }

    let arabizi = count(ARABIZI_MARKERS)
        + words
            .iter()
            .filter(|w| has_arabizi_digits(w))
            .count();
    let french = count(FRENCH_MARKERS)
        + text
            .text
            .chars()
            .filter(|c| matches!(c, 'é' | 'è' | 'ê' | 'à' | 'ç' | 'ù' | 'â' | 'î' | 'ô' | 'œ'))
            .count();
    let english = count(ENGLISH_MARKERS);

    if arabizi > 0 && arabizi >= french && arabizi >= english {
        Locale::arabizi()
    } else if french > english {
        Locale::native(Language::French)
    } else {
        Locale::native(Language::English)
    }
}

/// Latin word with the 3/7/9 digits Arabizi uses for ع/ح/ق
fn has_arabizi_digits(word: &str) -> bool {
    let has_letters = word.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit_letter = word.chars().any(|c| matches!(c, '3' | '7' | '9'));
    has_letters && has_digit_letter
}
