//! Per-character script tags and simplified bidirectional classes

use serde::{Deserialize, Serialize};

/// Script of a single character, used to pick a matching strategy per span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTag {
    /// Arabic letters (MSA and Darija, including presentation forms)
    Arabic,
    /// Latin letters (French, English, Arabizi)
    Latin,
    /// ASCII or Arabic-Indic digits
    Digit,
    /// Spaces, tabs and newlines
    Whitespace,
    /// Punctuation and symbols
    Punctuation,
    /// Anything else
    Other,
}

impl ScriptTag {
    /// Classify a character
    pub fn of(c: char) -> Self {
        if is_arabic_letter(c) {
            Self::Arabic
        } else if c.is_ascii_digit() || is_arabic_digit(c) {
            Self::Digit
        } else if c.is_alphabetic() && is_latin(c) {
            Self::Latin
        } else if c.is_whitespace() {
            Self::Whitespace
        } else if c.is_ascii_punctuation() || is_arabic_punctuation(c) || is_general_punctuation(c)
        {
            Self::Punctuation
        } else {
            Self::Other
        }
    }

    /// Whether this tag carries lexical content (letters)
    pub fn is_letter(&self) -> bool {
        matches!(self, Self::Arabic | Self::Latin)
    }

    /// Direction naturally associated with the script, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Self::Arabic => Some(Direction::Rtl),
            Self::Latin => Some(Direction::Ltr),
            _ => None,
        }
    }
}

/// Dominant writing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Lowest embedding level for this direction
    pub fn base_level(&self) -> u8 {
        match self {
            Self::Ltr => 0,
            Self::Rtl => 1,
        }
    }

    /// Direction implied by the parity of an embedding level
    pub fn of_level(level: u8) -> Self {
        if level % 2 == 0 { Self::Ltr } else { Self::Rtl }
    }
}

/// Reduced set of Unicode bidirectional character types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidiClass {
    L,
    R,
    AL,
    EN,
    ES,
    ET,
    AN,
    CS,
    NSM,
    B,
    WS,
    ON,
    LRE,
    RLE,
    LRO,
    RLO,
    PDF,
    LRI,
    RLI,
    FSI,
    PDI,
    LRM,
    RLM,
}

impl BidiClass {
    pub fn of(c: char) -> Self {
        match c {
            '\u{202A}' => Self::LRE,
            '\u{202B}' => Self::RLE,
            '\u{202D}' => Self::LRO,
            '\u{202E}' => Self::RLO,
            '\u{202C}' => Self::PDF,
            '\u{2066}' => Self::LRI,
            '\u{2067}' => Self::RLI,
            '\u{2068}' => Self::FSI,
            '\u{2069}' => Self::PDI,
            '\u{200E}' => Self::LRM,
            '\u{200F}' | '\u{061C}' => Self::RLM,
            '\n' | '\r' | '\u{2029}' => Self::B,
            '0'..='9' | '\u{06F0}'..='\u{06F9}' => Self::EN,
            '\u{0660}'..='\u{0669}' | '\u{066B}' | '\u{066C}' => Self::AN,
            '+' | '-' => Self::ES,
            '#' | '$' | '%' | '\u{00B0}' | '\u{066A}' | '\u{20AC}' => Self::ET,
            ',' | '.' | ':' | '/' | '\u{060C}' | '\u{00A0}' => Self::CS,
            '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{0300}'..='\u{036F}' => Self::NSM,
            '\u{0590}'..='\u{05FF}' => Self::R,
            _ if is_arabic_letter(c) || c == '\u{061F}' || c == '\u{061B}' => Self::AL,
            _ if c.is_whitespace() => Self::WS,
            _ if c.is_alphabetic() || c.is_numeric() => Self::L,
            _ => Self::ON,
        }
    }

    /// Explicit embedding, override or isolate controls (removed from output)
    pub fn is_explicit_control(&self) -> bool {
        matches!(
            self,
            Self::LRE
                | Self::RLE
                | Self::LRO
                | Self::RLO
                | Self::PDF
                | Self::LRI
                | Self::RLI
                | Self::FSI
                | Self::PDI
                | Self::LRM
                | Self::RLM
        )
    }

    /// Strong direction of the class, if it has one
    pub fn strong_direction(&self) -> Option<Direction> {
        match self {
            Self::L | Self::LRM => Some(Direction::Ltr),
            Self::R | Self::AL | Self::RLM => Some(Direction::Rtl),
            _ => None,
        }
    }
}

pub fn is_arabic_letter(c: char) -> bool {
    matches!(c,
        '\u{0621}'..='\u{064A}'
        | '\u{066E}'..='\u{06D3}'
        | '\u{06D5}'
        | '\u{06FA}'..='\u{06FC}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08C9}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFC}')
        && c != '\u{0640}'
}

pub fn is_arabic_digit(c: char) -> bool {
    matches!(c, '\u{0660}'..='\u{0669}' | '\u{06F0}'..='\u{06F9}')
}

/// Arabic diacritics (harakat, shadda, sukun, superscript alef)
pub fn is_arabic_mark(c: char) -> bool {
    matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}')
}

fn is_latin(c: char) -> bool {
    matches!(c,
        'a'..='z' | 'A'..='Z'
        | '\u{00C0}'..='\u{024F}'
        | '\u{1E00}'..='\u{1EFF}')
}

fn is_arabic_punctuation(c: char) -> bool {
    matches!(c, '\u{060C}' | '\u{061B}' | '\u{061F}' | '\u{066A}'..='\u{066D}' | '\u{06D4}')
}

fn is_general_punctuation(c: char) -> bool {
    matches!(c, '\u{2010}'..='\u{2027}' | '\u{00AB}' | '\u{00BB}' | '\u{00B0}')
}
