//! Arabic contextual shaping
//!
//! Maps base Arabic letters to their isolated/final/initial/medial
//! presentation forms (Unicode Presentation Forms-A/B) and back.

use super::tag::is_arabic_mark;

/// Joining behaviour of a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Joins on both sides
    Dual,
    /// Joins only to the preceding letter
    Right,
    /// Never joins
    None,
}

/// (base, isolated, final, initial, medial); right-joining letters repeat
/// their isolated/final forms for initial/medial.
const FORMS: &[(char, char, char, char, char, Joining)] = &[
    ('\u{0621}', '\u{FE80}', '\u{FE80}', '\u{FE80}', '\u{FE80}', Joining::None),
    ('\u{0622}', '\u{FE81}', '\u{FE82}', '\u{FE81}', '\u{FE82}', Joining::Right),
    ('\u{0623}', '\u{FE83}', '\u{FE84}', '\u{FE83}', '\u{FE84}', Joining::Right),
    ('\u{0624}', '\u{FE85}', '\u{FE86}', '\u{FE85}', '\u{FE86}', Joining::Right),
    ('\u{0625}', '\u{FE87}', '\u{FE88}', '\u{FE87}', '\u{FE88}', Joining::Right),
    ('\u{0626}', '\u{FE89}', '\u{FE8A}', '\u{FE8B}', '\u{FE8C}', Joining::Dual),
    ('\u{0627}', '\u{FE8D}', '\u{FE8E}', '\u{FE8D}', '\u{FE8E}', Joining::Right),
    ('\u{0628}', '\u{FE8F}', '\u{FE90}', '\u{FE91}', '\u{FE92}', Joining::Dual),
    ('\u{0629}', '\u{FE93}', '\u{FE94}', '\u{FE93}', '\u{FE94}', Joining::Right),
    ('\u{062A}', '\u{FE95}', '\u{FE96}', '\u{FE97}', '\u{FE98}', Joining::Dual),
    ('\u{062B}', '\u{FE99}', '\u{FE9A}', '\u{FE9B}', '\u{FE9C}', Joining::Dual),
    ('\u{062C}', '\u{FE9D}', '\u{FE9E}', '\u{FE9F}', '\u{FEA0}', Joining::Dual),
    ('\u{062D}', '\u{FEA1}', '\u{FEA2}', '\u{FEA3}', '\u{FEA4}', Joining::Dual),
    ('\u{062E}', '\u{FEA5}', '\u{FEA6}', '\u{FEA7}', '\u{FEA8}', Joining::Dual),
    ('\u{062F}', '\u{FEA9}', '\u{FEAA}', '\u{FEA9}', '\u{FEAA}', Joining::Right),
    ('\u{0630}', '\u{FEAB}', '\u{FEAC}', '\u{FEAB}', '\u{FEAC}', Joining::Right),
    ('\u{0631}', '\u{FEAD}', '\u{FEAE}', '\u{FEAD}', '\u{FEAE}', Joining::Right),
    ('\u{0632}', '\u{FEAF}', '\u{FEB0}', '\u{FEAF}', '\u{FEB0}', Joining::Right),
    ('\u{0633}', '\u{FEB1}', '\u{FEB2}', '\u{FEB3}', '\u{FEB4}', Joining::Dual),
    ('\u{0634}', '\u{FEB5}', '\u{FEB6}', '\u{FEB7}', '\u{FEB8}', Joining::Dual),
    ('\u{0635}', '\u{FEB9}', '\u{FEBA}', '\u{FEBB}', '\u{FEBC}', Joining::Dual),
    ('\u{0636}', '\u{FEBD}', '\u{FEBE}', '\u{FEBF}', '\u{FEC0}', Joining::Dual),
    ('\u{0637}', '\u{FEC1}', '\u{FEC2}', '\u{FEC3}', '\u{FEC4}', Joining::Dual),
    ('\u{0638}', '\u{FEC5}', '\u{FEC6}', '\u{FEC7}', '\u{FEC8}', Joining::Dual),
    ('\u{0639}', '\u{FEC9}', '\u{FECA}', '\u{FECB}', '\u{FECC}', Joining::Dual),
    ('\u{063A}', '\u{FECD}', '\u{FECE}', '\u{FECF}', '\u{FED0}', Joining::Dual),
    ('\u{0641}', '\u{FED1}', '\u{FED2}', '\u{FED3}', '\u{FED4}', Joining::Dual),
    ('\u{0642}', '\u{FED5}', '\u{FED6}', '\u{FED7}', '\u{FED8}', Joining::Dual),
    ('\u{0643}', '\u{FED9}', '\u{FEDA}', '\u{FEDB}', '\u{FEDC}', Joining::Dual),
    ('\u{0644}', '\u{FEDD}', '\u{FEDE}', '\u{FEDF}', '\u{FEE0}', Joining::Dual),
    ('\u{0645}', '\u{FEE1}', '\u{FEE2}', '\u{FEE3}', '\u{FEE4}', Joining::Dual),
    ('\u{0646}', '\u{FEE5}', '\u{FEE6}', '\u{FEE7}', '\u{FEE8}', Joining::Dual),
    ('\u{0647}', '\u{FEE9}', '\u{FEEA}', '\u{FEEB}', '\u{FEEC}', Joining::Dual),
    ('\u{0648}', '\u{FEED}', '\u{FEEE}', '\u{FEED}', '\u{FEEE}', Joining::Right),
    ('\u{0649}', '\u{FEEF}', '\u{FEF0}', '\u{FEEF}', '\u{FEF0}', Joining::Right),
    ('\u{064A}', '\u{FEF1}', '\u{FEF2}', '\u{FEF3}', '\u{FEF4}', Joining::Dual),
    // Letters used in Darija loanwords
    ('\u{067E}', '\u{FB56}', '\u{FB57}', '\u{FB58}', '\u{FB59}', Joining::Dual),
    ('\u{06A4}', '\u{FB6A}', '\u{FB6B}', '\u{FB6C}', '\u{FB6D}', Joining::Dual),
    ('\u{06AD}', '\u{FBD3}', '\u{FBD4}', '\u{FBD5}', '\u{FBD6}', Joining::Dual),
    ('\u{06AF}', '\u{FB92}', '\u{FB93}', '\u{FB94}', '\u{FB95}', Joining::Dual),
    ('\u{06CC}', '\u{FBFC}', '\u{FBFD}', '\u{FBFE}', '\u{FBFF}', Joining::Dual),
];

/// Lam-alef ligatures: (alef variant, isolated, final)
const LAM_ALEF: &[(char, char, char)] = &[
    ('\u{0622}', '\u{FEF5}', '\u{FEF6}'),
    ('\u{0623}', '\u{FEF7}', '\u{FEF8}'),
    ('\u{0625}', '\u{FEF9}', '\u{FEFA}'),
    ('\u{0627}', '\u{FEFB}', '\u{FEFC}'),
];

const LAM: char = '\u{0644}';
const TATWEEL: char = '\u{0640}';

fn lookup(c: char) -> Option<&'static (char, char, char, char, char, Joining)> {
    FORMS.iter().find(|entry| entry.0 == c)
}

fn joining(c: char) -> Joining {
    if c == TATWEEL {
        return Joining::Dual;
    }
    lookup(c).map(|entry| entry.5).unwrap_or(Joining::None)
}

/// Reshape logical-order text into contextual presentation forms.
///
/// Returns the shaped characters paired with the index of the source
/// character each one came from. Lam-alef pairs collapse into a single
/// ligature attributed to the lam. Characters without shaping rules pass
/// through unchanged.
pub fn reshape(chars: &[char]) -> Vec<(char, usize)> {
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let joins_before = previous_letter(chars, i)
            .map(|p| joining(chars[p]) == Joining::Dual)
            .unwrap_or(false);

        if c == LAM {
            if let Some(next) = next_letter(chars, i) {
                if let Some(&(_, isolated, final_form)) =
                    LAM_ALEF.iter().find(|(alef, _, _)| *alef == chars[next])
                {
                    let form = if joins_before { final_form } else { isolated };
                    out.push((form, i));
                    // Keep any marks sitting between lam and alef
                    for (offset, mark) in chars[i + 1..next].iter().enumerate() {
                        out.push((*mark, i + 1 + offset));
                    }
                    i = next + 1;
                    continue;
                }
            }
        }

        match lookup(c) {
            Some(&(_, isolated, final_form, initial, medial, kind)) => {
                let joins_after = kind == Joining::Dual
                    && next_letter(chars, i)
                        .map(|n| joining(chars[n]) != Joining::None)
                        .unwrap_or(false);

                let form = match (joins_before && kind != Joining::None, joins_after) {
                    (true, true) => medial,
                    (true, false) => final_form,
                    (false, true) => initial,
                    (false, false) => isolated,
                };
                out.push((form, i));
            }
            None => out.push((c, i)),
        }

        i += 1;
    }

    out
}

/// Map presentation forms back to base letters.
///
/// Lam-alef ligatures expand to two characters.
pub fn unshape(c: char, out: &mut String) {
    if let Some(&(alef, _, _)) = LAM_ALEF
        .iter()
        .find(|(_, isolated, final_form)| *isolated == c || *final_form == c)
    {
        out.push(LAM);
        out.push(alef);
        return;
    }

    match FORMS
        .iter()
        .find(|entry| entry.1 == c || entry.2 == c || entry.3 == c || entry.4 == c)
    {
        Some(entry) => out.push(entry.0),
        None => out.push(c),
    }
}

/// Whether the character is an Arabic presentation form
pub fn is_presentation_form(c: char) -> bool {
    matches!(c, '\u{FB50}'..='\u{FDFF}' | '\u{FE70}'..='\u{FEFC}')
}

fn previous_letter(chars: &[char], i: usize) -> Option<usize> {
    (0..i)
        .rev()
        .find(|&p| !is_arabic_mark(chars[p]))
        .filter(|&p| joining(chars[p]) != Joining::None || chars[p] == TATWEEL)
}

fn next_letter(chars: &[char], i: usize) -> Option<usize> {
    (i + 1..chars.len())
        .find(|&n| !is_arabic_mark(chars[n]))
        .filter(|&n| joining(chars[n]) != Joining::None)
}
