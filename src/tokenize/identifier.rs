//! Identifier splitting and per-word normalization.
//!
//! Splits `snake_case`, `camelCase`, `PascalCase`, acronym runs, and
//! letter/digit transitions into their component words, then lowercases,
//! length-filters, and stems each word.

use rust_stemmers::{Algorithm, Stemmer};
use std::sync::OnceLock;

/// Words shorter than this (before stemming) are discarded as noise.
const MIN_WORD_LENGTH: usize = 2;

/// Returns the process-wide English (Porter-style) stemmer.
pub(crate) fn stemmer() -> &'static Stemmer {
    static STEMMER: OnceLock<Stemmer> = OnceLock::new();
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Character classes that drive word-boundary decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Lower,
    Upper,
    Digit,
}

impl CharClass {
    fn of(c: char) -> Option<Self> {
        if c.is_numeric() {
            Some(Self::Digit)
        } else if c.is_uppercase() {
            Some(Self::Upper)
        } else if c.is_alphabetic() {
            Some(Self::Lower)
        } else {
            None
        }
    }

    fn is_letter(self) -> bool {
        matches!(self, Self::Lower | Self::Upper)
    }
}

/// Splits one identifier into raw case-preserving words.
///
/// Boundary rules:
/// - `_` always separates words;
/// - a lowercase (or digit-to-letter) to uppercase transition starts a word;
/// - an uppercase run followed by a lowercase letter ends the acronym one
///   character early, so `parseHTMLDocument` yields `parse`, `HTML`,
///   `Document`;
/// - any letter/digit transition starts a new word.
pub(crate) fn split_identifier(identifier: &str) -> Vec<String> {
    let mut words = Vec::new();
    for piece in identifier.split('_') {
        split_case_boundaries(piece, &mut words);
    }
    words
}

fn split_case_boundaries(piece: &str, words: &mut Vec<String>) {
    let chars: Vec<char> = piece.chars().collect();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let Some(class) = CharClass::of(c) else {
            // Stray symbol inside a run; treat as a separator.
            flush(&mut current, words);
            continue;
        };

        let prev_class = if i == 0 {
            None
        } else {
            CharClass::of(chars[i - 1])
        };
        let boundary = match prev_class {
            None => false,
            Some(prev) => {
                let next_is_lower = chars
                    .get(i + 1)
                    .and_then(|&n| CharClass::of(n))
                    .is_some_and(|n| n == CharClass::Lower);
                // lower→Upper, acronym-end (UPPERx where x is lower), or a
                // letter↔digit flip.
                (prev == CharClass::Lower && class == CharClass::Upper)
                    || (prev == CharClass::Upper && class == CharClass::Upper && next_is_lower)
                    || (prev.is_letter() != class.is_letter())
            }
        };

        if boundary {
            flush(&mut current, words);
        }
        current.push(c);
    }
    flush(&mut current, words);
}

fn flush(current: &mut String, words: &mut Vec<String>) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

/// Normalizes one raw word: lowercase, drop purely-numeric and too-short
/// words, then stem. Stems shorter than two characters fall back to the
/// unstemmed lowercase form.
pub(crate) fn normalize_word(word: &str) -> Option<String> {
    let lowered = word.to_lowercase();
    if lowered.chars().count() < MIN_WORD_LENGTH {
        return None;
    }
    if lowered.chars().all(char::is_numeric) {
        return None;
    }

    let stemmed = stemmer().stem(&lowered);
    if stemmed.chars().count() >= MIN_WORD_LENGTH {
        Some(stemmed.into_owned())
    } else {
        Some(lowered)
    }
}

/// Splits an identifier and normalizes every resulting word, appending the
/// survivors to `out`.
pub(crate) fn process_identifier(identifier: &str, out: &mut Vec<String>) {
    for word in split_identifier(identifier) {
        if let Some(token) = normalize_word(&word) {
            out.push(token);
        }
    }
}
