//! Fuzzy query expansion: trigram candidate lookup, Damerau verification,
//! and auto-correction of user-entered terms.

use ahash::{AHashMap, AHashSet};

use crate::index::segment::Segment;
use crate::search::distance::{damerau_levenshtein_distance, trigram_similarity, trigrams};
use crate::tokenize::split_identifier;

/// Minimum Dice similarity for a trigram candidate to survive.
pub const DICE_THRESHOLD: f64 = 0.3;

/// Tokens shorter than this are never fuzzy-expanded; there is too little
/// signal in three characters to tell a typo from a different word.
pub const FUZZY_MIN_TERM_LENGTH: usize = 4;

/// Maximum allowed Damerau distance for a term of the given char length.
pub fn max_edit_distance(len: usize) -> usize {
    if len >= 6 { 2 } else { 1 }
}

/// Trigram inverted index over a vocabulary, built transiently per query.
pub struct TrigramIndex {
    grams: AHashMap<String, Vec<String>>,
}

impl TrigramIndex {
    /// Indexes every term of a vocabulary by its padded trigrams,
    /// deduplicating per term.
    pub fn build<'a>(vocabulary: impl IntoIterator<Item = &'a str>) -> Self {
        let mut grams: AHashMap<String, Vec<String>> = AHashMap::new();
        for term in vocabulary {
            let unique: AHashSet<String> = trigrams(term).into_iter().collect();
            for gram in unique {
                grams.entry(gram).or_default().push(term.to_string());
            }
        }
        Self { grams }
    }

    /// Builds the index over a segment's vocabulary.
    pub fn from_segment(segment: &Segment) -> Self {
        Self::build(segment.vocabulary())
    }

    /// Candidate terms sharing at least one trigram with `term`, the exact
    /// term excluded, filtered by Dice similarity ≥ [`DICE_THRESHOLD`].
    pub fn candidates(&self, term: &str) -> Vec<String> {
        let mut seen: AHashSet<&str> = AHashSet::new();
        let mut out = Vec::new();
        for gram in trigrams(term) {
            let Some(terms) = self.grams.get(&gram) else {
                continue;
            };
            for candidate in terms {
                if candidate == term || !seen.insert(candidate) {
                    continue;
                }
                if trigram_similarity(term, candidate) >= DICE_THRESHOLD {
                    out.push(candidate.clone());
                }
            }
        }
        out
    }
}

/// Expands one query token that missed the vocabulary.
///
/// Tokens under [`FUZZY_MIN_TERM_LENGTH`] chars stay unexpanded. Candidates
/// come from the trigram index and survive only within the length-scaled
/// Damerau distance.
pub fn expand_token(index: &TrigramIndex, token: &str) -> Vec<String> {
    let len = token.chars().count();
    if len < FUZZY_MIN_TERM_LENGTH {
        return Vec::new();
    }
    let max_distance = max_edit_distance(len);

    index
        .candidates(token)
        .into_iter()
        .filter(|candidate| damerau_levenshtein_distance(token, candidate) <= max_distance)
        .collect()
}

/// Outcome of auto-correcting one user-entered term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Replacement terms: usually one, several when a camelCase split had
    /// to be corrected piecewise.
    pub terms: Vec<String>,
    /// Whether anything actually changed.
    pub changed: bool,
}

impl Correction {
    fn unchanged(term: &str) -> Self {
        Self {
            terms: vec![term.to_string()],
            changed: false,
        }
    }

    fn replaced(terms: Vec<String>) -> Self {
        Self {
            terms,
            changed: true,
        }
    }
}

/// Auto-corrects a term the user typed against the index vocabulary.
///
/// Kept verbatim when present (directly or lowercased). Otherwise the best
/// trigram candidate within edit distance wins, ties broken by trigram
/// similarity; short terms with no candidates fall back to a whole-vocabulary
/// scan. As a last resort the term is camelCase-split and each part
/// corrected, preferring a concatenation that exists in (or nearly matches)
/// the vocabulary over separate parts.
pub fn autocorrect_term(segment: &Segment, index: &TrigramIndex, term: &str) -> Correction {
    if segment.contains_term(term) {
        return Correction::unchanged(term);
    }
    let lowered = term.to_lowercase();
    if segment.contains_term(&lowered) {
        // Present modulo case; keep the user's casing for display, the
        // scorer tokenizes it back down anyway.
        return Correction::unchanged(term);
    }

    if let Some(corrected) = best_single_correction(segment, index, &lowered) {
        return Correction::replaced(vec![corrected]);
    }

    // camelCase fallback: correct the parts, then try to reassemble.
    let parts = split_identifier(term);
    if parts.len() > 1 {
        let corrected_parts: Vec<String> = parts
            .iter()
            .map(|part| {
                let part = part.to_lowercase();
                if segment.contains_term(&part) {
                    part
                } else {
                    best_single_correction(segment, index, &part).unwrap_or(part)
                }
            })
            .collect();

        let concatenated = corrected_parts.concat();
        if segment.contains_term(&concatenated) {
            return Correction::replaced(vec![concatenated]);
        }
        if let Some(close) = scan_vocabulary(segment, &concatenated) {
            return Correction::replaced(vec![close]);
        }
        return Correction::replaced(corrected_parts);
    }

    Correction::unchanged(term)
}

/// Best vocabulary replacement for one lowercase term: trigram candidates
/// within distance, else (for short terms) a full-vocabulary scan.
fn best_single_correction(
    segment: &Segment,
    index: &TrigramIndex,
    term: &str,
) -> Option<String> {
    let len = term.chars().count();
    let max_distance = max_edit_distance(len);

    let candidates = index.candidates(term);
    let best = pick_best(term, candidates.into_iter(), max_distance);
    if best.is_some() {
        return best;
    }

    // Trigrams need shared shingles; a 3-char typo can miss every one. Only
    // short terms get the brute-force scan, the vocabulary is large.
    if len <= FUZZY_MIN_TERM_LENGTH {
        return scan_vocabulary(segment, term);
    }
    None
}

/// Scans the whole vocabulary for the closest term within edit distance.
fn scan_vocabulary(segment: &Segment, term: &str) -> Option<String> {
    let max_distance = max_edit_distance(term.chars().count());
    pick_best(
        term,
        segment.vocabulary().map(ToString::to_string),
        max_distance,
    )
}

/// Lowest Damerau distance wins; ties break toward the higher trigram
/// similarity.
fn pick_best(
    term: &str,
    candidates: impl Iterator<Item = String>,
    max_distance: usize,
) -> Option<String> {
    let mut best: Option<(usize, f64, String)> = None;
    for candidate in candidates {
        if candidate == term {
            continue;
        }
        let distance = damerau_levenshtein_distance(term, &candidate);
        if distance > max_distance {
            continue;
        }
        let similarity = trigram_similarity(term, &candidate);
        let better = match &best {
            None => true,
            Some((best_distance, best_similarity, _)) => {
                distance < *best_distance
                    || (distance == *best_distance && similarity > *best_similarity)
            }
        };
        if better {
            best = Some((distance, similarity, candidate));
        }
    }
    best.map(|(_, _, term)| term)
}
