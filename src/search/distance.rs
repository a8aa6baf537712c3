//! Edit-distance and trigram-similarity kernels used by fuzzy matching.
//!
//! Edit distances are provided by `rapidfuzz`; trigram generation and Dice
//! similarity are implemented here over character shingles.

use ahash::AHashSet;
use rapidfuzz::distance::{levenshtein, osa};

/// Padding marker wrapped around a term before shingling, so that the first
/// and last characters of a term produce distinguishing trigrams.
const TRIGRAM_PAD: &str = "$$";

/// Levenshtein edit distance over Unicode scalar values.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    levenshtein::distance(a.chars(), b.chars())
}

/// Restricted Damerau-Levenshtein distance (optimal string alignment).
///
/// An adjacent transposition counts as a single edit, so `deploy` vs
/// `depoly` is distance 1 rather than 2.
pub fn damerau_levenshtein_distance(a: &str, b: &str) -> usize {
    osa::distance(a.chars(), b.chars())
}

/// Generates the padded character trigrams of a term.
///
/// The term is wrapped as `$$term$$` and every 3-character window is
/// emitted, duplicates included. Terms shorter than one character still
/// produce at least one shingle from the padding.
pub fn trigrams(term: &str) -> Vec<String> {
    let padded: Vec<char> = TRIGRAM_PAD
        .chars()
        .chain(term.chars())
        .chain(TRIGRAM_PAD.chars())
        .collect();

    padded
        .windows(3)
        .map(|window| window.iter().collect())
        .collect()
}

/// Dice coefficient over the unique trigram sets of two terms: in `[0, 1]`.
///
/// Identical inputs short-circuit to 1.0 without shingling.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let set_a: AHashSet<String> = trigrams(a).into_iter().collect();
    let set_b: AHashSet<String> = trigrams(b).into_iter().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let shared = set_a.intersection(&set_b).count();
    (2.0 * shared as f64) / (set_a.len() + set_b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("kitten", "sitting", 3)]
    #[case("flaw", "lawn", 2)]
    #[case("", "abc", 3)]
    #[case("same", "same", 0)]
    fn levenshtein_known_distances(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        check!(levenshtein_distance(a, b) == expected);
    }

    #[test]
    fn levenshtein_is_symmetric() {
        let pairs = [("deploy", "deplyo"), ("config", "cofnig"), ("a", "ab")];
        for (a, b) in pairs {
            check!(levenshtein_distance(a, b) == levenshtein_distance(b, a));
        }
    }

    #[test]
    fn levenshtein_triangle_inequality() {
        let (a, b, c) = ("search", "source", "soured");
        let ab = levenshtein_distance(a, b);
        let bc = levenshtein_distance(b, c);
        let ac = levenshtein_distance(a, c);
        check!(ac <= ab + bc);
    }

    /// Any single adjacent swap is exactly one Damerau edit.
    #[rstest]
    #[case("deploy", "edploy")]
    #[case("deploy", "dpeloy")]
    #[case("deploy", "deploy")] // identity: distance 0
    fn damerau_adjacent_transposition(#[case] a: &str, #[case] b: &str) {
        let expected = usize::from(a != b);
        check!(damerau_levenshtein_distance(a, b) == expected);
    }

    #[test]
    fn damerau_counts_double_transposition_as_two() {
        // Two independent adjacent swaps. Plain Levenshtein needs three edits
        // for this pair, which is what separates the two algorithms.
        check!(damerau_levenshtein_distance("abcd", "badc") == 2);
        check!(levenshtein_distance("abcd", "badc") == 3);
    }

    #[test]
    fn trigrams_pad_and_window() {
        let grams = trigrams("ab");
        check!(grams == vec!["$$a", "$ab", "ab$", "b$$"]);
    }

    #[test]
    fn trigram_similarity_symmetric_and_bounded() {
        let pairs = [("deploy", "deployment"), ("user", "usage"), ("x", "y")];
        for (a, b) in pairs {
            let forward = trigram_similarity(a, b);
            let backward = trigram_similarity(b, a);
            check!(forward == backward);
            check!((0.0..=1.0).contains(&forward));
        }
    }

    #[test]
    fn trigram_similarity_identity_short_circuits() {
        check!(trigram_similarity("identical", "identical") == 1.0);
        check!(trigram_similarity("", "") == 1.0);
    }

    #[test]
    fn trigram_similarity_disjoint_terms_score_zero() {
        // No shared interior characters and different boundaries.
        let score = trigram_similarity("aaaa", "zzzz");
        check!(score == 0.0);
    }
}
