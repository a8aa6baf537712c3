//! Relevance scoring: BM25, vector-space cosine, and weighted fusion.

use ahash::AHashMap;

use crate::index::segment::Segment;

/// BM25 term-frequency saturation parameter.
pub const BM25_K1: f64 = 1.5;
/// BM25 length-normalization parameter.
pub const BM25_B: f64 = 0.75;

/// Default fusion weight on the normalized BM25 score.
pub const DEFAULT_BM25_WEIGHT: f64 = 0.7;
/// Default fusion weight on the VSM cosine score.
pub const DEFAULT_VSM_WEIGHT: f64 = 0.3;

/// Weights for combining normalized BM25 with VSM cosine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub bm25: f64,
    pub vsm: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            bm25: DEFAULT_BM25_WEIGHT,
            vsm: DEFAULT_VSM_WEIGHT,
        }
    }
}

impl FusionWeights {
    /// Builds weights from configuration. Either weight being non-positive
    /// falls back to the default pair — a zeroed weight silently disabling
    /// a scorer is always a config mistake.
    pub fn from_config(bm25: f64, vsm: f64) -> Self {
        if bm25 > 0.0 && vsm > 0.0 {
            Self { bm25, vsm }
        } else {
            Self::default()
        }
    }
}

/// Smoothed inverse document frequency: `ln((N − df + 0.5)/(df + 0.5) + 1)`.
/// Non-negative for every `df ≤ N`.
pub fn idf(doc_freq: usize, total_docs: usize) -> f64 {
    let n = total_docs as f64;
    let df = doc_freq as f64;
    (((n - df + 0.5) / (df + 0.5)) + 1.0).ln()
}

/// BM25 scores for every document matching at least one query token.
pub fn bm25_scores(segment: &Segment, tokens: &[String]) -> AHashMap<u32, f64> {
    let total_docs = segment.total_docs as usize;
    let avg_doc_len = segment.avg_doc_len_or_fallback();
    let mut scores: AHashMap<u32, f64> = AHashMap::new();

    for token in tokens {
        let Some(postings) = segment.postings(token) else {
            continue;
        };
        let idf = idf(postings.len(), total_docs);

        for posting in postings {
            let tf = f64::from(posting.freq);
            let doc_len = segment
                .doc(posting.doc_id)
                .map_or(0.0, |d| f64::from(d.token_count));
            let denom = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / avg_doc_len);
            let term_score = idf * (tf * (BM25_K1 + 1.0)) / denom;
            *scores.entry(posting.doc_id).or_insert(0.0) += term_score;
        }
    }
    scores
}

/// Cosine similarity between the TF-IDF query vector and each matching
/// document's vector, in `[0, 1]`.
///
/// Both vectors use log-normalized term frequency `(1 + ln tf) × idf` and
/// document vectors are built only over the query tokens the document
/// actually contains.
pub fn vsm_scores(segment: &Segment, tokens: &[String]) -> AHashMap<u32, f64> {
    let total_docs = segment.total_docs as usize;

    // Query-side term frequencies (tokens may repeat).
    let mut query_tf: AHashMap<&str, u32> = AHashMap::new();
    for token in tokens {
        *query_tf.entry(token.as_str()).or_insert(0) += 1;
    }

    // Sparse query vector plus its L2 norm, computed once.
    let mut query_weights: AHashMap<&str, f64> = AHashMap::new();
    let mut query_norm_sq = 0.0;
    for (&term, &tf) in &query_tf {
        let df = segment.document_frequency(term);
        if df == 0 {
            continue;
        }
        let weight = (1.0 + f64::from(tf).ln()) * idf(df, total_docs);
        query_norm_sq += weight * weight;
        query_weights.insert(term, weight);
    }
    let query_norm = query_norm_sq.sqrt();
    if query_norm == 0.0 {
        return AHashMap::new();
    }

    // Per-document dot products and norms over the shared support.
    let mut dot: AHashMap<u32, f64> = AHashMap::new();
    let mut doc_norm_sq: AHashMap<u32, f64> = AHashMap::new();
    for (&term, &query_weight) in &query_weights {
        let Some(postings) = segment.postings(term) else {
            continue;
        };
        let idf = idf(postings.len(), total_docs);
        for posting in postings {
            let doc_weight = (1.0 + f64::from(posting.freq).ln()) * idf;
            *dot.entry(posting.doc_id).or_insert(0.0) += query_weight * doc_weight;
            *doc_norm_sq.entry(posting.doc_id).or_insert(0.0) += doc_weight * doc_weight;
        }
    }

    dot.into_iter()
        .filter_map(|(doc_id, dot)| {
            let norm = doc_norm_sq.get(&doc_id).copied().unwrap_or(0.0).sqrt();
            if norm == 0.0 {
                return None;
            }
            Some((doc_id, (dot / (query_norm * norm)).clamp(0.0, 1.0)))
        })
        .collect()
}

/// Fuses BM25 and VSM maps: BM25 is normalized by its batch maximum (zero
/// when every score is zero), then the two are combined with the given
/// weights over the union of documents.
pub fn fuse(
    bm25: &AHashMap<u32, f64>,
    vsm: &AHashMap<u32, f64>,
    weights: FusionWeights,
) -> AHashMap<u32, f64> {
    let max_bm25 = bm25.values().copied().fold(0.0f64, f64::max);

    let mut combined: AHashMap<u32, f64> = AHashMap::new();
    for (&doc_id, &score) in bm25 {
        let normalized = if max_bm25 > 0.0 { score / max_bm25 } else { 0.0 };
        combined.insert(doc_id, weights.bm25 * normalized);
    }
    for (&doc_id, &score) in vsm {
        *combined.entry(doc_id).or_insert(0.0) += weights.vsm * score;
    }
    combined
}

/// Term-coverage boost factor: `coverage^1.5`.
///
/// Identity at full coverage, zero at none, smooth and strictly monotone in
/// between (half coverage ≈ 0.35×).
pub fn coverage_boost(coverage: f64) -> f64 {
    coverage * coverage.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    /// Three docs: doc 1 "user"×3, doc 2 "user"×1, doc 3 "config"×5.
    fn fixture() -> Segment {
        let mut segment = Segment::default();
        segment.add_document(1, "one.rs".into(), 3, vec![("user".to_string(), 3)]);
        segment.add_document(2, "two.rs".into(), 1, vec![("user".to_string(), 1)]);
        segment.add_document(3, "three.rs".into(), 5, vec![("config".to_string(), 5)]);
        segment.finalize();
        segment
    }

    fn query(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn idf_is_smoothed_and_nonnegative() {
        check!(idf(0, 10) > 0.0);
        check!(idf(10, 10) > 0.0);
        check!(idf(1, 10) > idf(5, 10));
    }

    #[test]
    fn bm25_ranks_higher_tf_first_and_omits_nonmatches() {
        let segment = fixture();
        let scores = bm25_scores(&segment, &query(&["user"]));

        check!(scores.len() == 2);
        check!(scores[&1] > scores[&2]);
        check!(!scores.contains_key(&3));
    }

    #[test]
    fn bm25_is_monotone_in_tf() {
        let mut low = Segment::default();
        low.add_document(1, "a.rs".into(), 10, vec![("term".to_string(), 2)]);
        low.add_document(2, "b.rs".into(), 10, vec![("other".to_string(), 1)]);
        low.finalize();

        let mut high = low.clone();
        high.inverted_index.get_mut("term").unwrap()[0].freq = 5;

        let tokens = query(&["term"]);
        let score_low = bm25_scores(&low, &tokens)[&1];
        let score_high = bm25_scores(&high, &tokens)[&1];
        check!(score_high >= score_low);
    }

    #[test]
    fn bm25_survives_zero_avg_doc_len() {
        let mut segment = fixture();
        segment.avg_doc_len = 0; // falls back to the docs' mean
        let scores = bm25_scores(&segment, &query(&["user"]));
        check!(scores.values().all(|s| s.is_finite()));
    }

    #[test]
    fn vsm_scores_are_bounded() {
        let segment = fixture();
        let scores = vsm_scores(&segment, &query(&["user", "config"]));
        check!(!scores.is_empty());
        check!(scores.values().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn vsm_identical_single_term_vectors_hit_one() {
        let segment = fixture();
        // Query "user" once: query weight and doc weight differ by tf scale
        // only, and a single shared dimension always gives cosine 1.
        let scores = vsm_scores(&segment, &query(&["user"]));
        check!((scores[&1] - 1.0).abs() < 1e-9);
        check!((scores[&2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn vsm_disjoint_support_scores_nothing() {
        let segment = fixture();
        let scores = vsm_scores(&segment, &query(&["missing"]));
        check!(scores.is_empty());
    }

    #[test]
    fn fusion_normalizes_bm25_by_batch_max() {
        let bm25: AHashMap<u32, f64> = [(1, 4.0), (2, 2.0)].into_iter().collect();
        let vsm: AHashMap<u32, f64> = AHashMap::new();
        let combined = fuse(&bm25, &vsm, FusionWeights::default());

        check!((combined[&1] - DEFAULT_BM25_WEIGHT).abs() < 1e-9);
        check!((combined[&2] - DEFAULT_BM25_WEIGHT / 2.0).abs() < 1e-9);
    }

    #[test]
    fn equal_weights_give_the_arithmetic_mean() {
        let bm25: AHashMap<u32, f64> = [(1, 2.0)].into_iter().collect();
        let vsm: AHashMap<u32, f64> = [(1, 0.6)].into_iter().collect();
        let combined = fuse(&bm25, &vsm, FusionWeights { bm25: 0.5, vsm: 0.5 });

        // Normalized BM25 is 1.0 here, so the mean of (1.0, 0.6).
        check!((combined[&1] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn all_zero_bm25_batch_normalizes_to_zero() {
        let bm25: AHashMap<u32, f64> = [(1, 0.0)].into_iter().collect();
        let vsm: AHashMap<u32, f64> = [(1, 0.4)].into_iter().collect();
        let combined = fuse(&bm25, &vsm, FusionWeights::default());
        check!((combined[&1] - DEFAULT_VSM_WEIGHT * 0.4).abs() < 1e-9);
    }

    #[test]
    fn nonpositive_config_weights_fall_back() {
        check!(FusionWeights::from_config(0.0, 0.3) == FusionWeights::default());
        check!(FusionWeights::from_config(0.7, -1.0) == FusionWeights::default());
        let custom = FusionWeights::from_config(0.9, 0.1);
        check!(custom.bm25 == 0.9 && custom.vsm == 0.1);
    }

    #[test]
    fn coverage_boost_endpoints_and_monotonicity() {
        check!(coverage_boost(0.0) == 0.0);
        check!(coverage_boost(1.0) == 1.0);
        let half = coverage_boost(0.5);
        check!((half - 0.3535).abs() < 1e-3);
        check!(coverage_boost(0.25) < half);
        check!(half < coverage_boost(0.75));
    }
}
