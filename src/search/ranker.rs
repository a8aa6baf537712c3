//! Ranked retrieval: fuzzy-aware scoring, coverage boost, Top-K selection.

use ahash::AHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Result;
use crate::index::segment::Segment;
use crate::search::fuzzy::{self, TrigramIndex};
use crate::search::scoring::{self, FusionWeights};
use crate::search::topk::TopK;

/// One ranked search hit.
#[derive(Debug, Clone)]
pub struct RankedDoc {
    pub doc_id: u32,
    pub path: String,
    pub score: f64,
    /// Distinct search tokens the document matched.
    pub match_count: u32,
    /// The matching tokens, in search-token order.
    pub matched_terms: Vec<String>,
}

// Total order for ranking: score, then match count, then path ascending as
// the final deterministic tie-break. Greater = ranks earlier.
impl Ord for RankedDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| self.match_count.cmp(&other.match_count))
            .then_with(|| other.path.cmp(&self.path))
    }
}

impl PartialOrd for RankedDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankedDoc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedDoc {}

/// Ranking configuration.
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Maximum results returned.
    pub limit: usize,
    pub weights: FusionWeights,
    /// Multiplier applied to fuzzy-pass scores in the two-pass ranker.
    pub fuzzy_penalty: f64,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            weights: FusionWeights::default(),
            fuzzy_penalty: 0.6,
        }
    }
}

/// Original query token plus its expansion set (the original first, fuzzy
/// replacements after).
type Expansion = (String, Vec<String>);

/// Default single-pass ranking with inline fuzzy expansion.
///
/// Tokens missing from the vocabulary are expanded through the trigram
/// index (built lazily, only when a miss occurs); scoring runs over the
/// union of originals and replacements; the coverage boost counts an
/// original as covered when *any* member of its expansion set matches.
pub fn rank(segment: &Segment, query_tokens: &[String], opts: &RankOptions) -> Vec<RankedDoc> {
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut trigram: Option<TrigramIndex> = None;
    let mut expansions: Vec<Expansion> = Vec::new();
    for token in query_tokens {
        let mut set = vec![token.clone()];
        if !segment.contains_term(token) {
            let index = trigram.get_or_insert_with(|| TrigramIndex::from_segment(segment));
            for replacement in fuzzy::expand_token(index, token) {
                if !set.contains(&replacement) {
                    set.push(replacement);
                }
            }
        }
        expansions.push((token.clone(), set));
    }

    let candidates = score_with_expansions(segment, &expansions, opts.weights);
    select_top(candidates, opts.limit)
}

/// Two-pass variant: exact and fuzzy scoring run in parallel, the fuzzy
/// side is penalized, and the passes merge by summing per-document scores
/// (exact first, matched terms unioned).
pub async fn rank_two_pass(
    segment: Arc<Segment>,
    query_tokens: Vec<String>,
    opts: RankOptions,
) -> Result<Vec<RankedDoc>> {
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }

    let exact_segment = Arc::clone(&segment);
    let exact_tokens = query_tokens.clone();
    let weights = opts.weights;
    let exact_task = tokio::task::spawn_blocking(move || {
        let expansions: Vec<Expansion> = exact_tokens
            .iter()
            .map(|t| (t.clone(), vec![t.clone()]))
            .collect();
        score_with_expansions(&exact_segment, &expansions, weights)
    });

    let fuzzy_segment = Arc::clone(&segment);
    let fuzzy_tokens = query_tokens.clone();
    let fuzzy_task = tokio::task::spawn_blocking(move || {
        let missing: Vec<&String> = fuzzy_tokens
            .iter()
            .filter(|t| !fuzzy_segment.contains_term(t))
            .collect();
        if missing.is_empty() {
            return Vec::new();
        }
        let index = TrigramIndex::from_segment(&fuzzy_segment);
        let expansions: Vec<Expansion> = missing
            .into_iter()
            .filter_map(|token| {
                let replacements = fuzzy::expand_token(&index, token);
                if replacements.is_empty() {
                    None
                } else {
                    Some((token.clone(), replacements))
                }
            })
            .collect();
        score_with_expansions(&fuzzy_segment, &expansions, weights)
    });

    // Join order is fixed: the exact pass seeds the merge map, fuzzy folds in.
    let (exact, fuzzy) = tokio::try_join!(exact_task, fuzzy_task)?;

    let penalty = opts.fuzzy_penalty.clamp(0.0, 1.0);
    let mut merged: AHashMap<u32, RankedDoc> = exact
        .into_iter()
        .map(|doc| (doc.doc_id, doc))
        .collect();
    for mut doc in fuzzy {
        doc.score *= penalty;
        match merged.entry(doc.doc_id) {
            std::collections::hash_map::Entry::Occupied(mut existing) => {
                let existing = existing.get_mut();
                existing.score += doc.score;
                for term in doc.matched_terms {
                    if !existing.matched_terms.contains(&term) {
                        existing.matched_terms.push(term);
                    }
                }
                existing.match_count = existing.matched_terms.len() as u32;
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(doc);
            }
        }
    }

    Ok(select_top(merged.into_values().collect(), opts.limit))
}

/// Scores one expansion table: fused BM25 + VSM over the search-token
/// union, then the term-coverage boost. Returns every positive-score
/// candidate, unbounded — Top-K selection happens after any merging.
fn score_with_expansions(
    segment: &Segment,
    expansions: &[Expansion],
    weights: FusionWeights,
) -> Vec<RankedDoc> {
    if expansions.is_empty() {
        return Vec::new();
    }

    // Union of originals (first) and replacements, deduplicated.
    let mut search_tokens: Vec<String> = Vec::new();
    for (original, _) in expansions {
        if !search_tokens.contains(original) {
            search_tokens.push(original.clone());
        }
    }
    for (_, set) in expansions {
        for token in set {
            if !search_tokens.contains(token) {
                search_tokens.push(token.clone());
            }
        }
    }

    let bm25 = scoring::bm25_scores(segment, &search_tokens);
    let vsm = scoring::vsm_scores(segment, &search_tokens);
    let mut fused = scoring::fuse(&bm25, &vsm, weights);

    // Which search tokens hit which documents.
    let mut matched: AHashMap<u32, Vec<String>> = AHashMap::new();
    for token in &search_tokens {
        if let Some(postings) = segment.postings(token) {
            for posting in postings {
                matched
                    .entry(posting.doc_id)
                    .or_default()
                    .push(token.clone());
            }
        }
    }

    let originals = expansions.len() as f64;
    let mut out = Vec::with_capacity(fused.len());
    for (doc_id, score) in fused.drain() {
        let terms = matched.remove(&doc_id).unwrap_or_default();
        let covered = expansions
            .iter()
            .filter(|(_, set)| set.iter().any(|t| terms.contains(t)))
            .count();
        let coverage = covered as f64 / originals;
        let boosted = score * scoring::coverage_boost(coverage);

        let Some(doc) = segment.doc(doc_id) else {
            continue;
        };
        out.push(RankedDoc {
            doc_id,
            path: doc.path.clone(),
            score: boosted,
            match_count: terms.len() as u32,
            matched_terms: terms,
        });
    }
    out
}

/// Heap-selects the best `limit` positive-score candidates, descending.
fn select_top(candidates: Vec<RankedDoc>, limit: usize) -> Vec<RankedDoc> {
    let mut topk = TopK::new(limit);
    for candidate in candidates {
        if candidate.score > 0.0 {
            topk.push(candidate);
        }
    }
    topk.into_sorted_vec()
}
