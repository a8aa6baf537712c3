//! End-to-end tests for the query path: parse → rank → snippets.

mod common;

use assert2::check;
use common::{IndexFixture, path_ends_with, tokens};
use mneme::search::{
    self, RankOptions, TrigramIndex, autocorrect_term, extract_snippets, parse_query_input, rank,
    rank_two_pass,
};
use std::path::Path;
use std::sync::Arc;

/// BM25 ranking scenario: higher term frequency ranks first, documents
/// without the term never appear.
#[test]
fn bm25_ranking_orders_by_frequency() {
    let fixture = IndexFixture::with_files(&[
        ("heavy.rs", "user user user\n"),
        ("light.rs", "user\n"),
        ("other.rs", "config config config config config\n"),
    ]);
    fixture.build(10);
    let segment = fixture.store.load_all().unwrap();

    let results = rank(&segment, &tokens(&["user"]), &RankOptions::default());

    check!(results.len() == 2);
    check!(path_ends_with(&results[0].path, "heavy.rs"));
    check!(path_ends_with(&results[1].path, "light.rs"));
    check!(results[0].score > results[1].score);
}

/// Fusion + coverage scenario: a document containing every query term
/// outranks one repeating a single term heavily.
#[test]
fn full_coverage_outranks_frequent_partial_match() {
    let fixture = IndexFixture::with_files(&[
        ("both.rs", "find token\n"),
        ("loud.rs", "find find find find find\n"),
    ]);
    fixture.build(10);
    let segment = fixture.store.load_all().unwrap();

    let results = rank(&segment, &tokens(&["find", "token"]), &RankOptions::default());

    check!(path_ends_with(&results[0].path, "both.rs"));
    check!(results[0].match_count == 2);
}

/// Fuzzy correction scenario: a transposed query reaches the indexed term
/// through expansion, and auto-correction proposes the vocabulary term.
#[test]
fn fuzzy_expansion_and_autocorrection_recover_typos() {
    let fixture = IndexFixture::with_files(&[(
        "deploy.rs",
        "deploy deployment deployed\nconfig\n",
    )]);
    fixture.build(10);
    let segment = fixture.store.load_all().unwrap();

    // Expansion path: the typo still finds the document.
    let results = rank(&segment, &tokens(&["deplyo"]), &RankOptions::default());
    check!(results.len() == 1);
    check!(results[0].matched_terms.contains(&"deploy".to_string()));

    // Auto-correction path: the raw term corrects to "deploy".
    let trigram = TrigramIndex::from_segment(&segment);
    let correction = autocorrect_term(&segment, &trigram, "deplyo");
    check!(correction.changed);
    check!(correction.terms == vec!["deploy".to_string()]);
}

/// Snippet scenario: two highlights on the multi-match line, leading
/// whitespace trimmed with offsets shifted, output sorted by line number.
#[test]
fn snippets_highlight_and_trim() {
    let fixture = IndexFixture::with_files(&[(
        "profile.rs",
        "user data\n   user profile matches here\nunrelated\n",
    )]);

    let path = fixture.doc_path("profile.rs");
    let snippets = extract_snippets(Path::new(&path), &tokens(&["user", "profil"])).unwrap();

    check!(snippets.len() == 2);
    check!(snippets[0].line_number == 1);
    check!(snippets[1].line_number == 2);

    let multi = &snippets[1];
    check!(multi.content == "user profile matches here");
    check!(multi.highlights.len() == 2);
    check!(multi.highlights[0].start == 0 && multi.highlights[0].end == 4);
    check!(multi.highlights[1].start == 5 && multi.highlights[1].end == 11);
}

#[test]
fn query_tokens_match_indexed_tokens() {
    let fixture = IndexFixture::with_files(&[("api.rs", "parseHTMLDocument handler\n")]);
    fixture.build(10);
    let segment = fixture.store.load_all().unwrap();

    // CamelCase query, snake_case-agnostic: same tokens as indexing.
    let (_, query_tokens) = parse_query_input("ParseHtmlDocument");
    let results = rank(&segment, &query_tokens, &RankOptions::default());
    check!(results.len() == 1);
}

#[test]
fn quoted_phrases_become_single_terms_but_score_by_token() {
    let fixture = IndexFixture::with_files(&[("notes.md", "error handling strategy\n")]);
    fixture.build(10);
    let segment = fixture.store.load_all().unwrap();

    let (terms, query_tokens) = parse_query_input("\"handling strategy\"");
    check!(terms == vec!["handling strategy".to_string()]);

    let results = rank(&segment, &query_tokens, &RankOptions::default());
    check!(results.len() == 1);
}

#[test]
fn empty_index_surfaces_no_segments_error() {
    let fixture = IndexFixture::with_files(&[]);
    let err = fixture.store.load_all().unwrap_err();
    check!(err.to_string() == "no segments found: please run index first");
}

#[tokio::test(flavor = "multi_thread")]
async fn two_pass_search_agrees_with_single_pass_on_exact_queries() {
    let fixture = IndexFixture::with_files(&[
        ("a.rs", "session handling\n"),
        ("b.rs", "session\n"),
    ]);
    fixture.build(10);
    let segment = Arc::new(fixture.store.load_all().unwrap());

    let single = rank(&segment, &tokens(&["session"]), &RankOptions::default());
    let double = rank_two_pass(
        Arc::clone(&segment),
        tokens(&["session"]),
        RankOptions::default(),
    )
    .await
    .unwrap();

    let single_ids: Vec<u32> = single.iter().map(|r| r.doc_id).collect();
    let double_ids: Vec<u32> = double.iter().map(|r| r.doc_id).collect();
    check!(single_ids == double_ids);
}

#[test]
fn simple_format_is_path_plus_collapsed_snippet() {
    let fixture = IndexFixture::with_files(&[("m.rs", "needle   in    haystack\n")]);
    let path = fixture.doc_path("m.rs");
    let snippets = extract_snippets(Path::new(&path), &tokens(&["needle"])).unwrap();

    let line = search::simple_format(&path, &snippets);
    check!(line == format!("{path}: needle in haystack"));
}
