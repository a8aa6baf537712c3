//! Content tokenization pipeline.
//!
//! `tokenize` is pure and deterministic, and the same pipeline serves both
//! indexing and querying so scores compare like with like. Stages, in order:
//! binary detection, script branch (CJK-bearing text goes through the word
//! segmenter, everything else through the code path), identifier splitting,
//! stemming, stopword filtering.

mod cjk;
mod identifier;
mod json;
mod stopwords;

pub use json::tokenize_json;
pub use stopwords::{filter_stopwords, is_stopword};

pub(crate) use identifier::split_identifier;

/// How many leading bytes are examined for binary detection.
const BINARY_SAMPLE_BYTES: usize = 1024;

/// Fraction of non-printable characters in the sample above which the
/// content is treated as binary.
const BINARY_NON_PRINTABLE_RATIO: f64 = 0.30;

/// Tokenizes document or query content into normalized search terms.
///
/// Binary-looking content yields no tokens. Otherwise identifiers are split
/// on snake/camel/acronym/digit boundaries, lowercased, stemmed, and run
/// through the stopword filter; CJK text is segmented into words which are
/// lowercased but never stemmed.
pub fn tokenize(content: &str) -> Vec<String> {
    if content.is_empty() || is_binary(content) {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    tokenize_unfiltered(content, &mut tokens);
    stopwords::filter_stopwords(tokens)
}

/// Query tokenization is identical to content tokenization.
pub fn tokenize_query(query: &str) -> Vec<String> {
    tokenize(query)
}

/// Runs the script branch and splitting stages without the stopword pass.
/// The JSON tokenizer calls this per fragment and filters once at the end.
pub(crate) fn tokenize_unfiltered(text: &str, out: &mut Vec<String>) {
    if cjk::contains_cjk(text) {
        tokenize_mixed(text, out);
    } else {
        tokenize_code(text, out);
    }
}

/// Code path: accumulate `[letter digit _]` runs, flush each through the
/// identifier splitter.
fn tokenize_code(text: &str, out: &mut Vec<String>) {
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            current.push(c);
        } else if !current.is_empty() {
            identifier::process_identifier(&current, out);
            current.clear();
        }
    }
    if !current.is_empty() {
        identifier::process_identifier(&current, out);
    }
}

/// Mixed path: word-segment the text; CJK segments are emitted lowercased
/// and unstemmed, everything else rejoins the code path.
fn tokenize_mixed(text: &str, out: &mut Vec<String>) {
    for segment in cjk::segment(text) {
        if cjk::contains_cjk(segment) {
            out.push(segment.to_lowercase());
        } else {
            tokenize_code(segment, out);
        }
    }
}

/// Binary sniffing over the first [`BINARY_SAMPLE_BYTES`] of content.
///
/// A NUL byte is conclusive. Otherwise the sample is binary when more than
/// [`BINARY_NON_PRINTABLE_RATIO`] of its characters are non-printable —
/// control characters other than `\n`, `\r`, `\t`, or the U+FFFD
/// replacement character left behind by lossy decoding of raw bytes.
fn is_binary(content: &str) -> bool {
    let mut end = content.len().min(BINARY_SAMPLE_BYTES);
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let sample = &content[..end];

    if sample.as_bytes().contains(&0) {
        return true;
    }

    let mut total = 0usize;
    let mut suspect = 0usize;
    for c in sample.chars() {
        total += 1;
        let printable = !c.is_control() || matches!(c, '\n' | '\r' | '\t');
        if !printable || c == '\u{FFFD}' {
            suspect += 1;
        }
    }

    total > 0 && (suspect as f64) > (total as f64) * BINARY_NON_PRINTABLE_RATIO
}
