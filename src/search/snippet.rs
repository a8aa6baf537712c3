//! Snippet extraction: match discovery, line selection, and focused
//! windowing around the first highlight.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lines kept per result.
pub const MAX_SNIPPETS_PER_RESULT: usize = 3;
/// Snippet content longer than this gets a focused window.
pub const MAX_SNIPPET_LENGTH: usize = 150;
/// Window slack on each side of the first match.
pub const CONTEXT_CHARS: usize = 30;
/// Simple-format output cap.
const SIMPLE_SNIPPET_LENGTH: usize = 80;
/// Tokens shorter than this only match on word boundaries; two- and
/// three-character tokens are substrings of half the dictionary.
const WORD_BOUNDARY_MAX_LEN: usize = 4;

/// Half-open highlight range in character offsets of the snippet content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
}

/// One matched line, trimmed and possibly windowed.
#[derive(Debug, Clone)]
pub struct Snippet {
    /// 1-based line number in the source file.
    pub line_number: usize,
    pub content: String,
    pub highlights: Vec<Highlight>,
}

struct Candidate {
    line_number: usize,
    line: String,
    highlights: Vec<Highlight>,
    score: u64,
}

/// Extracts up to [`MAX_SNIPPETS_PER_RESULT`] snippets for a document.
///
/// Lines score `100 × distinct matched tokens + match count`, so a line
/// containing several query terms beats any single-term line. The kept
/// lines are re-sorted by line number for coherent output.
pub fn extract_snippets(path: &Path, tokens: &[String]) -> std::io::Result<Vec<Snippet>> {
    let reader = BufReader::new(File::open(path)?);

    let mut candidates: Vec<Candidate> = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let (highlights, distinct) = find_matches(&line, tokens);
        if highlights.is_empty() {
            continue;
        }
        let score = 100 * distinct as u64 + highlights.len() as u64;
        candidates.push(Candidate {
            line_number: index + 1,
            line,
            highlights,
            score,
        });
    }

    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.line_number.cmp(&b.line_number))
    });
    candidates.truncate(MAX_SNIPPETS_PER_RESULT);
    candidates.sort_by_key(|c| c.line_number);

    Ok(candidates.into_iter().map(into_snippet).collect())
}

/// Finds non-overlapping case-insensitive token matches in one line.
///
/// Longer tokens scan first and claim character positions; shorter tokens
/// cannot overlap them (a short token swallowed by a longer match stays
/// swallowed). Tokens under [`WORD_BOUNDARY_MAX_LEN`] chars additionally
/// require non-word characters on both sides. Returns the merged, sorted
/// ranges plus the count of distinct tokens that matched.
pub fn find_matches(line: &str, tokens: &[String]) -> (Vec<Highlight>, usize) {
    let chars: Vec<char> = line.chars().collect();
    let folded: Vec<char> = chars.iter().map(fold_char).collect();

    let mut order: Vec<&String> = tokens.iter().collect();
    order.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));

    let mut covered = vec![false; chars.len()];
    let mut ranges: Vec<Highlight> = Vec::new();
    let mut distinct = 0usize;

    for token in order {
        let needle: Vec<char> = token.chars().map(|c| fold_char(&c)).collect();
        if needle.is_empty() || needle.len() > chars.len() {
            continue;
        }

        let mut matched_here = false;
        let mut i = 0;
        while i + needle.len() <= chars.len() {
            let end = i + needle.len();
            let window_matches = folded[i..end] == needle[..];
            let free = window_matches && !covered[i..end].iter().any(|&c| c);
            let bounded = free
                && (needle.len() >= WORD_BOUNDARY_MAX_LEN
                    || ((i == 0 || !is_word_char(chars[i - 1]))
                        && (end == chars.len() || !is_word_char(chars[end]))));

            if bounded {
                covered[i..end].iter_mut().for_each(|c| *c = true);
                ranges.push(Highlight { start: i, end });
                matched_here = true;
                i = end;
            } else {
                i += 1;
            }
        }
        if matched_here {
            distinct += 1;
        }
    }

    ranges.sort_by_key(|r| r.start);
    (merge_ranges(ranges), distinct)
}

/// Merges sorted ranges into non-overlapping ones. Idempotent.
pub fn merge_ranges(ranges: Vec<Highlight>) -> Vec<Highlight> {
    let mut merged: Vec<Highlight> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Simple one-line format: the path plus the first snippet's content,
/// whitespace-collapsed and capped at 80 characters.
pub fn simple_format(path: &str, snippets: &[Snippet]) -> String {
    let Some(first) = snippets.first() else {
        return path.to_string();
    };
    let collapsed: String = first.content.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(SIMPLE_SNIPPET_LENGTH).collect();
    if capped.chars().count() < collapsed.chars().count() {
        format!("{path}: {capped}...")
    } else {
        format!("{path}: {capped}")
    }
}

fn into_snippet(candidate: Candidate) -> Snippet {
    let chars: Vec<char> = candidate.line.chars().collect();

    // Trim surrounding whitespace, shifting highlights by the leading cut.
    let leading = chars.iter().take_while(|c| c.is_whitespace()).count();
    let trailing_end = chars.len() - chars.iter().rev().take_while(|c| c.is_whitespace()).count();
    let trimmed: Vec<char> = chars[leading..trailing_end.max(leading)].to_vec();

    let mut highlights: Vec<Highlight> = candidate
        .highlights
        .into_iter()
        .filter_map(|h| {
            let start = h.start.checked_sub(leading)?;
            let end = h.end.checked_sub(leading)?;
            (end <= trimmed.len()).then_some(Highlight { start, end })
        })
        .collect();

    if trimmed.len() > MAX_SNIPPET_LENGTH
        && let Some(&first) = highlights.first()
    {
        let (content, highlights) = focused_window(&trimmed, first, highlights.clone());
        return Snippet {
            line_number: candidate.line_number,
            content,
            highlights,
        };
    }

    let content: String = trimmed.iter().collect();
    highlights.retain(|h| h.end <= content.chars().count());
    Snippet {
        line_number: candidate.line_number,
        content,
        highlights,
    }
}

/// Builds a window centered on the first match, expanded outward to the
/// nearest whitespace so words aren't cut, with `...` affixes where the
/// line was truncated. Highlights outside the window are dropped; the rest
/// shift by the window start and the prefix length.
fn focused_window(
    chars: &[char],
    first: Highlight,
    highlights: Vec<Highlight>,
) -> (String, Vec<Highlight>) {
    let mut win_start = first.start.saturating_sub(CONTEXT_CHARS);
    while win_start > 0 && !chars[win_start - 1].is_whitespace() {
        win_start -= 1;
    }
    let mut win_end = (first.end + CONTEXT_CHARS).min(chars.len());
    while win_end < chars.len() && !chars[win_end].is_whitespace() {
        win_end += 1;
    }

    let prefix = if win_start > 0 { "..." } else { "" };
    let suffix = if win_end < chars.len() { "..." } else { "" };

    let body: String = chars[win_start..win_end].iter().collect();
    let content = format!("{prefix}{body}{suffix}");

    let shift = prefix.chars().count();
    let shifted = highlights
        .into_iter()
        .filter(|h| h.start >= win_start && h.end <= win_end)
        .map(|h| Highlight {
            start: h.start - win_start + shift,
            end: h.end - win_start + shift,
        })
        .collect();

    (content, shifted)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn fold_char(c: &char) -> char {
    c.to_lowercase().next().unwrap_or(*c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn file_with(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", lines.join("\n")).unwrap();
        file
    }

    #[test]
    fn finds_case_insensitive_matches() {
        let (ranges, distinct) = find_matches("UserProfile user", &tokens(&["user"]));
        check!(ranges == vec![Highlight { start: 0, end: 4 }, Highlight { start: 12, end: 16 }]);
        check!(distinct == 1);
    }

    #[test]
    fn longer_tokens_claim_positions_first() {
        // "username" wins the overlap; "user" still matches elsewhere.
        let (ranges, distinct) = find_matches("username and user", &tokens(&["user", "username"]));
        check!(ranges.len() == 2);
        check!(ranges[0] == Highlight { start: 0, end: 8 });
        check!(ranges[1] == Highlight { start: 13, end: 17 });
        check!(distinct == 2);
    }

    #[test]
    fn short_tokens_require_word_boundaries() {
        let (ranges, _) = find_matches("id identity grid", &tokens(&["id"]));
        // Only the standalone "id" matches; "identity" and "grid" embed it.
        check!(ranges == vec![Highlight { start: 0, end: 2 }]);
    }

    #[test]
    fn short_token_swallowed_by_longer_match_stays_swallowed() {
        let (ranges, distinct) = find_matches("grid", &tokens(&["grid", "id"]));
        check!(ranges == vec![Highlight { start: 0, end: 4 }]);
        check!(distinct == 1);
    }

    #[test]
    fn merge_ranges_is_idempotent_and_sorted() {
        let ranges = vec![
            Highlight { start: 0, end: 4 },
            Highlight { start: 3, end: 6 },
            Highlight { start: 10, end: 12 },
        ];
        let merged = merge_ranges(ranges);
        check!(merged == vec![Highlight { start: 0, end: 6 }, Highlight { start: 10, end: 12 }]);
        check!(merge_ranges(merged.clone()) == merged);
    }

    #[test]
    fn extracts_trimmed_snippets_sorted_by_line() {
        let file = file_with(&[
            "user data",
            "   user profile matches here",
            "unrelated",
        ]);
        let snippets = extract_snippets(file.path(), &tokens(&["user", "profil"])).unwrap();

        check!(snippets.len() == 2);
        // Sorted by line number even though line 2 scored higher.
        check!(snippets[0].line_number == 1);
        check!(snippets[1].line_number == 2);

        let second = &snippets[1];
        check!(second.content == "user profile matches here");
        // Leading whitespace trimmed, offsets shifted accordingly.
        check!(second.highlights.len() == 2);
        check!(second.highlights[0] == Highlight { start: 0, end: 4 });
        check!(second.highlights[1] == Highlight { start: 5, end: 11 });
    }

    #[test]
    fn multi_term_lines_outscore_single_term_lines() {
        let mut lines = vec!["alpha beta"];
        let filler: Vec<String> = (0..5).map(|i| format!("alpha {i}")).collect();
        lines.extend(filler.iter().map(String::as_str));
        let file = file_with(&lines);

        let snippets = extract_snippets(file.path(), &tokens(&["alpha", "beta"])).unwrap();
        check!(snippets.len() == MAX_SNIPPETS_PER_RESULT);
        // The two-term line survives selection despite being first by score,
        // and output stays line-ordered.
        check!(snippets[0].line_number == 1);
    }

    #[test]
    fn long_lines_get_a_focused_window() {
        let padding = "word ".repeat(30);
        let line = format!("{padding}needle {padding}");
        let file = file_with(&[line.as_str()]);

        let snippets = extract_snippets(file.path(), &tokens(&["needle"])).unwrap();
        let snippet = &snippets[0];

        check!(snippet.content.starts_with("..."));
        check!(snippet.content.ends_with("..."));
        check!(snippet.content.chars().count() < line.chars().count());
        check!(snippet.highlights.len() == 1);

        // The highlight still covers the needle after shifting.
        let chars: Vec<char> = snippet.content.chars().collect();
        let h = snippet.highlights[0];
        let highlighted: String = chars[h.start..h.end].iter().collect();
        check!(highlighted == "needle");
    }

    #[test]
    fn no_matches_no_snippets() {
        let file = file_with(&["nothing relevant here"]);
        let snippets = extract_snippets(file.path(), &tokens(&["absent"])).unwrap();
        check!(snippets.is_empty());
    }

    #[test]
    fn simple_format_collapses_and_caps() {
        let snippets = vec![Snippet {
            line_number: 1,
            content: "  spaced    out   content  ".to_string(),
            highlights: vec![],
        }];
        let formatted = simple_format("src/lib.rs", &snippets);
        check!(formatted == "src/lib.rs: spaced out content");

        let long = Snippet {
            line_number: 1,
            content: "word ".repeat(40),
            highlights: vec![],
        };
        let formatted = simple_format("src/lib.rs", &[long]);
        check!(formatted.ends_with("..."));
    }
}
