//! Query input parsing: quoted phrases and scoring tokens.

use crate::tokenize;

/// Splits raw query input into search terms and scoring tokens.
///
/// Terms honor `"…"` quoting: unquoted words split on whitespace, quoted
/// runs keep their whitespace and come out as single terms, adjacent quoted
/// runs stay separate, an unclosed quote takes the rest of the input, and
/// empty quotes vanish. Tokens are the deduplicated union of each term's
/// tokenization — the same pipeline the indexer ran, so query and index
/// terms compare equal.
pub fn parse_query_input(raw: &str) -> (Vec<String>, Vec<String>) {
    let mut terms: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut flush = |current: &mut String, terms: &mut Vec<String>| {
        if !current.is_empty() {
            terms.push(std::mem::take(current));
        }
    };

    for c in raw.chars() {
        if c == '"' {
            // A quote boundary always ends the current term, whichever side
            // of it we were on.
            flush(&mut current, &mut terms);
            in_quotes = !in_quotes;
        } else if c.is_whitespace() && !in_quotes {
            flush(&mut current, &mut terms);
        } else {
            current.push(c);
        }
    }
    flush(&mut current, &mut terms);

    let mut tokens: Vec<String> = Vec::new();
    for term in &terms {
        for token in tokenize::tokenize_query(term) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }

    (terms, tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("alpha beta", &["alpha", "beta"])]
    #[case("\"alpha beta\"", &["alpha beta"])]
    #[case("\"a b\"\"c d\"", &["a b", "c d"])]
    #[case("one \"two three\" four", &["one", "two three", "four"])]
    #[case("\"unclosed tail", &["unclosed tail"])]
    #[case("\"\" empty", &["empty"])]
    #[case("", &[])]
    #[case("   \t ", &[])]
    fn terms_follow_quoting_rules(#[case] raw: &str, #[case] expected: &[&str]) {
        let (terms, _) = parse_query_input(raw);
        let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
        check!(terms == expected);
    }

    #[test]
    fn tokens_are_deduplicated_union() {
        let (_, tokens) = parse_query_input("userLogin \"user login\"");
        // Both the identifier and the phrase tokenize to the same pair.
        check!(tokens == vec!["user".to_string(), "login".to_string()]);
    }

    #[test]
    fn tokens_match_index_tokenization() {
        let (_, tokens) = parse_query_input("parseHTMLDocument");
        check!(tokens == tokenize::tokenize("parseHTMLDocument"));
    }

    #[test]
    fn empty_input_yields_empty_pair() {
        let (terms, tokens) = parse_query_input("  ");
        check!(terms.is_empty());
        check!(tokens.is_empty());
    }

    #[test]
    fn quoted_whitespace_is_preserved_inside_terms() {
        let (terms, _) = parse_query_input("\"  spaced  out  \"");
        check!(terms == vec!["  spaced  out  ".to_string()]);
    }
}
