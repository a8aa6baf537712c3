//! JSON-aware tokenization.
//!
//! Structured JSON carries its searchable text in object keys and string
//! values; numbers, booleans, and nulls are noise. Content that fails to
//! parse falls back to the generic pipeline.

use serde_json::Value;

use super::stopwords::filter_stopwords;
use super::{tokenize, tokenize_unfiltered};

/// Tokenizes JSON content from keys and string values, recursively.
///
/// Invalid JSON is tokenized generically instead. The stopword filter runs
/// once over the combined stream.
pub fn tokenize_json(content: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(content) {
        Ok(value) => {
            let mut tokens = Vec::new();
            walk(&value, &mut tokens);
            filter_stopwords(tokens)
        }
        Err(_) => tokenize(content),
    }
}

fn walk(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                tokenize_unfiltered(key, out);
                walk(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        Value::String(text) => tokenize_unfiltered(text, out),
        // Numbers, booleans, and null carry no searchable text.
        Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
}
