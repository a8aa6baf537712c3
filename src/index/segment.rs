//! In-memory segment model with binary (postcard) serialization.
//!
//! A segment is either one on-disk chunk or the query-time merge of every
//! complete chunk. Chunk files are postcard-encoded: length-prefixed strings
//! and sequences, varint integers. The struct field order is the wire
//! format — append new fields at the end only; postcard rejects a layout
//! that doesn't decode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

use crate::error::StoreError;

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Global, monotonically assigned, never reused across chunks.
    pub id: u32,
    pub path: String,
    pub token_count: u32,
}

/// One (term, document) occurrence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: u32,
    pub freq: u32,
}

/// Documents plus their inverted index and aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    pub docs: Vec<Document>,
    /// Term → postings, each list in ascending `doc_id` order.
    pub inverted_index: HashMap<String, Vec<Posting>>,
    pub total_docs: u32,
    /// For a built chunk: the number of unique terms.
    pub total_tokens: u32,
    /// Arithmetic mean of `token_count` over `docs` (0 when empty).
    pub avg_doc_len: u32,
}

impl Segment {
    /// Append one document and its term frequencies. Postings land at the
    /// tail of each term list, so processing documents in ascending id
    /// order keeps every list sorted.
    pub fn add_document(
        &mut self,
        doc_id: u32,
        path: String,
        token_count: u32,
        frequencies: impl IntoIterator<Item = (String, u32)>,
    ) {
        for (term, freq) in frequencies {
            self.inverted_index
                .entry(term)
                .or_default()
                .push(Posting { doc_id, freq });
        }
        self.docs.push(Document {
            id: doc_id,
            path,
            token_count,
        });
    }

    /// Recomputes the aggregate fields from the current contents.
    pub fn finalize(&mut self) {
        self.total_docs = self.docs.len() as u32;
        self.total_tokens = self.inverted_index.len() as u32;
        self.avg_doc_len = if self.docs.is_empty() {
            0
        } else {
            let total: u64 = self.docs.iter().map(|d| u64::from(d.token_count)).sum();
            (total / self.docs.len() as u64) as u32
        };
    }

    /// Looks a document up by global id. Relies on `docs` being
    /// id-ascending, which both the builder and the chunk merge preserve.
    pub fn doc(&self, doc_id: u32) -> Option<&Document> {
        self.docs
            .binary_search_by_key(&doc_id, |d| d.id)
            .ok()
            .map(|idx| &self.docs[idx])
    }

    /// Postings for a term, when the term is in the vocabulary.
    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.inverted_index.get(term).map(Vec::as_slice)
    }

    /// Document frequency of a term.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.inverted_index.get(term).map_or(0, Vec::len)
    }

    /// Whether a term occurs anywhere in the segment.
    pub fn contains_term(&self, term: &str) -> bool {
        self.inverted_index.contains_key(term)
    }

    /// Every term in the segment. Iteration order is unspecified.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.inverted_index.keys().map(String::as_str)
    }

    /// Mean document length as a float, falling back to the docs when the
    /// persisted aggregate is zero, then to 1.0 to keep BM25's length
    /// normalization away from a zero divisor.
    pub fn avg_doc_len_or_fallback(&self) -> f64 {
        if self.avg_doc_len > 0 {
            return f64::from(self.avg_doc_len);
        }
        if self.docs.is_empty() {
            return 1.0;
        }
        let total: u64 = self.docs.iter().map(|d| u64::from(d.token_count)).sum();
        let mean = total as f64 / self.docs.len() as f64;
        if mean > 0.0 { mean } else { 1.0 }
    }

    /// Serializes into a writer using the postcard wire format.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), postcard::Error> {
        postcard::to_io(self, &mut writer)?;
        Ok(())
    }

    /// Decodes a segment from bytes previously produced by [`write_to`].
    ///
    /// [`write_to`]: Segment::write_to
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }

    /// Merges chunks (in manifest order) into one queryable segment.
    /// Aggregates are the caller's to provide — they come from the
    /// manifest, never from any single chunk.
    pub fn merge(
        chunks: impl IntoIterator<Item = Segment>,
        total_docs: u32,
        total_tokens: u32,
        avg_doc_len: u32,
    ) -> Self {
        let mut merged = Self {
            total_docs,
            total_tokens,
            avg_doc_len,
            ..Self::default()
        };
        for chunk in chunks {
            merged.docs.extend(chunk.docs);
            for (term, postings) in chunk.inverted_index {
                merged
                    .inverted_index
                    .entry(term)
                    .or_default()
                    .extend(postings);
            }
        }
        merged
    }
}

/// Decode failure mapped into the store error taxonomy.
pub(crate) fn corrupt(
    what: &'static str,
    path: &std::path::Path,
    err: impl std::fmt::Display,
) -> StoreError {
    StoreError::Corrupt {
        what,
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
