//! Chunk manifest: the source of truth for what is queryable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a chunk. Only `Complete` chunks contribute to aggregates
/// and query results; anything else is a crash or failure leftover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    InProgress,
    Complete,
    Failed,
}

/// Manifest entry describing one chunk file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub id: u32,
    pub filename: String,
    pub status: ChunkStatus,
    pub doc_count: u32,
    /// Unique terms in the chunk.
    pub token_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ChunkInfo {
    /// Canonical chunk filename for an id: zero-padded 3-digit `NNN.idx`.
    pub fn filename_for(id: u32) -> String {
        format!("{id:03}.idx")
    }
}

/// Ordered chunk list plus whole-index aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub chunks: Vec<ChunkInfo>,
    pub total_docs: u32,
    pub total_tokens: u32,
    pub avg_doc_len: u32,
}

impl Manifest {
    /// Chunks that are safe to load.
    pub fn complete_chunks(&self) -> impl Iterator<Item = &ChunkInfo> {
        self.chunks
            .iter()
            .filter(|c| c.status == ChunkStatus::Complete)
    }

    /// Recomputes `total_docs` and `total_tokens` from the complete chunks.
    /// `avg_doc_len` is the mean document length, which chunk entries don't
    /// carry, so the builder supplies it from its running totals.
    pub fn recompute_totals(&mut self, avg_doc_len: u32) {
        self.total_docs = self.complete_chunks().map(|c| c.doc_count).sum();
        self.total_tokens = self.complete_chunks().map(|c| c.token_count).sum();
        self.avg_doc_len = avg_doc_len;
    }

    /// Marks the chunk with `id` as having the given status.
    pub fn set_status(&mut self, id: u32, status: ChunkStatus) {
        if let Some(chunk) = self.chunks.iter_mut().find(|c| c.id == id) {
            chunk.status = status;
        }
    }
}
