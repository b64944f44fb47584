//! Vector-store backends for chunk documents.
//!
//! The [`ChunkStore`] trait gives the pipeline one collection-style interface
//! over different backends. Documents go in and come out as text; each
//! backend owns an embedding model and computes vectors itself, so callers
//! never touch raw embeddings.
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │  ChunkStore      │
//!                  │  (async, text in)│
//!                  └────────┬─────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!       ┌─────────────┐          ┌──────────────┐
//!       │   SQLite    │          │  In-memory   │
//!       │ sqlite-vec  │          │ (tests, demo │
//!       │             │          │  without key)│
//!       └─────────────┘          └──────────────┘
//! ```

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{DocChunk, RagError, chunk_identifier};

pub use memory::InMemoryChunkStore;
pub use sqlite::SqliteChunkStore;

/// A chunk as handed to a store: composite id, provenance, and the text to
/// embed and index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// `source::chunk<index>`, unique across the corpus.
    pub id: String,
    /// Source document path or identifier.
    pub source: String,
    /// Zero-based position of this chunk within its source.
    pub chunk_index: usize,
    /// The chunk text itself.
    pub content: String,
    /// Additional metadata stored alongside the chunk.
    pub metadata: serde_json::Value,
}

impl ChunkRecord {
    /// Builds a record with the composite identifier and the standard
    /// `{source, chunk_id}` metadata.
    pub fn new(source: impl Into<String>, chunk_index: usize, content: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: chunk_identifier(&source, chunk_index),
            metadata: serde_json::json!({ "source": source, "chunk_id": chunk_index }),
            source,
            chunk_index,
            content: content.into(),
        }
    }
}

impl From<&DocChunk> for ChunkRecord {
    fn from(chunk: &DocChunk) -> Self {
        ChunkRecord::new(chunk.source.as_str(), chunk.chunk_id, chunk.text.as_str())
    }
}

/// Collection-style interface over vector-store backends.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Inserts or replaces chunks by id.
    ///
    /// Upsert is idempotent: re-running with identical ids and content leaves
    /// the store's total count unchanged.
    async fn upsert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError>;

    /// Cosine-ranked similarity query.
    ///
    /// Returns up to `top_k` (record, similarity) pairs in descending
    /// relevance order; fewer when the store holds fewer chunks.
    async fn query(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError>;

    /// Total number of chunks in the store.
    async fn count(&self) -> Result<usize, RagError>;

    /// All chunks for one source document, ordered by chunk index.
    async fn chunks_by_source(&self, source: &str) -> Result<Vec<ChunkRecord>, RagError>;

    /// Removes every chunk for one source document, returning how many were
    /// deleted.
    async fn delete_by_source(&self, source: &str) -> Result<usize, RagError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_carries_composite_id_and_metadata() {
        let record = ChunkRecord::new("data/notes.txt", 2, "window text");
        assert_eq!(record.id, "data/notes.txt::chunk2");
        assert_eq!(record.metadata["source"], "data/notes.txt");
        assert_eq!(record.metadata["chunk_id"], 2);
    }

    #[test]
    fn record_from_doc_chunk_matches_its_identifier() {
        let chunk = DocChunk {
            source: "a.txt".into(),
            chunk_id: 1,
            text: "text".into(),
        };
        let record = ChunkRecord::from(&chunk);
        assert_eq!(record.id, chunk.identifier());
        assert_eq!(record.content, chunk.text);
    }
}
