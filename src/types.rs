//! Core data model shared across the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// A bounded window of a source document, the unit of indexing and retrieval.
///
/// Chunks are immutable once created; `chunk_id` is zero-based and unique
/// within its source document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChunk {
    pub source: String,
    pub chunk_id: usize,
    pub text: String,
}

impl DocChunk {
    /// Composite identifier used for store upserts.
    pub fn identifier(&self) -> String {
        chunk_identifier(&self.source, self.chunk_id)
    }
}

/// Builds the `source::chunk<index>` identifier.
///
/// Identifiers must be unique across the corpus so re-indexing replaces
/// existing rows instead of duplicating them.
pub fn chunk_identifier(source: &str, chunk_id: usize) -> String {
    format!("{source}::chunk{chunk_id}")
}

/// A retrieved (source, text) pair, used only to assemble an answer prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedContext {
    pub source: String,
    pub text: String,
}

/// Errors surfaced by the pipeline.
///
/// There is no retry or partial-failure recovery; store and model failures
/// propagate to the caller and terminate the run.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("completion error: {0}")]
    Completion(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
