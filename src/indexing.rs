//! Corpus indexing: chunk documents and upsert them into a store.

use tracing::info;

use crate::chunking::chunk_text;
use crate::config::Settings;
use crate::stores::{ChunkRecord, ChunkStore};
use crate::types::{DocChunk, RagError};

/// Chunks every document in the corpus into ordered [`DocChunk`]s.
pub fn corpus_to_chunks(
    corpus: &[(String, String)],
    chunk_size: usize,
    overlap: usize,
) -> Vec<DocChunk> {
    let mut chunks = Vec::new();
    for (source, text) in corpus {
        for (chunk_id, window) in chunk_text(text, chunk_size, overlap).into_iter().enumerate() {
            chunks.push(DocChunk {
                source: source.clone(),
                chunk_id,
                text: window,
            });
        }
    }
    chunks
}

/// Store-facing records with composite ids and `{source, chunk_id}` metadata.
pub fn chunk_records(chunks: &[DocChunk]) -> Vec<ChunkRecord> {
    chunks.iter().map(ChunkRecord::from).collect()
}

/// Chunks the corpus and upserts everything into the store.
///
/// Returns the chunk list for caller bookkeeping. Upserting twice with the
/// same corpus leaves the store unchanged, since the composite ids collide
/// and replace.
pub async fn upsert_corpus(
    store: &dyn ChunkStore,
    corpus: &[(String, String)],
    settings: &Settings,
) -> Result<Vec<DocChunk>, RagError> {
    let chunks = corpus_to_chunks(corpus, settings.chunk_size, settings.chunk_overlap);
    if !chunks.is_empty() {
        store.upsert_chunks(chunk_records(&chunks)).await?;
    }
    info!(
        documents = corpus.len(),
        chunks = chunks.len(),
        "indexed corpus"
    );
    Ok(chunks)
}
