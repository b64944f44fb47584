//! In-memory chunk store.
//!
//! Serves two roles: the store double for tests, and the backend for
//! credential-less demo runs. Nothing survives the process.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rig::embeddings::EmbeddingModel;

use super::{ChunkRecord, ChunkStore};
use crate::types::RagError;

#[derive(Clone)]
struct Entry {
    record: ChunkRecord,
    embedding: Vec<f32>,
}

/// Map-backed store with in-process cosine ranking.
#[derive(Clone)]
pub struct InMemoryChunkStore<E> {
    model: E,
    entries: Arc<Mutex<BTreeMap<String, Entry>>>,
}

impl<E> InMemoryChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    pub fn new(model: E) -> Self {
        Self {
            model,
            entries: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, RagError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(E::MAX_DOCUMENTS.max(1)) {
            let embedded = self
                .model
                .embed_texts(batch.to_vec())
                .await
                .map_err(|err| RagError::Embedding(err.to_string()))?;
            vectors.extend(
                embedded
                    .into_iter()
                    .map(|e| e.vec.into_iter().map(|v| v as f32).collect()),
            );
        }
        Ok(vectors)
    }
}

#[async_trait]
impl<E> ChunkStore for InMemoryChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    async fn upsert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let texts = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embed_batch(texts).await?;

        let mut entries = self.entries.lock();
        for (record, embedding) in chunks.into_iter().zip(embeddings) {
            entries.insert(record.id.clone(), Entry { record, embedding });
        }
        Ok(())
    }

    async fn query(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError> {
        let mut embedded = self.embed_batch(vec![query_text.to_string()]).await?;
        let Some(query) = embedded.pop() else {
            return Err(RagError::Embedding(
                "embedding model returned no vector for query".to_string(),
            ));
        };

        let mut scored: Vec<(ChunkRecord, f32)> = {
            let entries = self.entries.lock();
            entries
                .values()
                .map(|entry| {
                    (
                        entry.record.clone(),
                        cosine_similarity(&query, &entry.embedding),
                    )
                })
                .collect()
        };
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize, RagError> {
        Ok(self.entries.lock().len())
    }

    async fn chunks_by_source(&self, source: &str) -> Result<Vec<ChunkRecord>, RagError> {
        let mut records: Vec<ChunkRecord> = self
            .entries
            .lock()
            .values()
            .filter(|entry| entry.record.source == source)
            .map(|entry| entry.record.clone())
            .collect();
        records.sort_by_key(|record| record.chunk_index);
        Ok(records)
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize, RagError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.record.source != source);
        Ok(before - entries.len())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingModel;

    fn store() -> InMemoryChunkStore<MockEmbeddingModel> {
        InMemoryChunkStore::new(MockEmbeddingModel::new())
    }

    fn records() -> Vec<ChunkRecord> {
        vec![
            ChunkRecord::new("a.txt", 0, "humidity spikes on line b"),
            ChunkRecord::new("a.txt", 1, "review spc limits"),
            ChunkRecord::new("b.txt", 0, "etch recipe update"),
        ]
    }

    #[tokio::test]
    async fn upsert_and_count() {
        let store = store();
        store.upsert_chunks(records()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn reupsert_replaces_instead_of_duplicating() {
        let store = store();
        store.upsert_chunks(records()).await.unwrap();
        store.upsert_chunks(records()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn exact_text_ranks_first() {
        let store = store();
        store.upsert_chunks(records()).await.unwrap();

        let hits = store.query("etch recipe update", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0.id, "b.txt::chunk0");
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
        assert!(hits[0].1 >= hits[1].1 && hits[1].1 >= hits[2].1);
    }

    #[tokio::test]
    async fn query_respects_top_k() {
        let store = store();
        store.upsert_chunks(records()).await.unwrap();
        let hits = store.query("anything", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn chunks_by_source_are_ordered() {
        let store = store();
        store.upsert_chunks(records()).await.unwrap();
        let chunks = store.chunks_by_source("a.txt").await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[tokio::test]
    async fn delete_by_source_removes_only_that_source() {
        let store = store();
        store.upsert_chunks(records()).await.unwrap();
        assert_eq!(store.delete_by_source("a.txt").await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.chunks_by_source("a.txt").await.unwrap().is_empty());
    }

    #[test]
    fn cosine_handles_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }
}
