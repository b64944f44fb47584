//! Top-K similarity retrieval.

use tracing::debug;

use crate::stores::ChunkStore;
use crate::types::{RagError, RetrievedContext};

/// Returns up to `top_k` (source, text) pairs for `query`, preserving the
/// store's descending-relevance order. Fewer pairs come back when the store
/// holds fewer matching chunks.
pub async fn retrieve(
    store: &dyn ChunkStore,
    query: &str,
    top_k: usize,
) -> Result<Vec<RetrievedContext>, RagError> {
    let hits = store.query(query, top_k).await?;
    let mut contexts = Vec::with_capacity(hits.len());
    for (record, similarity) in hits {
        debug!(id = %record.id, similarity, "retrieved chunk");
        contexts.push(RetrievedContext {
            source: record.source,
            text: record.content,
        });
    }
    Ok(contexts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingModel;
    use crate::stores::{ChunkRecord, InMemoryChunkStore};

    #[tokio::test]
    async fn maps_hits_to_source_text_pairs() {
        let store = InMemoryChunkStore::new(MockEmbeddingModel::new());
        store
            .upsert_chunks(vec![
                ChunkRecord::new("a.txt", 0, "first chunk"),
                ChunkRecord::new("b.txt", 0, "second chunk"),
            ])
            .await
            .unwrap();

        let contexts = retrieve(&store, "first chunk", 4).await.unwrap();
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].source, "a.txt");
        assert_eq!(contexts[0].text, "first chunk");
    }

    #[tokio::test]
    async fn empty_store_returns_no_contexts() {
        let store = InMemoryChunkStore::new(MockEmbeddingModel::new());
        let contexts = retrieve(&store, "anything", 4).await.unwrap();
        assert!(contexts.is_empty());
    }
}
