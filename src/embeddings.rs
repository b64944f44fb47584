//! Deterministic embedding model for tests and credential-less runs.

use rig::embeddings::embedding::{Embedding, EmbeddingError, EmbeddingModel};

/// Hash-derived embeddings: identical text always maps to the same vector
/// and distinct text to distinct vectors, with no network access. Useful for
/// exercising the indexing and retrieval flow deterministically; the vectors
/// carry no semantic signal.
#[derive(Clone, Debug, Default)]
pub struct MockEmbeddingModel;

impl MockEmbeddingModel {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 64;

    type Client = ();

    fn make(_client: &Self::Client, _model: impl Into<String>, _dims: Option<usize>) -> Self {
        Self
    }

    fn ndims(&self) -> usize {
        8
    }

    fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> impl std::future::Future<Output = Result<Vec<Embedding>, EmbeddingError>> + Send {
        let docs: Vec<String> = texts.into_iter().collect();
        async move {
            Ok(docs
                .into_iter()
                .map(|document| Embedding {
                    vec: hash_to_vec(&document),
                    document,
                })
                .collect())
        }
    }
}

fn hash_to_vec(text: &str) -> Vec<f64> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..8u32)
        .map(|lane| {
            let bits = seed.rotate_left(lane * 7).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            (bits >> 11) as f64 / (1u64 << 53) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic() {
        let model = MockEmbeddingModel::new();
        let first = model
            .embed_texts(vec!["hello world".to_string()])
            .await
            .unwrap();
        let second = model
            .embed_texts(vec!["hello world".to_string()])
            .await
            .unwrap();
        assert_eq!(first[0].vec, second[0].vec);
    }

    #[tokio::test]
    async fn distinct_texts_get_distinct_vectors() {
        let model = MockEmbeddingModel::new();
        let embedded = model
            .embed_texts(vec!["alpha".to_string(), "beta".to_string()])
            .await
            .unwrap();
        assert_ne!(embedded[0].vec, embedded[1].vec);
    }

    #[test]
    fn dimensions_match_ndims() {
        let model = MockEmbeddingModel::new();
        assert_eq!(hash_to_vec("anything").len(), model.ndims());
    }
}
