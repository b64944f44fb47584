//! SQLite-backed vector store.
//!
//! Rows live in a `chunks` table managed by rig-sqlite; vectors live in the
//! companion `chunks_embeddings` vec0 virtual table provided by sqlite-vec.
//! Similarity search goes through raw `vec_distance_cosine` SQL because the
//! higher-level index API cannot express our upsert-aware queries.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{Connection, ffi};

use super::{ChunkRecord, ChunkStore};
use crate::types::RagError;

/// Row shape for the `chunks` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: String,
    pub source: String,
    #[serde(deserialize_with = "deserialize_chunk_index")]
    pub chunk_index: usize,
    pub content: String,
    #[serde(deserialize_with = "deserialize_metadata_field")]
    pub metadata: serde_json::Value,
}

impl SqliteVectorStoreTable for ChunkRow {
    fn name() -> &'static str {
        "chunks"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("source", "TEXT").indexed(),
            Column::new("chunk_index", "TEXT"),
            Column::new("metadata", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("source", Box::new(self.source.clone())),
            ("chunk_index", Box::new(self.chunk_index.to_string())),
            ("metadata", Box::new(self.metadata.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

impl From<ChunkRecord> for ChunkRow {
    fn from(record: ChunkRecord) -> Self {
        ChunkRow {
            id: record.id,
            source: record.source,
            chunk_index: record.chunk_index,
            content: record.content,
            metadata: record.metadata,
        }
    }
}

impl From<ChunkRow> for ChunkRecord {
    fn from(row: ChunkRow) -> Self {
        ChunkRecord {
            id: row.id,
            source: row.source,
            chunk_index: row.chunk_index,
            content: row.content,
            metadata: row.metadata,
        }
    }
}

// The chunk_index column is declared TEXT, so values come back as strings.
fn deserialize_chunk_index<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Num(value) => usize::try_from(value)
            .map_err(|_| de::Error::custom(format!("chunk_index {value} does not fit in usize"))),
        Repr::Text(text) => text.parse::<usize>().map_err(|err| {
            de::Error::custom(format!("unable to parse chunk_index '{text}': {err}"))
        }),
    }
}

fn deserialize_metadata_field<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if let serde_json::Value::String(raw) = value {
        serde_json::from_str(&raw).map_or(Ok(serde_json::Value::String(raw)), Ok)
    } else {
        Ok(value)
    }
}

/// Persistent chunk store over SQLite + sqlite-vec.
///
/// The store owns its embedding model: document and query text is embedded
/// here, never by callers.
#[derive(Clone)]
pub struct SqliteChunkStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, ChunkRow>,
    model: E,
    /// Separate handle for direct SQL not covered by rig-sqlite; a clone of
    /// the connection the inner store uses.
    conn: Connection,
}

impl<E> SqliteChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the database at `path` and prepares the schema.
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path).await.map_err(storage_err)?;
        conn.call(|conn| {
            conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0))
                .map(|_| ())
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .map_err(storage_err)?;

        let conn_for_queries = conn.clone();
        let inner = SqliteVectorStore::new(conn, model).await.map_err(storage_err)?;
        Ok(Self {
            inner,
            model: model.clone(),
            conn: conn_for_queries,
        })
    }

    async fn embed_contents(&self, chunks: &[ChunkRecord]) -> Result<Vec<Embedding>, RagError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(E::MAX_DOCUMENTS.max(1)) {
            let embedded = self
                .model
                .embed_texts(batch.to_vec())
                .await
                .map_err(|err| RagError::Embedding(err.to_string()))?;
            embeddings.extend(embedded);
        }
        Ok(embeddings)
    }

    /// Drops any rows matching the incoming ids, from both tables, so the
    /// subsequent insert behaves as a replace.
    async fn delete_ids(&self, ids: Vec<String>) -> Result<(), RagError> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for id in &ids {
                    tx.execute("DELETE FROM chunks_embeddings WHERE id = ?1", [id])?;
                    tx.execute("DELETE FROM chunks WHERE id = ?1", [id])?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }
}

#[async_trait]
impl<E> ChunkStore for SqliteChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    async fn upsert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), RagError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let embeddings = self.embed_contents(&chunks).await?;
        self.delete_ids(chunks.iter().map(|c| c.id.clone()).collect())
            .await?;

        let mut rows = Vec::with_capacity(chunks.len());
        for (record, embedding) in chunks.into_iter().zip(embeddings) {
            rows.push((ChunkRow::from(record), OneOrMany::one(embedding)));
        }
        self.inner.add_rows(rows).await.map_err(storage_err)?;
        Ok(())
    }

    async fn query(
        &self,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<(ChunkRecord, f32)>, RagError> {
        let mut embedded = self
            .model
            .embed_texts(vec![query_text.to_string()])
            .await
            .map_err(|err| RagError::Embedding(err.to_string()))?;
        let Some(query) = embedded.pop() else {
            return Err(RagError::Embedding(
                "embedding model returned no vector for query".to_string(),
            ));
        };
        let query_vec: Vec<f32> = query.vec.into_iter().map(|v| v as f32).collect();
        let embedding_json = serde_json::to_string(&query_vec).map_err(storage_err)?;

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT c.id, c.source, c.chunk_index, c.content, c.metadata, \
                     vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                     FROM chunks c \
                     JOIN chunks_embeddings e ON c.id = e.id \
                     ORDER BY distance ASC \
                     LIMIT {top_k}"
                ))?;

                let rows = stmt.query_map([&embedding_json], |row| {
                    let record = ChunkRecord {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                        content: row.get(3)?,
                        metadata: row
                            .get::<_, String>(4)
                            .map(|s| serde_json::from_str(&s).unwrap_or_default())
                            .unwrap_or_default(),
                    };
                    let distance: f32 = row.get(5)?;
                    // Cosine distance -> similarity.
                    Ok((record, 1.0 - distance))
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(storage_err)
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(storage_err)
    }

    async fn chunks_by_source(&self, source: &str) -> Result<Vec<ChunkRecord>, RagError> {
        let source = source.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, source, chunk_index, content, metadata FROM chunks \
                     WHERE source = ?1 ORDER BY CAST(chunk_index AS INTEGER)",
                )?;

                let rows = stmt.query_map([&source], |row| {
                    Ok(ChunkRecord {
                        id: row.get(0)?,
                        source: row.get(1)?,
                        chunk_index: row.get::<_, String>(2)?.parse().unwrap_or(0),
                        content: row.get(3)?,
                        metadata: row
                            .get::<_, String>(4)
                            .map(|s| serde_json::from_str(&s).unwrap_or_default())
                            .unwrap_or_default(),
                    })
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(storage_err)
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize, RagError> {
        let source = source.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM chunks_embeddings WHERE id IN \
                     (SELECT id FROM chunks WHERE source = ?1)",
                    [&source],
                )?;
                let deleted = tx.execute("DELETE FROM chunks WHERE source = ?1", [&source])?;
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(storage_err)
    }
}

/// Registers the sqlite-vec extension for every connection opened by this
/// process. Safe to call repeatedly; registration happens once.
fn register_sqlite_vec() -> Result<(), RagError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc == ffi::SQLITE_OK {
                Ok(())
            } else {
                Err(format!("failed to register sqlite-vec extension (code {rc})"))
            }
        })
        .clone()
        .map_err(RagError::Storage)
}

fn storage_err(err: impl std::fmt::Display) -> RagError {
    RagError::Storage(err.to_string())
}
