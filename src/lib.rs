//! Minimal retrieval-augmented generation sanity pipeline.
//!
//! ```text
//! corpus::ensure_sample_docs ──► indexing::upsert_corpus ──► stores::ChunkStore
//!                                        │                        (sqlite | memory)
//!                                        └─ chunking::chunk_text        │
//!                                                                       │
//! retrieval::retrieve ◄──────────────────────────────────────────────────┘
//!        │
//!        └─► answer::{generate_answer | fallback_answer} ──► Answer
//! ```
//!
//! Everything runs sequentially in a single task: bootstrap the sample
//! corpus, chunk and index it, retrieve top-K chunks for a query, and
//! compose an answer: LLM-backed when a credential is configured,
//! context-only otherwise.

pub mod answer;
pub mod chunking;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod indexing;
pub mod retrieval;
pub mod stores;
pub mod tools;
pub mod types;

pub use answer::{Answer, fallback_answer, generate_answer};
pub use chunking::chunk_text;
pub use config::{ConfigError, Settings, VectorStoreKind};
pub use corpus::ensure_sample_docs;
pub use indexing::upsert_corpus;
pub use retrieval::retrieve;
pub use stores::{ChunkRecord, ChunkStore, InMemoryChunkStore, SqliteChunkStore};
pub use types::{DocChunk, RagError, RetrievedContext};
