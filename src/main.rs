//! Sanity check: runs the whole mini-RAG pipeline end to end.
//!
//! With `OPENAI_API_KEY` set, chunks are embedded and indexed into the
//! configured vector store and the demo query is answered by the LLM with
//! citations. Without it, the same flow runs against an in-memory store with
//! deterministic local embeddings and prints the retrieved context instead.

use rig::client::{CompletionClient, EmbeddingsClient, ProviderClient};
use rig::providers::openai;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fabrag::answer::{self, Answer};
use fabrag::config::{Settings, VectorStoreKind};
use fabrag::corpus::ensure_sample_docs;
use fabrag::embeddings::MockEmbeddingModel;
use fabrag::indexing::upsert_corpus;
use fabrag::retrieval::retrieve;
use fabrag::stores::{ChunkStore, InMemoryChunkStore, SqliteChunkStore};
use fabrag::types::{RagError, RetrievedContext};

const DEMO_QUERY: &str = "What might explain the yield dip and what should we check?";

#[tokio::main]
async fn main() -> Result<(), RagError> {
    let settings = Settings::load()?;
    init_tracing(&settings.log_level);

    println!("=== Sanity Check: Minimal RAG Pipeline ===");
    println!("Vector store: {}", settings.vector_store);
    println!("Persist dir: {}", settings.persist_dir.display());

    let corpus = ensure_sample_docs(&settings.sample_dir).await?;
    println!("Prepared {} sample documents", corpus.len());

    let answer = if settings.openai_api_key.is_some() {
        run_live(&settings, &corpus).await?
    } else {
        println!();
        println!("OPENAI_API_KEY is not set.");
        println!("Add it to your environment or a local .env file for embeddings + LLM answers.");
        println!("Running with deterministic local embeddings instead.");
        run_offline(&settings, &corpus).await?
    };

    println!("\n--- Answer ---");
    println!("{}", answer.text());
    Ok(())
}

/// Full pipeline against the configured store and the OpenAI models.
async fn run_live(settings: &Settings, corpus: &[(String, String)]) -> Result<Answer, RagError> {
    let client = openai::Client::from_env();
    let embedding_model = client.embedding_model(&settings.embedding_model);

    let store: Box<dyn ChunkStore> = match settings.vector_store {
        VectorStoreKind::Sqlite => {
            tokio::fs::create_dir_all(&settings.persist_dir).await?;
            Box::new(SqliteChunkStore::open(settings.database_path(), &embedding_model).await?)
        }
        VectorStoreKind::Memory => Box::new(InMemoryChunkStore::new(embedding_model)),
    };

    let contexts = index_and_retrieve(store.as_ref(), settings, corpus).await?;

    let agent = client
        .agent(&settings.model_name)
        .preamble(answer::SYSTEM_PROMPT)
        .temperature(0.2)
        .build();
    let text = answer::generate_answer(&agent, DEMO_QUERY, &contexts).await?;
    Ok(Answer::Generated(text))
}

/// Credential-less pipeline: in-memory store, hash-derived embeddings,
/// context-only answer.
async fn run_offline(settings: &Settings, corpus: &[(String, String)]) -> Result<Answer, RagError> {
    let store = InMemoryChunkStore::new(MockEmbeddingModel::new());
    let contexts = index_and_retrieve(&store, settings, corpus).await?;
    Ok(Answer::ContextOnly(answer::fallback_answer(&contexts)))
}

async fn index_and_retrieve(
    store: &dyn ChunkStore,
    settings: &Settings,
    corpus: &[(String, String)],
) -> Result<Vec<RetrievedContext>, RagError> {
    upsert_corpus(store, corpus, settings).await?;
    let contexts = retrieve(store, DEMO_QUERY, settings.top_k).await?;

    println!("\n--- Retrieved Context ---");
    for (i, ctx) in contexts.iter().enumerate() {
        println!("\n[{}] {}\n{}", i + 1, ctx.source, ctx.text);
    }
    Ok(contexts)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
