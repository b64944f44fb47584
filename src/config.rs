//! Centralized configuration for the sanity pipeline.
//!
//! Settings resolve in order (later wins): compiled defaults, a local `.env`
//! file, process environment variables. Unrecognized environment entries are
//! ignored. The struct is built once at startup and passed by reference;
//! nothing mutates it afterwards.
//!
//! Recognized variables:
//!
//! - `OPENAI_API_KEY`: LLM/embedding credential (optional; without it the
//!   demo runs in context-only fallback mode)
//! - `FABRAG_MODEL`, `FABRAG_EMBEDDING_MODEL`
//! - `FABRAG_VECTOR_STORE`: `sqlite` or `memory`
//! - `FABRAG_PERSIST_DIR`, `FABRAG_SAMPLE_DIR`
//! - `FABRAG_CHUNK_SIZE`, `FABRAG_CHUNK_OVERLAP`, `FABRAG_TOP_K`
//! - `FABRAG_LOG_LEVEL`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was present but could not be parsed.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse { key: String, message: String },

    /// A settings invariant was violated.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Which vector-store backend the demo indexes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VectorStoreKind {
    /// SQLite + sqlite-vec under the persistence directory.
    #[default]
    Sqlite,
    /// Process-local store; nothing survives the run.
    Memory,
}

impl FromStr for VectorStoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown vector store kind '{other}'")),
        }
    }
}

impl fmt::Display for VectorStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

/// Typed settings for the whole pipeline. Loaded once, read-only thereafter.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub model_name: String,
    pub embedding_model: String,
    pub vector_store: VectorStoreKind,
    pub persist_dir: PathBuf,
    pub sample_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model_name: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            vector_store: VectorStoreKind::Sqlite,
            persist_dir: PathBuf::from(".fabrag"),
            sample_dir: PathBuf::from("data/sample_docs"),
            chunk_size: 800,
            chunk_overlap: 120,
            top_k: 4,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from the process environment, reading a local `.env`
    /// file first if one exists.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Split out from
    /// [`Settings::load`] so tests can exercise overrides without mutating
    /// process-global environment state.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(key) = get("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                settings.openai_api_key = Some(key);
            }
        }
        if let Some(value) = get("FABRAG_MODEL") {
            settings.model_name = value;
        }
        if let Some(value) = get("FABRAG_EMBEDDING_MODEL") {
            settings.embedding_model = value;
        }
        if let Some(value) = get("FABRAG_VECTOR_STORE") {
            settings.vector_store =
                value
                    .parse()
                    .map_err(|message: String| ConfigError::EnvParse {
                        key: "FABRAG_VECTOR_STORE".to_string(),
                        message,
                    })?;
        }
        if let Some(value) = get("FABRAG_PERSIST_DIR") {
            settings.persist_dir = PathBuf::from(value);
        }
        if let Some(value) = get("FABRAG_SAMPLE_DIR") {
            settings.sample_dir = PathBuf::from(value);
        }
        if let Some(value) = get("FABRAG_CHUNK_SIZE") {
            settings.chunk_size = parse_env("FABRAG_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = get("FABRAG_CHUNK_OVERLAP") {
            settings.chunk_overlap = parse_env("FABRAG_CHUNK_OVERLAP", &value)?;
        }
        if let Some(value) = get("FABRAG_TOP_K") {
            settings.top_k = parse_env("FABRAG_TOP_K", &value)?;
        }
        if let Some(value) = get("FABRAG_LOG_LEVEL") {
            settings.log_level = value;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Checks the invariants the rest of the pipeline relies on.
    ///
    /// The chunker in particular assumes `chunk_overlap < chunk_size`;
    /// anything else would stop its windows from advancing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "chunk_size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Validation(
                "top_k must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the SQLite database inside the persistence directory.
    pub fn database_path(&self) -> PathBuf {
        self.persist_dir.join("chunks.sqlite")
    }
}

fn parse_env(key: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|err| ConfigError::EnvParse {
            key: key.to_string(),
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chunk_size, 800);
        assert_eq!(settings.chunk_overlap, 120);
        assert_eq!(settings.top_k, 4);
        assert_eq!(settings.vector_store, VectorStoreKind::Sqlite);
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn overrides_apply() {
        let settings = Settings::from_lookup(lookup(&[
            ("FABRAG_MODEL", "gpt-4o"),
            ("FABRAG_CHUNK_SIZE", "400"),
            ("FABRAG_CHUNK_OVERLAP", "50"),
            ("FABRAG_VECTOR_STORE", "memory"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(settings.model_name, "gpt-4o");
        assert_eq!(settings.chunk_size, 400);
        assert_eq!(settings.chunk_overlap, 50);
        assert_eq!(settings.vector_store, VectorStoreKind::Memory);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn blank_credential_counts_as_absent() {
        let settings = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let err = Settings::from_lookup(lookup(&[
            ("FABRAG_CHUNK_SIZE", "100"),
            ("FABRAG_CHUNK_OVERLAP", "100"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = Settings::from_lookup(lookup(&[("FABRAG_CHUNK_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn zero_top_k_rejected() {
        let err = Settings::from_lookup(lookup(&[("FABRAG_TOP_K", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn malformed_numbers_are_parse_errors() {
        let err = Settings::from_lookup(lookup(&[("FABRAG_TOP_K", "four")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { .. }));
    }

    #[test]
    fn unknown_store_kind_rejected() {
        let err =
            Settings::from_lookup(lookup(&[("FABRAG_VECTOR_STORE", "chroma")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { .. }));
    }

    #[test]
    fn store_kind_round_trips_through_display() {
        for kind in [VectorStoreKind::Sqlite, VectorStoreKind::Memory] {
            assert_eq!(kind.to_string().parse::<VectorStoreKind>().unwrap(), kind);
        }
    }
}
