//! Runtime and collection configuration.

use std::time::Duration;

use crate::errors::StoreError;

/// Configuration for corpus ingestion and retrieval.
///
/// Values are sourced from the environment at startup; every knob has
/// a usable default except the provider credential.
#[derive(Clone, Debug)]
pub struct Config {
    /// Provider credential. Missing is a startup warning, not an
    /// error: the first provider call will fail instead.
    pub api_key: Option<String>,
    /// Embedding model served by the provider.
    pub embedding_model: String,
    /// Expected embedding dimension. `None` means probe the provider
    /// with the first text at ingestion time.
    pub embedding_dim: Option<usize>,
    /// Path to the JSON corpus file.
    pub corpus_file: String,
    /// Qdrant endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Entries per embedding request batch.
    pub batch_size: usize,
    /// Pause between successful batches, pacing against the
    /// provider's per-minute quota.
    pub batch_cooldown: Duration,
    /// Shorter pause after a failed batch before moving on.
    pub error_cooldown: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GOOGLE_API_KEY").ok(),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-004".into()),
            embedding_dim: std::env::var("EMBEDDING_DIM")
                .ok()
                .and_then(|s| s.parse().ok()),
            corpus_file: std::env::var("CORPUS_FILE").unwrap_or_else(|_| "data/corpus.json".into()),
            qdrant_url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".into()),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok(),
            collection: std::env::var("COLLECTION_NAME").unwrap_or_else(|_| "knowledge".into()),
            batch_size: env_usize("INGEST_BATCH_SIZE", 5),
            batch_cooldown: Duration::from_secs(env_u64("BATCH_COOLDOWN_SECS", 10)),
            error_cooldown: Duration::from_secs(env_u64("ERROR_COOLDOWN_SECS", 5)),
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(StoreError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(StoreError::Config("collection is empty".into()));
        }
        if self.batch_size == 0 {
            return Err(StoreError::Config("batch_size must be > 0".into()));
        }
        Ok(())
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            api_key: None,
            embedding_model: "text-embedding-004".into(),
            embedding_dim: Some(4),
            corpus_file: "data/corpus.json".into(),
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            collection: "knowledge".into(),
            batch_size: 5,
            batch_cooldown: Duration::from_secs(10),
            error_cooldown: Duration::from_secs(5),
        }
    }

    #[test]
    fn default_like_config_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut cfg = base();
        cfg.batch_size = 0;
        assert!(matches!(cfg.validate(), Err(StoreError::Config(_))));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let mut cfg = base();
        cfg.collection = "  ".into();
        assert!(matches!(cfg.validate(), Err(StoreError::Config(_))));
    }
}
