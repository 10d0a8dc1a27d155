//! Semantic-search backend library: corpus ingestion + retrieval
//! over a vector index.
//!
//! This crate provides a clean API to:
//! - Populate the index from a JSON corpus with rate-limit-safe,
//!   strictly sequential batch embedding
//! - Retrieve top-K knowledge entries for a textual query
//!
//! The design is flat (no deep nesting) and splits responsibilities
//! into focused modules. Both external collaborators sit behind
//! traits ([`EmbeddingsProvider`], [`VectorIndex`]) so tests can run
//! against fakes.

mod config;
mod corpus;
mod embed;
mod errors;
mod index;
mod ingest;
mod retrieve;

pub use config::Config;
pub use corpus::{CorpusEntry, EntryMetadata, load_corpus};
pub use embed::EmbeddingsProvider;
pub use embed::gemini::GeminiEmbedder;
pub use errors::StoreError;
pub use index::qdrant::QdrantIndex;
pub use index::{SearchHit, VectorIndex, VectorRecord};
pub use ingest::IngestReport;

use std::{future::Future, pin::Pin};
use tracing::trace;

/// Boxed future used by the collaborator traits.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// High-level facade that wires configuration, the embedding
/// provider and the vector index.
///
/// This is the single entry point recommended for application code.
/// Collaborators are passed in explicitly; there is no hidden global
/// client state.
pub struct KnowledgeBase {
    cfg: Config,
    provider: Box<dyn EmbeddingsProvider>,
    index: Box<dyn VectorIndex>,
}

impl KnowledgeBase {
    /// Constructs a knowledge base from explicit collaborators.
    pub fn new(
        cfg: Config,
        provider: Box<dyn EmbeddingsProvider>,
        index: Box<dyn VectorIndex>,
    ) -> Self {
        trace!("KnowledgeBase::new collection={}", cfg.collection);
        Self {
            cfg,
            provider,
            index,
        }
    }

    /// Idempotent startup ingestion; no-ops against a populated
    /// index. Corpus and per-batch provider failures are contained
    /// and reported via the returned [`IngestReport`].
    ///
    /// # Errors
    /// Propagates only store connectivity failures.
    pub async fn ensure_ingested(&self) -> Result<IngestReport, StoreError> {
        ingest::ensure_ingested(&self.cfg, self.provider.as_ref(), self.index.as_ref()).await
    }

    /// Re-submits entries skipped by a previous pass.
    ///
    /// # Errors
    /// Propagates store connectivity failures.
    pub async fn retry_failed(&self, failed_ids: &[String]) -> Result<IngestReport, StoreError> {
        ingest::retry_failed(
            &self.cfg,
            self.provider.as_ref(),
            self.index.as_ref(),
            failed_ids,
        )
        .await
    }

    /// Top-K semantic search over the ingested corpus.
    ///
    /// # Errors
    /// Returns embedding errors or store failures; never partial
    /// results.
    pub async fn search(&self, query: &str, top_k: u64) -> Result<Vec<SearchHit>, StoreError> {
        trace!("KnowledgeBase::search top_k={top_k}");
        retrieve::search_knowledge(self.provider.as_ref(), self.index.as_ref(), query, top_k).await
    }
}
