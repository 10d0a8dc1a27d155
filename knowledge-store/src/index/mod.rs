//! Vector index seam.

use crate::StoreFuture;
use crate::corpus::EntryMetadata;

pub mod qdrant;

/// One record upserted into the index, keyed by the corpus entry id.
#[derive(Clone, Debug)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: EntryMetadata,
}

/// A single retrieval hit with the store's native score.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub content: String,
    pub metadata: EntryMetadata,
    /// Full-precision score in the store's own metric, best first.
    pub score: f32,
}

/// Persistent nearest-neighbor index over embeddings.
///
/// Ingestion is the only writer (upsert keyed by id, so re-running is
/// safe per id); retrieval is read-only.
pub trait VectorIndex: Send + Sync {
    /// Number of records currently stored. A missing collection
    /// counts as zero; connectivity failures are errors.
    fn count(&self) -> StoreFuture<'_, u64>;

    /// Create the backing collection for `dim`-sized vectors if it
    /// does not exist yet.
    fn ensure_ready(&self, dim: usize) -> StoreFuture<'_, ()>;

    /// Insert or overwrite records by id. Returns the number of
    /// records submitted.
    fn upsert(&self, records: Vec<VectorRecord>) -> StoreFuture<'_, u64>;

    /// Nearest-neighbor search, best hit first per the store's
    /// metric. Returns at most `top_k` hits.
    fn search(&self, vector: Vec<f32>, top_k: u64) -> StoreFuture<'_, Vec<SearchHit>>;
}
