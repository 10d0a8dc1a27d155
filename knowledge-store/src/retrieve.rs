//! Query-side retrieval: embed the query text, search the index.

use tracing::debug;

use crate::embed::EmbeddingsProvider;
use crate::errors::StoreError;
use crate::index::{SearchHit, VectorIndex};

/// Embeds `query` with the same provider used at ingestion and
/// returns up to `top_k` hits in the store's native best-first order.
///
/// No retry here: retries belong to ingestion's pacing, not to the
/// low-latency query path. Any provider or store failure surfaces as
/// a single error, never as partial results.
///
/// # Errors
/// Provider failures ([`StoreError::Provider`],
/// [`StoreError::RateLimited`]) or store failures
/// ([`StoreError::Qdrant`]).
pub async fn search_knowledge(
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
    query: &str,
    top_k: u64,
) -> Result<Vec<SearchHit>, StoreError> {
    debug!(top_k, "retrieve::search_knowledge");

    let query_vector = provider.embed(query).await?;
    let hits = index.search(query_vector, top_k).await?;

    debug!(hits = hits.len(), "retrieve::search_knowledge done");
    Ok(hits)
}
