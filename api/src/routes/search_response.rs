use knowledge_store::{EntryMetadata, SearchHit};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub metadata: EntryMetadata,
    pub similarity_score: f32,
}

impl SearchResponse {
    /// Maps store hits into the wire shape, preserving the store's
    /// best-first order. Rounding happens here and only here; the
    /// ranking upstream already used the full-precision scores.
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            results: hits
                .into_iter()
                .map(|h| SearchResult {
                    content: h.content,
                    metadata: h.metadata,
                    similarity_score: round_score(h.score),
                })
                .collect(),
        }
    }
}

/// Rounds a similarity score to 4 decimal digits for display.
fn round_score(score: f32) -> f32 {
    (score * 10_000.0).round() / 10_000.0
}
