//! Embedding provider seam.
//!
//! Async is required because real providers (Gemini, Ollama, OpenAI)
//! perform HTTP requests.

use crate::StoreFuture;

pub mod gemini;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in another backend; ingestion and
/// retrieval only ever see the trait. The same provider instance must
/// be used for both, otherwise query vectors land in a different
/// embedding space than the stored records.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embed a single text.
    fn embed<'a>(&'a self, text: &'a str) -> StoreFuture<'a, Vec<f32>>;

    /// Embed a batch of texts, one vector per input, in input order.
    ///
    /// The default issues sequential [`embed`](Self::embed) calls;
    /// providers with a native batch endpoint should override it.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> StoreFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        })
    }
}
