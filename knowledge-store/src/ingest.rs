//! One-time, idempotent population of the vector index from the
//! corpus, paced against the embedding provider's rate limit.
//!
//! Batches are processed strictly sequentially: the whole point of
//! the inter-batch cooldown is to stay under a shared, global quota,
//! and concurrent submission would defeat it. A failed batch is
//! logged, its entry ids recorded in the report, and the pipeline
//! moves on after a shorter recovery pause; [`retry_failed`] can
//! re-submit exactly those entries afterwards.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::corpus::{CorpusEntry, load_corpus};
use crate::embed::EmbeddingsProvider;
use crate::errors::StoreError;
use crate::index::{VectorIndex, VectorRecord};

/// Outcome of one ingestion pass.
#[derive(Clone, Debug, Default)]
pub struct IngestReport {
    /// Records successfully upserted in this pass.
    pub upserted: u64,
    /// Batches submitted.
    pub batches: usize,
    /// Inter-batch rate-limit pauses taken (never after the last
    /// batch, never after a failed one).
    pub cooldowns: usize,
    /// Ids of entries whose batch failed and was skipped.
    pub failed_ids: Vec<String>,
}

/// Populates the index from the corpus unless it already holds data.
///
/// Safe to invoke on every process start: a non-empty index is
/// treated as a completed prior ingestion and the call no-ops.
///
/// # Errors
/// Only store connectivity failures propagate (the initial count and
/// the collection setup). Corpus and provider failures are contained:
/// a missing corpus yields an empty run, a failed batch is skipped
/// and reported via [`IngestReport::failed_ids`].
pub async fn ensure_ingested(
    cfg: &Config,
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> Result<IngestReport, StoreError> {
    let existing = index.count().await?;
    if existing > 0 {
        info!(
            records = existing,
            "vector index already contains data, skipping ingestion"
        );
        return Ok(IngestReport::default());
    }

    info!("vector index is empty, starting rate-limit-safe batch ingestion");

    let entries = match load_corpus(&cfg.corpus_file) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, path = %cfg.corpus_file, "corpus could not be loaded, nothing to ingest");
            return Ok(IngestReport::default());
        }
    };
    if entries.is_empty() {
        info!("corpus is empty, nothing to ingest");
        return Ok(IngestReport::default());
    }

    let dim = match resolve_dim(cfg, provider, &entries).await {
        Ok(dim) => dim,
        Err(err) => {
            // Without a dimension the collection cannot be created;
            // report every entry as failed so a retry pass can run.
            warn!(error = %err, "could not determine embedding dimension, skipping all batches");
            return Ok(IngestReport {
                failed_ids: entries.into_iter().map(|e| e.id).collect(),
                ..IngestReport::default()
            });
        }
    };
    index.ensure_ready(dim).await?;

    let report = run_batches(cfg, &entries, provider, index).await;
    info!(
        upserted = report.upserted,
        batches = report.batches,
        failed = report.failed_ids.len(),
        "ingestion finished"
    );
    Ok(report)
}

/// Re-submits exactly the corpus entries named in `failed_ids`, with
/// the same batching and pacing as the initial pass.
pub async fn retry_failed(
    cfg: &Config,
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
    failed_ids: &[String],
) -> Result<IngestReport, StoreError> {
    if failed_ids.is_empty() {
        return Ok(IngestReport::default());
    }

    let entries: Vec<CorpusEntry> = match load_corpus(&cfg.corpus_file) {
        Ok(entries) => entries
            .into_iter()
            .filter(|e| failed_ids.contains(&e.id))
            .collect(),
        Err(err) => {
            warn!(error = %err, "corpus could not be reloaded for retry");
            return Ok(IngestReport::default());
        }
    };

    info!(entries = entries.len(), "retrying previously failed entries");
    Ok(run_batches(cfg, &entries, provider, index).await)
}

/// Embedding dimension: configured value, or one probe call with the
/// first entry's text.
async fn resolve_dim(
    cfg: &Config,
    provider: &dyn EmbeddingsProvider,
    entries: &[CorpusEntry],
) -> Result<usize, StoreError> {
    if let Some(dim) = cfg.embedding_dim {
        return Ok(dim);
    }
    let probe = provider.embed(&entries[0].embedding_text()).await?;
    Ok(probe.len())
}

/// The sequential batch loop. Never fails as a whole: per-batch
/// errors are contained and reported.
async fn run_batches(
    cfg: &Config,
    entries: &[CorpusEntry],
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> IngestReport {
    let mut report = IngestReport::default();
    let total = entries.len();
    let batch_count = entries.chunks(cfg.batch_size).count();

    for (nr, batch) in entries.chunks(cfg.batch_size).enumerate() {
        let start = nr * cfg.batch_size;
        info!(
            "Processing batch {} to {} of {}",
            start,
            start + batch.len(),
            total
        );
        report.batches += 1;

        match ingest_batch(batch, provider, index).await {
            Ok(n) => {
                report.upserted += n;
                if nr + 1 < batch_count {
                    info!(
                        "Pausing {:?} to stay under the provider rate limit",
                        cfg.batch_cooldown
                    );
                    sleep(cfg.batch_cooldown).await;
                    report.cooldowns += 1;
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    transient = err.is_transient(),
                    "batch {} failed, entries skipped for this run", nr
                );
                report
                    .failed_ids
                    .extend(batch.iter().map(|e| e.id.clone()));
                sleep(cfg.error_cooldown).await;
            }
        }
    }

    report
}

/// Embed one batch and upsert the resulting records, keyed by entry
/// id so a re-run overwrites instead of duplicating.
async fn ingest_batch(
    batch: &[CorpusEntry],
    provider: &dyn EmbeddingsProvider,
    index: &dyn VectorIndex,
) -> Result<u64, StoreError> {
    let texts: Vec<String> = batch.iter().map(CorpusEntry::embedding_text).collect();
    let vectors = provider.embed_batch(&texts).await?;

    if vectors.len() != batch.len() {
        return Err(StoreError::Provider(format!(
            "provider returned {} vectors for {} entries",
            vectors.len(),
            batch.len()
        )));
    }

    let records: Vec<VectorRecord> = batch
        .iter()
        .zip(texts)
        .zip(vectors)
        .map(|((entry, text), vector)| VectorRecord {
            id: entry.id.clone(),
            vector,
            text,
            metadata: entry.metadata(),
        })
        .collect();

    index.upsert(records).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreFuture;
    use crate::index::SearchHit;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeProvider {
        dim: usize,
        /// 0-based batch number that should fail, if any.
        fail_on_batch: Option<usize>,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn new(dim: usize) -> Self {
            Self {
                dim,
                fail_on_batch: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(dim: usize, batch: usize) -> Self {
            Self {
                dim,
                fail_on_batch: Some(batch),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddingsProvider for FakeProvider {
        fn embed<'a>(&'a self, text: &'a str) -> StoreFuture<'a, Vec<f32>> {
            let v = vec![text.len() as f32; self.dim];
            Box::pin(async move { Ok(v) })
        }

        fn embed_batch<'a>(&'a self, texts: &'a [String]) -> StoreFuture<'a, Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if self.fail_on_batch == Some(call) {
                    return Err(StoreError::RateLimited("quota exhausted".into()));
                }
                Ok(texts
                    .iter()
                    .map(|t| vec![t.len() as f32; self.dim])
                    .collect())
            })
        }
    }

    #[derive(Default)]
    struct FakeIndex {
        records: Mutex<HashMap<String, VectorRecord>>,
        fail_count: bool,
    }

    impl FakeIndex {
        fn stored_ids(&self) -> Vec<String> {
            let mut ids: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
            ids.sort();
            ids
        }
    }

    impl VectorIndex for FakeIndex {
        fn count(&self) -> StoreFuture<'_, u64> {
            Box::pin(async move {
                if self.fail_count {
                    return Err(StoreError::Qdrant("connection refused".into()));
                }
                Ok(self.records.lock().unwrap().len() as u64)
            })
        }

        fn ensure_ready(&self, _dim: usize) -> StoreFuture<'_, ()> {
            Box::pin(async move { Ok(()) })
        }

        fn upsert(&self, records: Vec<VectorRecord>) -> StoreFuture<'_, u64> {
            Box::pin(async move {
                let n = records.len() as u64;
                let mut map = self.records.lock().unwrap();
                for r in records {
                    map.insert(r.id.clone(), r);
                }
                Ok(n)
            })
        }

        fn search(&self, _vector: Vec<f32>, _top_k: u64) -> StoreFuture<'_, Vec<SearchHit>> {
            Box::pin(async move { Ok(Vec::new()) })
        }
    }

    fn test_config(corpus_file: &str) -> Config {
        Config {
            api_key: None,
            embedding_model: "test".into(),
            embedding_dim: Some(3),
            corpus_file: corpus_file.into(),
            qdrant_url: "http://localhost:6334".into(),
            qdrant_api_key: None,
            collection: "test".into(),
            batch_size: 5,
            batch_cooldown: Duration::ZERO,
            error_cooldown: Duration::ZERO,
        }
    }

    fn write_corpus(n: usize) -> tempfile::NamedTempFile {
        let entries: Vec<CorpusEntry> = (0..n)
            .map(|i| CorpusEntry {
                id: format!("e{i:02}"),
                category: "Art".into(),
                content: format!("entry {i}"),
            })
            .collect();
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", serde_json::to_string(&entries).unwrap()).unwrap();
        f
    }

    #[tokio::test]
    async fn twelve_entries_make_three_batches_with_two_cooldowns() {
        let corpus = write_corpus(12);
        let cfg = test_config(corpus.path().to_str().unwrap());
        let provider = FakeProvider::new(3);
        let index = FakeIndex::default();

        let report = ensure_ingested(&cfg, &provider, &index).await.unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.cooldowns, 2);
        assert_eq!(report.upserted, 12);
        assert!(report.failed_ids.is_empty());
        assert_eq!(index.stored_ids().len(), 12);
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let corpus = write_corpus(7);
        let cfg = test_config(corpus.path().to_str().unwrap());
        let provider = FakeProvider::new(3);
        let index = FakeIndex::default();

        let first = ensure_ingested(&cfg, &provider, &index).await.unwrap();
        assert_eq!(first.upserted, 7);

        let second = ensure_ingested(&cfg, &provider, &index).await.unwrap();
        assert_eq!(second.batches, 0);
        assert_eq!(second.upserted, 0);

        // Still exactly one record per corpus id.
        assert_eq!(index.stored_ids().len(), 7);
    }

    #[tokio::test]
    async fn failed_batch_is_skipped_and_later_batches_complete() {
        let corpus = write_corpus(12);
        let cfg = test_config(corpus.path().to_str().unwrap());
        let provider = FakeProvider::failing_on(3, 1);
        let index = FakeIndex::default();

        let report = ensure_ingested(&cfg, &provider, &index).await.unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.upserted, 7);
        assert_eq!(
            report.failed_ids,
            vec!["e05", "e06", "e07", "e08", "e09"]
        );
        // Batches 1 and 3 landed despite the failure in between.
        let ids = index.stored_ids();
        assert!(ids.contains(&"e00".to_string()));
        assert!(ids.contains(&"e11".to_string()));
        assert!(!ids.contains(&"e05".to_string()));
    }

    #[tokio::test]
    async fn retry_failed_resubmits_only_the_skipped_entries() {
        let corpus = write_corpus(12);
        let cfg = test_config(corpus.path().to_str().unwrap());
        let index = FakeIndex::default();

        let report = {
            let provider = FakeProvider::failing_on(3, 1);
            ensure_ingested(&cfg, &provider, &index).await.unwrap()
        };
        assert_eq!(report.failed_ids.len(), 5);

        let provider = FakeProvider::new(3);
        let retried = retry_failed(&cfg, &provider, &index, &report.failed_ids)
            .await
            .unwrap();

        assert_eq!(retried.upserted, 5);
        assert!(retried.failed_ids.is_empty());
        assert_eq!(index.stored_ids().len(), 12);
    }

    #[tokio::test]
    async fn missing_corpus_yields_an_empty_run() {
        let cfg = test_config("/nonexistent/corpus.json");
        let provider = FakeProvider::new(3);
        let index = FakeIndex::default();

        let report = ensure_ingested(&cfg, &provider, &index).await.unwrap();

        assert_eq!(report.batches, 0);
        assert_eq!(report.upserted, 0);
        assert!(index.stored_ids().is_empty());
    }

    #[tokio::test]
    async fn count_failure_aborts_startup() {
        let corpus = write_corpus(3);
        let cfg = test_config(corpus.path().to_str().unwrap());
        let provider = FakeProvider::new(3);
        let index = FakeIndex {
            fail_count: true,
            ..FakeIndex::default()
        };

        let err = ensure_ingested(&cfg, &provider, &index).await.unwrap_err();
        assert!(matches!(err, StoreError::Qdrant(_)));
    }
}
