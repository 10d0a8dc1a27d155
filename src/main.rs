use std::error::Error;
use std::sync::Arc;

use knowledge_store::{Config, GeminiEmbedder, KnowledgeBase, QdrantIndex};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file, if present.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::from_env();
    config.validate()?;

    if config.api_key.is_none() {
        warn!("GOOGLE_API_KEY not set; embedding calls will fail until it is provided");
    }

    let provider = GeminiEmbedder::new(&config)?;
    let index = QdrantIndex::new(&config)?;
    let kb = Arc::new(KnowledgeBase::new(
        config,
        Box::new(provider),
        Box::new(index),
    ));

    // Populate the vector index before accepting traffic. A store
    // connectivity failure here aborts startup.
    let report = kb.ensure_ingested().await?;
    if !report.failed_ids.is_empty() {
        warn!(
            failed = report.failed_ids.len(),
            "some batches failed during ingestion; retrying skipped entries"
        );
        let retried = kb.retry_failed(&report.failed_ids).await?;
        info!(recovered = retried.upserted, "retry pass finished");
    }

    api::start(kb).await?;

    Ok(())
}
