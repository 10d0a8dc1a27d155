use std::sync::Arc;

use knowledge_store::KnowledgeBase;

/// Shared state for all HTTP handlers.
///
/// The knowledge base is read-only at this point: ingestion has
/// already finished before the router is built.
#[derive(Clone)]
pub struct AppState {
    pub kb: Arc<KnowledgeBase>,
}
