use std::{env, sync::Arc};

mod error_handler;
mod routes;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use knowledge_store::KnowledgeBase;
use tokio::signal;
use tracing::info;

pub use crate::error_handler::AppError;
use crate::routes::{home_route::home, search_route::search_route};
use crate::state::AppState;

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/search", post(search_route))
        .with_state(state)
}

/// Binds the listener and serves until ctrl-c.
///
/// Must be called after ingestion has completed; every handler
/// assumes the knowledge base is fully populated.
pub async fn start(kb: Arc<KnowledgeBase>) -> Result<(), AppError> {
    let addr = env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let state = Arc::new(AppState { kb });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "knowledge api listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
