use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{debug, error};

use crate::{
    error_handler::{AppError, AppResult},
    routes::{search_request::SearchRequest, search_response::SearchResponse},
    state::AppState,
};

/// Semantic search endpoint used by the downstream agent.
pub async fn search_route(
    State(state): State<Arc<AppState>>,
    Json(p): Json<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    if p.query.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".into()));
    }
    if p.top_k == 0 {
        return Err(AppError::BadRequest(
            "top_k must be a positive integer".into(),
        ));
    }

    debug!(query = %p.query, top_k = p.top_k, "search_route: start");

    match state.kb.search(&p.query, p.top_k).await {
        Ok(hits) => {
            debug!(hits = hits.len(), "search_route: success");
            Ok(Json(SearchResponse::from_hits(hits)))
        }
        Err(err) => {
            error!(error = %err, "search_route: search failed");
            Err(AppError::Search(err))
        }
    }
}
