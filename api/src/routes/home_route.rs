use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HomeResponse {
    pub message: String,
}

/// Service banner. Reaching it also means ingestion has completed,
/// since the listener only binds afterwards.
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Knowledge API is running".into(),
    })
}
