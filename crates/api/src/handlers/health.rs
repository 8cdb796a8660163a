use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Response body for the health check endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub db_healthy: bool,
}

/// GET /health
///
/// Always answers 200; `dbHealthy` reports whether the database responds.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = aistudio_db::health_check(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        db_healthy,
    })
}
