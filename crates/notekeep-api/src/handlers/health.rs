use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::warn;

use crate::AppState;

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Notes API is running!",
    }))
}

/// Liveness plus a store round-trip. Reports 503 while the store is down.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database) = match state.notes.ping().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(e) => {
            warn!(subsystem = "api", error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(serde_json::json!({
            "status": if status.is_success() { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
        })),
    )
}
