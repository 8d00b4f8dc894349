use crate::api::AppState;
use axum::extract::State;
use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Ready once the document store can be read.
pub async fn ready(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store_ok = state.repo.load().await.is_ok();
    let scheduler = state.scheduler_state.as_ref().map(|rx| *rx.borrow());
    Json(serde_json::json!({
        "status": if store_ok { "ready" } else { "degraded" },
        "store": store_ok,
        "scheduler": scheduler,
    }))
}
