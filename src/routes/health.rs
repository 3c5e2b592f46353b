use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ai-insights-report",
        "version": env!("CARGO_PKG_VERSION"),
        "llm_enabled": state.generator.is_enabled(),
        "storage_enabled": state.pool.is_some(),
    }))
}
