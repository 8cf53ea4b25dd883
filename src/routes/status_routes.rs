use axum::Json;
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "Grok Mirror API";

/// GET `/` — liveness descriptor
pub async fn index_handler() -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// GET `/health`
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
