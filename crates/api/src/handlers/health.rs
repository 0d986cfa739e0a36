use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}
