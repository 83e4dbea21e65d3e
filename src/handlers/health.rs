use axum::Json;
use chrono::Utc;
use serde_json::json;

// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

// GET /
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Car Wash Booking API Server is running!",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
