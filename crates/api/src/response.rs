use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

/// 201 + JSON
pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(data))
}

/// `{"message": ...}`
pub fn message(text: impl Into<String>) -> impl IntoResponse {
    Json(json!({ "message": text.into() }))
}
