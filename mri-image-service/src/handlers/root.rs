use axum::{response::IntoResponse, Json};
use serde_json::json;

pub const WELCOME_MESSAGE: &str =
    "Welcome to the Brain MRI API. Use /image/{index} to get an MRI image and mask.";

pub async fn read_root() -> impl IntoResponse {
    Json(json!({ "message": WELCOME_MESSAGE }))
}
