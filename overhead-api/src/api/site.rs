//! Root and crawler endpoints

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /";

/// GET /
///
/// Nothing is served at the root.
pub async fn root() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({})))
}

/// GET /robots.txt
pub async fn robots() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], ROBOTS_TXT)
}
