//! Plain HTTP handlers: the voice chat page and the health check.

use axum::Json;
use axum::response::Html;
use serde_json::{Value, json};

/// Embedded single-page voice chat client.
const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Serve the voice chat page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_payload() {
        let Json(body) = health_check().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "voxrelay");
    }

    #[tokio::test]
    async fn test_index_serves_page() {
        let Html(page) = index().await;
        assert!(page.contains("/ws/chat"));
    }
}
