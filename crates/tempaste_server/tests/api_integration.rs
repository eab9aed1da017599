//! Integration tests for the tempaste HTTP API.

mod support;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use support::{setup_test_server, setup_test_server_with, test_config, test_server_for_state};
use tempaste_core::Renderer;
use tempaste_server::PasteRecord;

#[tokio::test]
async fn test_paste_lifecycle() {
    let (server, state) = setup_test_server();

    let create_response = server.post("/paste").text("Hello, World!").await;
    assert_eq!(create_response.status_code(), StatusCode::OK);
    let created: serde_json::Value = create_response.json();
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(id.len(), 6);
    assert!(created["url"]
        .as_str()
        .expect("url")
        .ends_with(&format!("/{}", id)));

    let page = server.get(&format!("/{}", id)).await;
    assert_eq!(page.status_code(), StatusCode::OK);
    let html = page.text();
    assert!(html.contains("Hello, World!"));
    assert!(html.contains("1 view"));

    let api = server.get(&format!("/api/paste/{}", id)).await;
    assert_eq!(api.status_code(), StatusCode::OK);
    let record: PasteRecord = api.json();
    assert_eq!(record.content, "Hello, World!");
    assert_eq!(record.view_count, 2);

    assert_eq!(state.store().len(), 1);
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let (server, state) = setup_test_server();

    let response = server.post("/paste").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Paste content is empty");
    assert!(state.store().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected_without_creating_paste() {
    let (server, state) = setup_test_server_with(test_config(16), tempaste_server::PASTE_TTL);

    let fits = server.post("/paste").text("0123456789abcdef").await;
    assert_eq!(fits.status_code(), StatusCode::OK);

    let too_big = server.post("/paste").text("0123456789abcdefX").await;
    assert_eq!(too_big.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = too_big.json();
    assert_eq!(body["error"], "Paste size exceeds maximum of 16 bytes");
    assert_eq!(state.store().len(), 1);
}

#[tokio::test]
async fn test_invalid_utf8_body_under_limit_is_stored() {
    let (server, state) = setup_test_server_with(test_config(16), tempaste_server::PASTE_TTL);

    let response = server
        .post("/paste")
        .bytes(Bytes::from_static(&[0xff; 10]))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let created: serde_json::Value = response.json();
    let id = created["id"].as_str().expect("id");
    assert_eq!(
        state.store().peek(id).expect("record").content,
        "\u{FFFD}".repeat(10)
    );
}

#[tokio::test]
async fn test_missing_paste_returns_not_found_page() {
    let (server, _state) = setup_test_server();

    let page = server.get("/ffffff").await;
    assert_eq!(page.status_code(), StatusCode::NOT_FOUND);
    assert!(page.text().contains("not found or expired"));

    let api = server.get("/api/paste/ffffff").await;
    assert_eq!(api.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = api.json();
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_expired_paste_looks_like_missing_paste() {
    let (server, _state) = setup_test_server_with(test_config(1024), Duration::from_millis(50));

    let created: serde_json::Value = server.post("/paste").text("fleeting").await.json();
    let id = created["id"].as_str().expect("id").to_string();
    assert_eq!(server.get(&format!("/{}", id)).await.status_code(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let expired = server.get(&format!("/{}", id)).await;
    let missing = server.get("/ffffff").await;
    assert_eq!(expired.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        expired.text().replace(&id, "ID"),
        missing.text().replace("ffffff", "ID")
    );
}

#[tokio::test]
async fn test_paste_page_escapes_markup() {
    let (server, _state) = setup_test_server();

    let created: serde_json::Value = server
        .post("/paste")
        .text("<script>alert('x')</script>")
        .await
        .json();
    let id = created["id"].as_str().expect("id").to_string();

    let html = server.get(&format!("/{}", id)).await.text();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
}

#[tokio::test]
async fn test_url_uses_host_header_or_public_url() {
    let (server, _state) = setup_test_server();
    let created: serde_json::Value = server
        .post("/paste")
        .add_header(header::HOST, HeaderValue::from_static("paste.test:8080"))
        .text("hosted")
        .await
        .json();
    let id = created["id"].as_str().expect("id");
    assert_eq!(created["url"], format!("http://paste.test:8080/{}", id));

    let mut config = test_config(1024);
    config.public_url = Some("https://paste.example.com".to_string());
    let (server, _state) = setup_test_server_with(config, tempaste_server::PASTE_TTL);
    let created: serde_json::Value = server.post("/paste").text("public").await.json();
    let id = created["id"].as_str().expect("id");
    assert_eq!(created["url"], format!("https://paste.example.com/{}", id));
}

#[tokio::test]
async fn test_any_content_type_is_accepted() {
    let (server, state) = setup_test_server();

    let response = server
        .post("/paste")
        .bytes(Bytes::from_static(br#"{"not":"parsed"}"#))
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let created: serde_json::Value = response.json();
    let id = created["id"].as_str().expect("id");
    assert_eq!(
        state.store().peek(id).expect("record").content,
        r#"{"not":"parsed"}"#
    );
}

#[tokio::test]
async fn test_health_reports_live_pastes() {
    let (server, _state) = setup_test_server();
    server.post("/paste").text("one").await;
    server.post("/paste").text("two").await;

    let health: serde_json::Value = server.get("/health").await.json();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["live_pastes"], 2);
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let (server, _state) = setup_test_server();
    let response = server.get("/health").await;
    response.assert_header("x-content-type-options", "nosniff");
    response.assert_header("x-frame-options", "DENY");
    response.assert_contains_header("content-security-policy");
}

#[tokio::test]
async fn test_concurrent_creates_are_independently_retrievable() {
    let (server, state) = setup_test_server();

    let (first, second) = tokio::join!(
        async { server.post("/paste").text("first").await },
        async { server.post("/paste").text("second").await },
    );
    let first: serde_json::Value = first.json();
    let second: serde_json::Value = second.json();
    let first_id = first["id"].as_str().expect("id");
    let second_id = second["id"].as_str().expect("id");
    assert_ne!(first_id, second_id);

    assert_eq!(state.store().peek(first_id).expect("first").content, "first");
    assert_eq!(
        state.store().peek(second_id).expect("second").content,
        "second"
    );
}

struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render_paste(&self, paste: &PasteRecord) -> String {
        format!("{}|{}", paste.view_count, paste.content)
    }

    fn render_not_found(&self, id: &str) -> String {
        format!("missing {}", id)
    }
}

#[tokio::test]
async fn test_renderer_is_pluggable() {
    let (_, state) = setup_test_server();
    let state = state.with_renderer(Arc::new(PlainRenderer));
    let server = test_server_for_state(state);

    let created: serde_json::Value = server.post("/paste").text("<raw>").await.json();
    let id = created["id"].as_str().expect("id");

    assert_eq!(server.get(&format!("/{}", id)).await.text(), "1|<raw>");
    let missing = server.get("/ffffff").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.text(), "missing ffffff");
}
