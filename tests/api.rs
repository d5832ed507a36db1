//! HTTP API integration tests.
//!
//! Each test binds the API to an ephemeral port and drives it with reqwest.
//! `/convert/url` tests also start a small axum fixture server to fetch from.

#![cfg(feature = "server")]

use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use docs2llm::server::{serve_listener, AppState};
use docs2llm::{ConverterConfig, Docs2LlmError, ExtractedDocument, InboundConverter, OcrOptions};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Converter that records what it was asked to do.
#[derive(Default)]
struct RecordingConverter {
    calls: Mutex<Vec<(String, OcrOptions)>>,
}

impl InboundConverter for RecordingConverter {
    fn convert_bytes(
        &self,
        _bytes: &[u8],
        mime_type: &str,
        ocr: &OcrOptions,
    ) -> Result<ExtractedDocument, Docs2LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((mime_type.to_string(), ocr.clone()));
        Ok(ExtractedDocument {
            content: "recognized text".into(),
            mime_type: mime_type.to_string(),
            quality_score: Some(0.9),
            ..ExtractedDocument::default()
        })
    }
}

async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_api(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve_listener(listener, state).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_default_api() -> String {
    spawn_api(AppState::new(ConverterConfig::default())).await
}

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

// ── /convert ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_image_without_type_gets_ocr() {
    let recorder = Arc::new(RecordingConverter::default());
    let state = AppState::new(ConverterConfig::default())
        .with_inbound(recorder.clone() as Arc<dyn InboundConverter>);
    let base = spawn_api(state).await;

    let part = Part::bytes(PNG_MAGIC.to_vec())
        .file_name("scan")
        .mime_str("application/octet-stream")
        .unwrap();
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["content"], "recognized text");
    assert_eq!(body["filename"], "scan");
    assert_eq!(body["mimeType"], "image/png");
    assert_eq!(body["qualityScore"], 0.9);
    assert_eq!(body["words"], 2);
    assert!(body["fits"].as_array().unwrap().iter().all(|f| f["fits"] == true));

    let calls = recorder.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            "image/png".to_string(),
            OcrOptions::Enabled {
                force: true,
                language: None
            }
        )]
    );
}

#[tokio::test]
async fn test_upload_text_file_with_builtin_converter() {
    let base = spawn_default_api().await;

    let part = Part::bytes(b"hello   world\r\n".to_vec()).file_name("notes.txt");
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["content"], "hello   world\n");
    assert_eq!(body["mimeType"], "text/plain");
    assert!(body["qualityScore"].is_null());
    assert!(body["metadata"].is_object());
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let base = spawn_default_api().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert"))
        .multipart(Form::new().text("ocr", "true"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded. Send a 'file' field.");
}

#[tokio::test]
async fn test_upload_that_is_not_multipart() {
    let base = spawn_default_api().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert"))
        .json(&json!({ "file": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Invalid request. Send multipart/form-data with a 'file' field."
    );
}

#[tokio::test]
async fn test_unsupported_upload_is_server_error() {
    let base = spawn_default_api().await;
    let part = Part::bytes(b"%PDF-1.7".to_vec()).file_name("report.pdf");
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("application/pdf"));
}

// ── /convert/url ─────────────────────────────────────────────────────────────

async fn spawn_fixture() -> String {
    let router = Router::new().route(
        "/article",
        get(|| async {
            Html("<html><head><title>T</title></head><body><h1>Hello</h1><p>World</p></body></html>")
        }),
    );
    spawn_router(router).await
}

#[tokio::test]
async fn test_convert_url_html_page() {
    let fixture = spawn_fixture().await;
    let base = spawn_default_api().await;
    let url = format!("{fixture}/article");

    let resp = reqwest::Client::new()
        .post(format!("{base}/convert/url"))
        .json(&json!({ "url": url }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["url"], url);
    assert_eq!(body["mimeType"], "text/html");
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("Hello"), "got: {content}");
    assert!(content.contains("World"));
    assert!(body["tokens"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_convert_url_upstream_404_is_bad_gateway() {
    let fixture = spawn_fixture().await;
    let base = spawn_default_api().await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/convert/url"))
        .json(&json!({ "url": format!("{fixture}/missing") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Fetch failed: 404 Not Found");
}

#[tokio::test]
async fn test_convert_url_body_over_limit_is_bad_gateway() {
    let fixture = spawn_fixture().await;
    let config = ConverterConfig::builder().max_upload_bytes(64).build().unwrap();
    let base = spawn_api(AppState::new(config)).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/convert/url"))
        .json(&json!({ "url": format!("{fixture}/article") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Fetch failed: response body exceeds 64 bytes"
    );
}

#[tokio::test]
async fn test_convert_url_request_validation() {
    let base = spawn_default_api().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/convert/url"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid JSON body. Send {\"url\": \"...\"}.");

    let resp = client
        .post(format!("{base}/convert/url"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing 'url' field.");
}

// ── /convert/clipboard ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_clipboard_prefers_html() {
    let base = spawn_default_api().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert/clipboard"))
        .json(&json!({ "html": "<p><strong>bold</strong> move</p>", "text": "ignored" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let content = body["content"].as_str().unwrap();
    assert!(content.contains("**bold**"), "got: {content}");
    assert!(!content.contains("ignored"));
    assert_eq!(body["words"], 2);
    assert!(body.get("mimeType").is_none());
}

#[tokio::test]
async fn test_clipboard_requires_content() {
    let base = spawn_default_api().await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/convert/clipboard"))
        .json(&json!({ "html": "", "text": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Provide at least 'html' or 'text'.");
}

// ── Misc routes ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_formats_lists_registry_with_cors() {
    let base = spawn_default_api().await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/formats"))
        .header("Origin", "https://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["access-control-allow-origin"]
            .to_str()
            .unwrap(),
        "*"
    );

    let body: Value = resp.json().await.unwrap();
    let formats = body["formats"].as_array().unwrap();
    assert_eq!(formats.len(), docs2llm::supported_formats().len());
    assert!(formats.contains(&json!({ "ext": "pdf", "mime": "application/pdf" })));
}

#[tokio::test]
async fn test_index_and_unknown_routes() {
    let base = spawn_default_api().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("docs2llm"));

    let resp = client.get(format!("{base}/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Not found");
}

#[test]
fn test_default_state_uses_builtin_converter() {
    let state = AppState::default();
    let doc = state
        .inbound
        .convert_bytes(b"hi", "text/plain", &OcrOptions::Disabled)
        .unwrap();
    assert_eq!(doc.content, "hi");
}
