//! HTTP API: in-memory conversions for browsers and scripts.
//!
//! | Route | Body | Response |
//! |-------|------|----------|
//! | `POST /convert` | multipart `file` (+ `ocr`, `ocr_lang`) | `{content, filename, mimeType, metadata, qualityScore, words, tokens, fits}` |
//! | `POST /convert/url` | `{"url": …}` | `{content, url, mimeType, words, tokens, fits}` |
//! | `POST /convert/clipboard` | `{"html"?: …, "text"?: …}` | `{content, words, tokens, fits}` |
//! | `GET /formats` | | `{formats: [{ext, mime}, …]}` |
//! | `GET /` | | small upload page |
//!
//! Errors are `{"error": message}` with 400 for malformed requests, 502 when
//! a URL fetch fails and 500 when conversion fails. Every response allows
//! any origin.

use crate::config::ConverterConfig;
use crate::convert::{convert_clipboard, convert_upload, convert_url, Upload};
use crate::error::Docs2LlmError;
use crate::formats::{supported_formats, FormatDescriptor};
use crate::pipeline::extract::{BuiltinConverter, InboundConverter};
use crate::tokens::{EstimatingTokenCounter, TokenCounter, TokenFitResult};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Default port for `docs2llm serve`.
pub const DEFAULT_PORT: u16 = 3000;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub inbound: Arc<dyn InboundConverter>,
    pub tokens: Arc<dyn TokenCounter>,
    pub config: Arc<ConverterConfig>,
    pub http: reqwest::Client,
}

impl AppState {
    /// State with the built-in converter and the estimating token counter.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            inbound: Arc::new(BuiltinConverter),
            tokens: Arc::new(EstimatingTokenCounter),
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_inbound(mut self, inbound: Arc<dyn InboundConverter>) -> Self {
        self.inbound = inbound;
        self
    }

    pub fn with_token_counter(mut self, tokens: Arc<dyn TokenCounter>) -> Self {
        self.tokens = tokens;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/convert", post(convert_file_upload))
        .route("/convert/url", post(convert_remote_url))
        .route("/convert/clipboard", post(convert_clipboard_contents))
        .route("/formats", get(list_formats))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "docs2llm server running at http://localhost:{}",
        listener.local_addr()?.port()
    );
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

/// Serve on an already-bound listener (tests bind port 0).
pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    state: AppState,
) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state)).await
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// `{"error": message}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn from_conversion(err: Docs2LlmError) -> Self {
        let status = match &err {
            Docs2LlmError::Validation(_) => StatusCode::BAD_REQUEST,
            Docs2LlmError::FetchFailed { .. } | Docs2LlmError::FetchTimeout { .. } => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("Request failed ({}): {}", status.as_u16(), err);
        }
        let message = match err {
            Docs2LlmError::FetchFailed { reason, .. } => format!("Fetch failed: {reason}"),
            other => other.to_string(),
        };
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    content: String,
    filename: Option<String>,
    mime_type: Option<String>,
    metadata: Map<String, Value>,
    quality_score: Option<f64>,
    words: usize,
    tokens: usize,
    fits: Vec<TokenFitResult>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UrlResponse {
    content: String,
    url: String,
    mime_type: Option<String>,
    words: usize,
    tokens: usize,
    fits: Vec<TokenFitResult>,
}

#[derive(Serialize)]
struct ClipboardResponse {
    content: String,
    words: usize,
    tokens: usize,
    fits: Vec<TokenFitResult>,
}

#[derive(Serialize)]
struct FormatsResponse {
    formats: &'static [FormatDescriptor],
}

#[derive(Deserialize)]
struct UrlRequest {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ClipboardRequest {
    html: Option<String>,
    text: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

const INVALID_MULTIPART: &str = "Invalid request. Send multipart/form-data with a 'file' field.";

async fn convert_file_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::bad_request(INVALID_MULTIPART))?;

    let mut upload: Option<Upload> = None;
    let mut ocr = None;
    let mut ocr_language = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request(INVALID_MULTIPART))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| ApiError::bad_request(INVALID_MULTIPART))?;
                upload = Some(Upload {
                    bytes: bytes.to_vec(),
                    filename,
                    content_type,
                    ..Upload::default()
                });
            }
            "ocr" => ocr = field.text().await.ok(),
            "ocr_lang" => ocr_language = field.text().await.ok(),
            _ => {}
        }
    }

    let mut upload =
        upload.ok_or_else(|| ApiError::bad_request("No file uploaded. Send a 'file' field."))?;
    upload.ocr = ocr;
    upload.ocr_language = ocr_language;
    let filename = upload.filename.clone();

    let out = convert_upload(upload, &state.inbound, state.tokens.as_ref(), &state.config)
        .await
        .map_err(ApiError::from_conversion)?;

    Ok(Json(UploadResponse {
        content: out.content,
        filename,
        mime_type: out.mime_type,
        metadata: out.metadata,
        quality_score: out.quality_score,
        words: out.words,
        tokens: out.tokens,
        fits: out.fits,
    }))
}

async fn convert_remote_url(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UrlResponse>, ApiError> {
    let request: UrlRequest = serde_json::from_slice(&body)
        .map_err(|_| ApiError::bad_request("Invalid JSON body. Send {\"url\": \"...\"}."))?;
    let url = request
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing 'url' field."))?;

    let out = convert_url(
        &state.http,
        &url,
        &state.inbound,
        state.tokens.as_ref(),
        &state.config,
    )
    .await
    .map_err(ApiError::from_conversion)?;

    Ok(Json(UrlResponse {
        content: out.content,
        url,
        mime_type: out.mime_type,
        words: out.words,
        tokens: out.tokens,
        fits: out.fits,
    }))
}

async fn convert_clipboard_contents(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClipboardResponse>, ApiError> {
    let request: ClipboardRequest = serde_json::from_slice(&body).map_err(|_| {
        ApiError::bad_request("Invalid JSON body. Send {\"html\": \"...\", \"text\": \"...\"}.")
    })?;

    let out = convert_clipboard(
        request.html.as_deref(),
        request.text.as_deref(),
        state.tokens.as_ref(),
        &state.config,
    )
    .map_err(ApiError::from_conversion)?;

    Ok(Json(ClipboardResponse {
        content: out.content,
        words: out.words,
        tokens: out.tokens,
        fits: out.fits,
    }))
}

async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        formats: supported_formats(),
    })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: "Not found".to_string(),
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>docs2llm</title>
<style>
  body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; background: #0a0a0a; color: #e5e5e5; margin: 0; }
  header { padding: 1.5rem 2rem; border-bottom: 1px solid #262626; }
  main { max-width: 720px; margin: 2rem auto; padding: 0 1rem; }
  .drop { border: 2px dashed #404040; border-radius: 12px; padding: 3rem 2rem; text-align: center; color: #a3a3a3; cursor: pointer; }
  .drop.over { background: #171717; }
  .row { display: flex; gap: .5rem; margin-top: 1.5rem; }
  input[type=text] { flex: 1; background: #171717; border: 1px solid #262626; border-radius: 6px; padding: .5rem; color: #e5e5e5; }
  button { background: #262626; border: 1px solid #404040; border-radius: 6px; padding: .5rem 1rem; color: #e5e5e5; cursor: pointer; }
  #stats { margin-top: 1.5rem; font-size: .85rem; color: #a3a3a3; }
  pre { white-space: pre-wrap; word-wrap: break-word; font-size: .8rem; line-height: 1.6; }
  .yes { color: #4ade80; } .no { color: #f87171; }
</style>
</head>
<body>
<header><strong>docs2llm</strong> &middot; Convert documents to LLM-friendly text</header>
<main>
  <div class="drop" id="drop">Drop a file here, click to browse, or paste</div>
  <input type="file" id="file" hidden>
  <div class="row">
    <input type="text" id="url" placeholder="https://example.com/page">
    <button onclick="convertUrl()">Convert URL</button>
  </div>
  <div id="stats"></div>
  <pre id="out"></pre>
</main>
<script>
const drop = document.getElementById('drop');
const file = document.getElementById('file');
drop.onclick = () => file.click();
drop.ondragover = (e) => { e.preventDefault(); drop.classList.add('over'); };
drop.ondragleave = () => drop.classList.remove('over');
drop.ondrop = (e) => { e.preventDefault(); drop.classList.remove('over'); if (e.dataTransfer.files[0]) upload(e.dataTransfer.files[0]); };
file.onchange = () => { if (file.files[0]) upload(file.files[0]); };
document.addEventListener('paste', (e) => {
  if (e.target.tagName === 'INPUT') return;
  e.preventDefault();
  const d = e.clipboardData;
  if (d.files.length > 0) return upload(d.files[0]);
  const html = d.getData('text/html');
  post('/convert/clipboard', JSON.stringify(html ? { html } : { text: d.getData('text/plain') }));
});
function upload(f) { const form = new FormData(); form.append('file', f); send('/convert', { method: 'POST', body: form }); }
function convertUrl() { const url = document.getElementById('url').value.trim(); if (url) post('/convert/url', JSON.stringify({ url })); }
function post(path, body) { send(path, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body }); }
async function send(path, init) {
  const out = document.getElementById('out'), stats = document.getElementById('stats');
  out.textContent = 'Converting…'; stats.textContent = '';
  try {
    const data = await (await fetch(path, init)).json();
    if (data.error) throw new Error(data.error);
    stats.innerHTML = data.words + ' words &middot; ~' + data.tokens + ' tokens &middot; ' +
      data.fits.map(f => '<span class="' + (f.fits ? 'yes' : 'no') + '">' + f.name + ' ' + (f.fits ? '✓' : '✗') + '</span>').join(' ');
    out.textContent = data.content;
  } catch (err) { out.textContent = 'Error: ' + err.message; }
}
</script>
</body>
</html>
"#;
