//! Input acquisition: read a local source file or fetch a URL into memory.
//!
//! Inbound converters work on byte buffers, so both paths end in a
//! `Vec<u8>` plus the best MIME type we can determine. Fetches use the
//! caller's `reqwest::Client` with a per-request timeout; a non-success
//! status is reported with the upstream code and never retried.

use crate::error::Docs2LlmError;
use crate::formats::{essence, mime_for, OCTET_STREAM};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// A document downloaded from a URL.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: String,
    pub bytes: Vec<u8>,
    /// `Content-Type` essence, else a guess from the URL's file name.
    pub mime_type: String,
    /// Last path segment of the URL when it looks like a file name.
    pub filename: Option<String>,
}

impl FetchedDocument {
    /// `true` when the response is an HTML page rather than a document.
    pub fn is_html(&self) -> bool {
        matches!(self.mime_type.as_str(), "text/html" | "application/xhtml+xml")
    }
}

/// Read a local file, mapping missing and unreadable files to dedicated errors.
pub async fn read_source(path: &Path) -> Result<Vec<u8>, Docs2LlmError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) => Err(map_read_error(path, e)),
    }
}

fn map_read_error(path: &Path, e: std::io::Error) -> Docs2LlmError {
    match e.kind() {
        std::io::ErrorKind::NotFound => Docs2LlmError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Docs2LlmError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Docs2LlmError::Internal(format!("Failed to read '{}': {e}", path.display())),
    }
}

/// Download `url` with `client`, failing after `timeout_secs` or once the
/// body grows past `max_bytes`.
pub async fn fetch_url(
    client: &reqwest::Client,
    url: &str,
    timeout_secs: u64,
    max_bytes: usize,
) -> Result<FetchedDocument, Docs2LlmError> {
    info!("Fetching {}", url);

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            Docs2LlmError::FetchTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Docs2LlmError::FetchFailed {
                url: url.to_string(),
                status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            }
        }
    };

    let mut response = client
        .get(url)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Docs2LlmError::FetchFailed {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason: format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string(),
        });
    }

    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| essence(v).to_ascii_lowercase())
        .filter(|m| !m.is_empty());

    let too_large = || Docs2LlmError::FetchFailed {
        url: url.to_string(),
        status: None,
        reason: format!("response body exceeds {max_bytes} bytes"),
    };
    if response
        .content_length()
        .is_some_and(|len| len > max_bytes as u64)
    {
        return Err(too_large());
    }

    let filename = extract_filename(url);
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(classify)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(too_large());
        }
        bytes.extend_from_slice(&chunk);
    }

    let mime_type = declared.unwrap_or_else(|| {
        filename
            .as_deref()
            .map(mime_for)
            .unwrap_or(OCTET_STREAM)
            .to_string()
    });

    debug!("Fetched {} bytes ({}) from {}", bytes.len(), mime_type, url);

    Ok(FetchedDocument {
        url: url.to_string(),
        bytes,
        mime_type,
        filename,
    })
}

/// File name from the URL's last path segment, when it has an extension.
fn extract_filename(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    (!last.is_empty() && last.contains('.')).then(|| last.to_string())
}
