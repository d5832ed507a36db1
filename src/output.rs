//! Conversion results and normalized-output formatting.
//!
//! Inbound conversions produce an [`ExtractedDocument`]; this module turns it
//! into the bytes written to disk (`md`, `json` or `yaml`) and writes them
//! atomically. In-memory conversions (HTTP, clipboard) return a
//! [`TextOutput`] that also carries token statistics and the LLM fit report.

use crate::config::OutputFormat;
use crate::error::Docs2LlmError;
use crate::pipeline::extract::ExtractedDocument;
use crate::tokens::{fit_report, token_stats, TokenCounter, TokenFitResult, TokenLimit};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of one file conversion.
///
/// Outbound results only carry paths; inbound results also carry the
/// normalized content and converter metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Normalized text plus statistics, for conversions that never touch disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOutput {
    pub content: String,
    pub mime_type: Option<String>,
    pub metadata: Map<String, Value>,
    pub quality_score: Option<f64>,
    pub words: usize,
    pub tokens: usize,
    pub fits: Vec<TokenFitResult>,
}

impl TextOutput {
    /// Compute statistics for `content` and wrap it.
    pub fn new(content: String, counter: &dyn TokenCounter, limits: &[TokenLimit]) -> Self {
        let stats = token_stats(&content, counter);
        Self {
            fits: fit_report(stats.tokens, limits),
            words: stats.words,
            tokens: stats.tokens,
            content,
            mime_type: None,
            metadata: Map::new(),
            quality_score: None,
        }
    }

    /// Statistics for an extracted document, keeping its MIME type,
    /// metadata and quality score.
    pub fn from_document(
        doc: ExtractedDocument,
        counter: &dyn TokenCounter,
        limits: &[TokenLimit],
    ) -> Self {
        let mut out = Self::new(doc.content, counter, limits);
        out.mime_type = Some(doc.mime_type);
        out.metadata = doc.metadata;
        out.quality_score = doc.quality_score;
        out
    }
}

/// On-disk shape of JSON and YAML outputs.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedDocument<'a> {
    source: &'a str,
    mime_type: &'a str,
    metadata: &'a Map<String, Value>,
    quality_score: Option<f64>,
    content: &'a str,
}

/// Render `doc` in a normalized-text format.
///
/// Markdown is the content alone. JSON and YAML wrap the content with its
/// source name, MIME type, metadata and quality score. Native formats are
/// produced by the renderer and rejected here.
pub fn format_document(
    doc: &ExtractedDocument,
    source_name: &str,
    format: OutputFormat,
) -> Result<String, Docs2LlmError> {
    let wrapped = NormalizedDocument {
        source: source_name,
        mime_type: &doc.mime_type,
        metadata: &doc.metadata,
        quality_score: doc.quality_score,
        content: &doc.content,
    };
    let failed = |detail: String| Docs2LlmError::OutputFormatFailed {
        format: format.to_string(),
        detail,
    };

    match format {
        OutputFormat::Markdown => Ok(doc.content.clone()),
        OutputFormat::Json => serde_json::to_string_pretty(&wrapped)
            .map(|s| s + "\n")
            .map_err(|e| failed(e.to_string())),
        OutputFormat::Yaml => serde_yaml::to_string(&wrapped).map_err(|e| failed(e.to_string())),
        native => Err(failed(format!(
            ".{native} is produced by the external renderer, not by inbound conversion"
        ))),
    }
}

/// Write `content` to `path` atomically, creating parent directories.
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a partial file.
pub async fn write_output(path: &Path, content: String) -> Result<(), Docs2LlmError> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, content.as_bytes()))
        .await
        .map_err(|e| Docs2LlmError::Internal(format!("Write task panicked: {e}")))?
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Docs2LlmError> {
    let fail = |source: std::io::Error| Docs2LlmError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
