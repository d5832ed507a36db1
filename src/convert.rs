//! Conversion orchestration: one entry point per kind of source.
//!
//! [`execute`] runs a [`ConversionPlan`] produced by the planner and is used
//! by every file-based caller (single file, batch, interactive wizard). The
//! byte-oriented variants ([`convert_upload`], [`convert_url`],
//! [`convert_clipboard`]) serve the HTTP API and follow the same direction
//! contract: they only ever produce normalized text.
//!
//! No layer here retries. The first error from the converter, the renderer
//! or the file system is returned unchanged and the caller decides whether
//! to continue (batch) or abort.

use crate::config::ConverterConfig;
use crate::error::{Docs2LlmError, ValidationError};
use crate::formats::{detect_mime, is_image};
use crate::options::{resolve_ocr, OcrOptions, OcrRequest};
use crate::output::{format_document, write_output, ConversionResult, TextOutput};
use crate::pipeline::extract::{convert_html_to_markdown, ExtractedDocument, InboundConverter};
use crate::pipeline::input::{fetch_url, read_source};
use crate::pipeline::postprocess::clean_markdown;
use crate::pipeline::render::{CommandRunner, RendererGateway};
use crate::plan::{build_plan, ConversionDirection, ConversionPlan, PlanRequest};
use crate::progress::BatchProgressCallback;
use crate::tokens::TokenCounter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Execute a conversion plan.
///
/// * Outbound: delegates to the renderer and returns both paths.
/// * Inbound: reads the source, extracts normalized text, formats it for
///   `plan.format` and writes it atomically to `plan.output_path`.
pub async fn execute<R: CommandRunner>(
    plan: &ConversionPlan,
    inbound: &Arc<dyn InboundConverter>,
    gateway: &RendererGateway<R>,
    config: &ConverterConfig,
) -> Result<ConversionResult, Docs2LlmError> {
    let start = Instant::now();
    info!(
        "Converting {} → {} ({:?})",
        plan.source_path.display(),
        plan.output_path.display(),
        plan.direction
    );

    let result = match plan.direction {
        ConversionDirection::Outbound => {
            let output_path = gateway
                .render(&plan.source_path, &plan.output_path, plan.renderer_args())
                .await?;
            ConversionResult {
                source_path: plan.source_path.clone(),
                output_path,
                content: None,
                metadata: None,
            }
        }
        ConversionDirection::Inbound => execute_inbound(plan, inbound, config).await?,
    };

    debug!("Converted in {}ms", start.elapsed().as_millis());
    Ok(result)
}

async fn execute_inbound(
    plan: &ConversionPlan,
    inbound: &Arc<dyn InboundConverter>,
    config: &ConverterConfig,
) -> Result<ConversionResult, Docs2LlmError> {
    let bytes = read_source(&plan.source_path).await?;
    let source_name = plan
        .source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mime = detect_mime(None, Some(&source_name), &bytes);
    let ocr = resolve_ocr(&OcrRequest {
        is_image: is_image(&mime),
        ..OcrRequest::default()
    });
    debug!("Source MIME {} (OCR {:?})", mime, ocr);

    let mut doc = extract(inbound, bytes, mime, ocr).await?;
    if config.clean_output {
        doc.content = clean_markdown(&doc.content);
    }

    let formatted = format_document(&doc, &source_name, plan.format)?;
    write_output(&plan.output_path, formatted).await?;

    Ok(ConversionResult {
        source_path: plan.source_path.clone(),
        output_path: plan.output_path.clone(),
        content: Some(doc.content),
        metadata: Some(doc.metadata),
    })
}

/// Plan and execute the conversion of a single file.
pub async fn convert_file<R: CommandRunner>(
    source: &Path,
    request: &PlanRequest<'_>,
    inbound: &Arc<dyn InboundConverter>,
    gateway: &RendererGateway<R>,
    config: &ConverterConfig,
) -> Result<ConversionResult, Docs2LlmError> {
    let plan = build_plan(source, request)?;
    execute(&plan, inbound, gateway, config).await
}

/// Run the CPU-bound converter on the blocking pool.
async fn extract(
    inbound: &Arc<dyn InboundConverter>,
    bytes: Vec<u8>,
    mime: String,
    ocr: OcrOptions,
) -> Result<ExtractedDocument, Docs2LlmError> {
    let converter = Arc::clone(inbound);
    tokio::task::spawn_blocking(move || converter.convert_bytes(&bytes, &mime, &ocr))
        .await
        .map_err(|e| Docs2LlmError::Internal(format!("Conversion task panicked: {e}")))?
}

// ── In-memory conversions ────────────────────────────────────────────────────

/// An uploaded document plus the client's OCR form fields.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    /// `ocr` form field: `"true"`, `"1"` or `"force"`.
    pub ocr: Option<String>,
    /// `ocr_lang` form field.
    pub ocr_language: Option<String>,
}

/// Convert uploaded bytes to normalized text.
///
/// The MIME type comes from the declared content type, else the file name,
/// else image magic bytes. Images get OCR even when no OCR field was sent.
pub async fn convert_upload(
    upload: Upload,
    inbound: &Arc<dyn InboundConverter>,
    counter: &dyn TokenCounter,
    config: &ConverterConfig,
) -> Result<TextOutput, Docs2LlmError> {
    let mime = detect_mime(
        upload.content_type.as_deref(),
        upload.filename.as_deref(),
        &upload.bytes,
    );
    let ocr = resolve_ocr(&OcrRequest::from_form(
        upload.ocr.as_deref(),
        upload.ocr_language.as_deref(),
        is_image(&mime),
    ));
    info!(
        "Converting upload {} ({} bytes, {})",
        upload.filename.as_deref().unwrap_or("(unnamed)"),
        upload.bytes.len(),
        mime
    );

    let mut doc = extract(inbound, upload.bytes, mime, ocr).await?;
    if config.clean_output {
        doc.content = clean_markdown(&doc.content);
    }
    Ok(TextOutput::from_document(doc, counter, &config.token_limits))
}

/// Fetch a URL and convert the response to normalized text.
///
/// HTML pages go through the HTML converter; anything else goes to the
/// inbound converter with the response's MIME type.
pub async fn convert_url(
    client: &reqwest::Client,
    url: &str,
    inbound: &Arc<dyn InboundConverter>,
    counter: &dyn TokenCounter,
    config: &ConverterConfig,
) -> Result<TextOutput, Docs2LlmError> {
    let fetched = fetch_url(
        client,
        url,
        config.download_timeout_secs,
        config.max_upload_bytes,
    )
    .await?;

    let mut doc = if fetched.is_html() {
        let html = String::from_utf8_lossy(&fetched.bytes);
        ExtractedDocument {
            content: convert_html_to_markdown(&html),
            mime_type: "text/html".to_string(),
            ..ExtractedDocument::default()
        }
    } else {
        let mime = detect_mime(
            Some(&fetched.mime_type),
            fetched.filename.as_deref(),
            &fetched.bytes,
        );
        let ocr = resolve_ocr(&OcrRequest {
            is_image: is_image(&mime),
            ..OcrRequest::default()
        });
        extract(inbound, fetched.bytes, mime, ocr).await?
    };

    if config.clean_output {
        doc.content = clean_markdown(&doc.content);
    }
    Ok(TextOutput::from_document(doc, counter, &config.token_limits))
}

/// Convert clipboard contents. HTML wins over plain text; plain text is
/// returned as-is (trimmed).
pub fn convert_clipboard(
    html: Option<&str>,
    text: Option<&str>,
    counter: &dyn TokenCounter,
    config: &ConverterConfig,
) -> Result<TextOutput, Docs2LlmError> {
    let html = html.map(str::trim).filter(|s| !s.is_empty());
    let text = text.map(str::trim).filter(|s| !s.is_empty());

    let content = match (html, text) {
        (Some(html), _) => {
            let md = convert_html_to_markdown(html);
            if config.clean_output {
                clean_markdown(&md)
            } else {
                md
            }
        }
        (None, Some(text)) => text.to_string(),
        (None, None) => {
            return Err(ValidationError::new("Provide at least 'html' or 'text'.").into());
        }
    };

    Ok(TextOutput::new(content, counter, &config.token_limits))
}

// ── Batch ────────────────────────────────────────────────────────────────────

/// What happened to one file of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Converted { source: PathBuf, output: PathBuf },
    Skipped { source: PathBuf, reason: String },
    Failed { source: PathBuf, error: String },
}

/// Aggregate result of [`convert_folder`].
///
/// `converted + failed + skipped` always equals `outcomes.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// `"X converted, Y failed"` plus `", Z skipped"` when any were skipped.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} converted", self.converted),
            format!("{} failed", self.failed),
        ];
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        parts.join(", ")
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Converted { .. } => self.converted += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Non-hidden regular files directly inside `dir`, sorted by name.
pub async fn list_batch_files(dir: &Path) -> Result<Vec<PathBuf>, Docs2LlmError> {
    let read_err = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => Docs2LlmError::FileNotFound {
            path: dir.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Docs2LlmError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => Docs2LlmError::Internal(format!("Failed to list '{}': {e}", dir.display())),
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
        if is_file && !hidden {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Convert every file of `dir` sequentially with the same request.
///
/// Validation failures are counted as skipped; any other error is counted as
/// failed. Neither stops the batch.
pub async fn convert_folder<R: CommandRunner>(
    dir: &Path,
    request: &PlanRequest<'_>,
    inbound: &Arc<dyn InboundConverter>,
    gateway: &RendererGateway<R>,
    config: &ConverterConfig,
    progress: &dyn BatchProgressCallback,
) -> Result<BatchReport, Docs2LlmError> {
    let files = list_batch_files(dir).await?;
    let total = files.len();
    info!("Batch converting {} files in {}", total, dir.display());
    progress.on_batch_start(total);

    let mut report = BatchReport::default();
    for (i, source) in files.into_iter().enumerate() {
        let index = i + 1;
        progress.on_file_start(index, total, &source);

        let outcome = match convert_file(&source, request, inbound, gateway, config).await {
            Ok(result) => {
                progress.on_file_complete(index, total, &source, &result.output_path);
                FileOutcome::Converted {
                    source,
                    output: result.output_path,
                }
            }
            Err(e) if e.is_validation() => {
                let reason = e.to_string();
                debug!("Skipping {}: {}", source.display(), reason);
                progress.on_file_skipped(index, total, &source, &reason);
                FileOutcome::Skipped { source, reason }
            }
            Err(e) => {
                let error = e.to_string();
                warn!("Failed {}: {}", source.display(), error);
                progress.on_file_error(index, total, &source, &error);
                FileOutcome::Failed { source, error }
            }
        };
        report.record(outcome);
    }

    progress.on_batch_complete(report.converted, report.failed, report.skipped);
    info!("Batch done: {}", report.summary());
    Ok(report)
}
