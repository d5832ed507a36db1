//! Inbound extraction: document bytes → normalised Markdown plus metadata.
//!
//! [`InboundConverter`] is the seam for the document engine. The crate ships
//! [`BuiltinConverter`], which covers the text-like formats that need no
//! native libraries:
//!
//! | MIME | Strategy |
//! |------|----------|
//! | `text/plain`, `text/markdown` | pass-through |
//! | `text/html`, `application/xhtml+xml` | `html2md` |
//! | `text/csv`, `text/tab-separated-values` | GFM table via `csv` |
//! | `application/json`, `application/xml` | fenced code block |
//! | `message/rfc822` | headers + body via `mail-parser` |
//!
//! Office documents, PDFs and images yield
//! [`Docs2LlmError::UnsupportedMime`]. Plug in a full engine by implementing
//! the trait and handing it to the orchestrator or the HTTP state.
//!
//! Conversion is synchronous and CPU-bound; the orchestrator runs it inside
//! `spawn_blocking`.

use crate::error::Docs2LlmError;
use crate::formats::{essence, is_image};
use crate::options::OcrOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write as _;

/// Normalised text and metadata produced by an [`InboundConverter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    pub content: String,
    pub mime_type: String,
    pub metadata: Map<String, Value>,
    /// Extraction confidence in `0.0..=1.0`, when the converter knows it.
    pub quality_score: Option<f64>,
}

/// Converts document bytes of a given MIME type into Markdown.
pub trait InboundConverter: Send + Sync {
    fn convert_bytes(
        &self,
        bytes: &[u8],
        mime_type: &str,
        ocr: &OcrOptions,
    ) -> Result<ExtractedDocument, Docs2LlmError>;
}

/// Converter for text-like formats. See the module docs for coverage.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConverter;

impl InboundConverter for BuiltinConverter {
    fn convert_bytes(
        &self,
        bytes: &[u8],
        mime_type: &str,
        ocr: &OcrOptions,
    ) -> Result<ExtractedDocument, Docs2LlmError> {
        let mime = essence(mime_type).to_ascii_lowercase();
        let (text, quality_score) = decode_text(bytes);
        let mut metadata = Map::new();

        let content = match mime.as_str() {
            "text/plain" | "text/markdown" | "text/x-markdown" => text,
            "text/html" | "application/xhtml+xml" => {
                if let Some(title) = html_title(&text) {
                    metadata.insert("title".into(), Value::String(title));
                }
                convert_html_to_markdown(&text)
            }
            "text/csv" => delimited_to_table(&text, b',', &mut metadata)?,
            "text/tab-separated-values" => delimited_to_table(&text, b'\t', &mut metadata)?,
            "application/json" | "text/json" => fenced("json", &pretty_json(&text)),
            "application/xml" | "text/xml" => fenced("xml", text.trim()),
            "message/rfc822" => email_to_markdown(bytes, &mut metadata)?,
            other => return Err(unsupported(other, ocr)),
        };

        Ok(ExtractedDocument {
            content,
            mime_type: mime,
            metadata,
            quality_score,
        })
    }
}

fn unsupported(mime: &str, ocr: &OcrOptions) -> Docs2LlmError {
    let hint = if is_image(mime) {
        let mode = if ocr.is_enabled() { "requested" } else { "required" };
        format!("Text recognition is {mode} for images; use an OCR-capable InboundConverter.")
    } else {
        "The built-in converter handles text, Markdown, HTML, CSV/TSV, JSON, XML and e-mail. \
         Use a document-engine InboundConverter for office and PDF files."
            .to_string()
    };
    Docs2LlmError::UnsupportedMime {
        mime: mime.to_string(),
        hint,
    }
}

/// Decode UTF-8, replacing invalid sequences.
///
/// Returns a quality score (share of bytes that decoded cleanly) only when
/// replacement was needed.
fn decode_text(bytes: &[u8]) -> (String, Option<f64>) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), None),
        Err(_) => {
            let lossy = String::from_utf8_lossy(bytes).into_owned();
            let bad = lossy.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
            let score = 1.0 - (bad as f64 / bytes.len().max(1) as f64);
            (lossy, Some(score.clamp(0.0, 1.0)))
        }
    }
}

// ── HTML ─────────────────────────────────────────────────────────────────────

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static RE_NON_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|head)\b[^>]*>.*?</(script|style|noscript|head)\s*>")
        .unwrap()
});

fn html_title(html: &str) -> Option<String> {
    RE_TITLE
        .captures(html)
        .map(|c| c[1].split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

/// Convert an HTML page or fragment to Markdown.
///
/// Script, style and head elements are dropped before conversion.
pub fn convert_html_to_markdown(html: &str) -> String {
    let body = RE_NON_CONTENT.replace_all(html, "");
    html2md::parse_html(&body).trim().to_string()
}

// ── Delimited tables ─────────────────────────────────────────────────────────

fn delimited_to_table(
    text: &str,
    delimiter: u8,
    metadata: &mut Map<String, Value>,
) -> Result<String, Docs2LlmError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Docs2LlmError::UnsupportedMime {
            mime: if delimiter == b'\t' { "text/tab-separated-values" } else { "text/csv" }.into(),
            hint: format!("Malformed table: {e}"),
        })?;
        rows.push(record.iter().map(escape_cell).collect());
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    metadata.insert("rows".into(), Value::from(rows.len().saturating_sub(1)));
    metadata.insert("columns".into(), Value::from(columns));
    if columns == 0 {
        return Ok(String::new());
    }

    let mut md = String::new();
    for (i, row) in rows.iter().enumerate() {
        md.push('|');
        for c in 0..columns {
            let cell = row.get(c).map(String::as_str).unwrap_or("");
            let _ = write!(md, " {cell} |");
        }
        md.push('\n');
        if i == 0 {
            md.push('|');
            md.push_str(&" --- |".repeat(columns));
            md.push('\n');
        }
    }
    Ok(md)
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\r', '\n'], " ")
}

// ── Structured text ──────────────────────────────────────────────────────────

fn pretty_json(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| text.trim().to_string())
}

fn fenced(lang: &str, body: &str) -> String {
    format!("```{lang}\n{body}\n```\n")
}

// ── E-mail ───────────────────────────────────────────────────────────────────

fn email_to_markdown(
    bytes: &[u8],
    metadata: &mut Map<String, Value>,
) -> Result<String, Docs2LlmError> {
    let message = mail_parser::MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| Docs2LlmError::UnsupportedMime {
            mime: "message/rfc822".into(),
            hint: "Could not parse the e-mail message.".into(),
        })?;

    let subject = message.subject().unwrap_or("(No Subject)").to_string();
    let from = message
        .from()
        .and_then(|a| a.first())
        .map(format_address)
        .unwrap_or_default();
    let to: Vec<String> = message
        .to()
        .map(|a| a.iter().map(format_address).collect())
        .unwrap_or_default();
    let date = message.date().map(|d| d.to_rfc3339());

    let mut md = format!("# {subject}\n\n");
    if !from.is_empty() {
        let _ = writeln!(md, "**From:** {from}  ");
    }
    if !to.is_empty() {
        let _ = writeln!(md, "**To:** {}  ", to.join(", "));
    }
    if let Some(date) = &date {
        let _ = writeln!(md, "**Date:** {date}  ");
    }
    md.push('\n');

    match (message.body_text(0), message.body_html(0)) {
        (Some(text), _) if !text.trim().is_empty() => md.push_str(text.trim()),
        (_, Some(html)) => md.push_str(&convert_html_to_markdown(&html)),
        _ => md.push_str("*(No body content)*"),
    }
    md.push('\n');

    metadata.insert("subject".into(), Value::String(subject));
    metadata.insert("from".into(), Value::String(from));
    metadata.insert("to".into(), Value::from(to));
    if let Some(date) = date {
        metadata.insert("date".into(), Value::String(date));
    }
    metadata.insert(
        "attachments".into(),
        Value::from(message.attachment_count()),
    );

    Ok(md)
}

fn format_address(addr: &mail_parser::Addr) -> String {
    match (addr.name(), addr.address()) {
        (Some(name), Some(address)) => format!("{name} <{address}>"),
        (Some(name), None) => name.to_string(),
        (None, address) => address.unwrap_or("").to_string(),
    }
}
