//! Error types for the docs2llm library.
//!
//! Two error types reflect two different audiences:
//!
//! * [`ValidationError`] — the requested conversion does not make sense
//!   (unknown format token, native output from a non-Markdown source, …).
//!   It is recoverable: the CLI reports it and moves on to the next file of a
//!   batch. It only ever carries a human-readable message.
//!
//! * [`Docs2LlmError`] — everything that can go wrong while planning or
//!   executing a conversion, including validation failures, blocked renderer
//!   flags, a missing renderer, renderer failures, network errors and I/O.
//!
//! No layer of the library retries. The first failure is returned once and
//! the entry point (CLI, wizard, HTTP handler) decides how to present it.

use std::path::PathBuf;
use thiserror::Error;

/// A conversion request that cannot be planned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// All errors returned by the docs2llm library.
#[derive(Debug, Error)]
pub enum Docs2LlmError {
    // ── Planning errors ───────────────────────────────────────────────────
    /// The conversion request is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ── Renderer errors ───────────────────────────────────────────────────
    /// A caller-supplied renderer argument would allow arbitrary code execution.
    #[error("Blocked renderer flag: \"{flag}\" can execute arbitrary code and is not allowed.")]
    BlockedRendererFlag { flag: String },

    /// The external renderer is not installed or not on `PATH`.
    #[error("{program} is required for outbound conversion (md → docx/pptx/html).\n{hint}")]
    RendererUnavailable { program: String, hint: String },

    /// The renderer ran but exited unsuccessfully.
    #[error("{program} failed (exit {}): {stderr}", exit_label(.code))]
    RenderFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// URL fetch returned a non-success status or the request failed.
    #[error("Fetch failed for '{url}': {reason}")]
    FetchFailed {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// URL fetch exceeded the configured timeout.
    #[error("Fetch timed out after {secs}s for '{url}'")]
    FetchTimeout { url: String, secs: u64 },

    /// The inbound converter has no support for this MIME type.
    #[error("Unsupported document type '{mime}'. {hint}")]
    UnsupportedMime { mime: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Formatting the normalized output as JSON/YAML failed.
    #[error("Failed to format output as {format}: {detail}")]
    OutputFormatFailed { format: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Persisted configuration could not be read or written.
    #[error(transparent)]
    Config(#[from] docs2llm_config::ConfigError),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Docs2LlmError {
    /// `true` for request problems a batch should count as skipped, not failed.
    pub fn is_validation(&self) -> bool {
        matches!(self, Docs2LlmError::Validation(_))
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}
