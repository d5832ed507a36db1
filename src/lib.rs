//! # docs2llm
//!
//! Convert documents into LLM-friendly text, and Markdown back into
//! documents people open.
//!
//! ## Two directions
//!
//! * **Inbound**: any supported document (PDF, Office, HTML, CSV, e-mail,
//!   images, …) becomes normalized text: Markdown, JSON or YAML.
//! * **Outbound**: a Markdown file becomes `.docx`, `.pptx` or `.html` via an
//!   external renderer (pandoc by default).
//!
//! Every request goes through the same planner, which validates the
//! direction and resolves format, output path and renderer arguments from
//! explicit flags, named templates and the persisted config.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source
//!  │
//!  ├─ 1. Plan     format + template + config → ConversionPlan (or ValidationError)
//!  ├─ 2a. Inbound read or fetch → detect MIME → extract → clean → md/json/yaml
//!  ├─ 2b. Outbound sanitize args → probe renderer → render to .docx/.pptx/.html
//!  └─ 3. Output   atomic write, token stats and context-window fit
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docs2llm::{convert_file, BuiltinConverter, ConverterConfig, InboundConverter,
//!                OutputFormat, PlanRequest, RendererGateway};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConverterConfig::default();
//!     let inbound: Arc<dyn InboundConverter> = Arc::new(BuiltinConverter);
//!     let gateway = RendererGateway::default();
//!
//!     let request = PlanRequest::new().format(OutputFormat::Json);
//!     let result = convert_file(Path::new("page.html"), &request, &inbound, &gateway, &config).await?;
//!     println!("wrote {}", result.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | HTTP API (axum + tower-http) |
//! | `cli`    | on      | The `docs2llm` binary (clap + anyhow + tracing-subscriber + indicatif); implies `server` |
//!
//! Library-only users can opt out:
//! ```toml
//! docs2llm = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod formats;
pub mod menu;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod plan;
pub mod progress;
pub mod scan;
#[cfg(feature = "server")]
pub mod server;
pub mod tokens;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder, OutputFormat};
pub use convert::{
    convert_clipboard, convert_file, convert_folder, convert_upload, convert_url, execute,
    list_batch_files, BatchReport, FileOutcome, Upload,
};
pub use error::{Docs2LlmError, ValidationError};
pub use formats::{supported_formats, FormatDescriptor};
pub use options::{resolve_ocr, OcrOptions, OcrRequest};
pub use output::{ConversionResult, TextOutput};
pub use pipeline::extract::{BuiltinConverter, ExtractedDocument, InboundConverter};
pub use pipeline::render::{CommandOutput, CommandRunner, RendererGateway, TokioCommandRunner};
pub use plan::{build_plan, ConversionDirection, ConversionPlan, PlanRequest};
pub use progress::{BatchProgressCallback, NoopBatchProgress};
pub use tokens::{
    default_token_limits, EstimatingTokenCounter, TokenCounter, TokenFitResult, TokenLimit,
    TokenStats,
};
