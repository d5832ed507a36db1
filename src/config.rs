//! Configuration types for document conversion.
//!
//! Runtime behaviour of the library is controlled through
//! [`ConverterConfig`], built via its [`ConverterConfigBuilder`]. User
//! preferences persisted on disk (default format, templates, renderer
//! arguments) live in the separate `docs2llm-config` crate and are consumed
//! read-only by the planner.

use crate::error::{Docs2LlmError, ValidationError};
use crate::tokens::{default_token_limits, TokenLimit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runtime configuration shared by the orchestrator and the HTTP API.
///
/// # Example
/// ```rust
/// use docs2llm::ConverterConfig;
///
/// let config = ConverterConfig::builder()
///     .renderer_program("pandoc")
///     .download_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.download_timeout_secs, 30);
/// ```
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Executable used for outbound conversion. Default: `pandoc`.
    pub renderer_program: String,

    /// Timeout for URL downloads in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Largest accepted HTTP upload or URL download in bytes. Default: 100 MiB.
    pub max_upload_bytes: usize,

    /// Named context-window limits, in report order.
    pub token_limits: Vec<TokenLimit>,

    /// Normalise inbound Markdown (line endings, blank lines, invisible
    /// characters) before formatting. Default: true.
    pub clean_output: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            renderer_program: "pandoc".to_string(),
            download_timeout_secs: 120,
            max_upload_bytes: 100 * 1024 * 1024,
            token_limits: default_token_limits(),
            clean_output: true,
        }
    }
}

impl ConverterConfig {
    /// Create a new builder for `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConverterConfig`].
#[derive(Debug)]
pub struct ConverterConfigBuilder {
    config: ConverterConfig,
}

impl ConverterConfigBuilder {
    pub fn renderer_program(mut self, program: impl Into<String>) -> Self {
        self.config.renderer_program = program.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn token_limits(mut self, limits: Vec<TokenLimit>) -> Self {
        self.config.token_limits = limits;
        self
    }

    pub fn clean_output(mut self, v: bool) -> Self {
        self.config.clean_output = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConverterConfig, Docs2LlmError> {
        let c = &self.config;
        if c.renderer_program.trim().is_empty() {
            return Err(Docs2LlmError::InvalidConfig(
                "Renderer program must not be empty".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(Docs2LlmError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Docs2LlmError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Every output format the CLI accepts.
///
/// `Markdown`, `Json` and `Yaml` are normalized-text formats produced by
/// inbound conversion. `Docx`, `Pptx` and `Html` are native formats produced
/// from Markdown by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(rename = "md")]
    Markdown,
    Json,
    Yaml,
    Docx,
    Pptx,
    Html,
}

impl OutputFormat {
    /// All formats in the order they are listed in help text.
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Markdown,
        OutputFormat::Json,
        OutputFormat::Yaml,
        OutputFormat::Docx,
        OutputFormat::Pptx,
        OutputFormat::Html,
    ];

    /// Token used on the command line and as the output file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Docx => "docx",
            OutputFormat::Pptx => "pptx",
            OutputFormat::Html => "html",
        }
    }

    /// Human-readable label for menus.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "Markdown",
            OutputFormat::Json => "JSON",
            OutputFormat::Yaml => "YAML",
            OutputFormat::Docx => "Word",
            OutputFormat::Pptx => "PowerPoint",
            OutputFormat::Html => "HTML",
        }
    }

    /// `true` for formats produced by the external renderer.
    pub fn is_native(self) -> bool {
        matches!(
            self,
            OutputFormat::Docx | OutputFormat::Pptx | OutputFormat::Html
        )
    }

    /// `true` for normalized-text formats produced by inbound conversion.
    pub fn is_normalized(self) -> bool {
        !self.is_native()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.extension() == token)
            .ok_or_else(|| {
                let shown = if s.is_empty() { "(empty)" } else { s };
                ValidationError::new(format!(
                    "Invalid format: {shown}. Use: md, json, yaml, docx, pptx, html"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let c = ConverterConfig::builder().build().unwrap();
        assert_eq!(c.renderer_program, "pandoc");
        assert_eq!(c.download_timeout_secs, 120);
        assert!(c.clean_output);
        assert!(!c.token_limits.is_empty());
    }

    #[test]
    fn builder_rejects_empty_program() {
        let err = ConverterConfig::builder()
            .renderer_program("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, Docs2LlmError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ConverterConfig::builder()
            .download_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn format_tokens_parse_case_insensitively() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("DOCX".parse::<OutputFormat>().unwrap(), OutputFormat::Docx);
        assert_eq!(" yaml ".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
    }

    #[test]
    fn unknown_format_token_is_validation_error() {
        let err = "pdf".parse::<OutputFormat>().unwrap_err();
        assert!(err.message.contains("Invalid format: pdf"), "got: {err}");
        let err = "".parse::<OutputFormat>().unwrap_err();
        assert!(err.message.contains("(empty)"));
    }

    #[test]
    fn native_and_normalized_partition_all_formats() {
        for f in OutputFormat::ALL {
            assert_ne!(f.is_native(), f.is_normalized(), "{f}");
        }
        assert!(OutputFormat::Pptx.is_native());
        assert!(OutputFormat::Json.is_normalized());
    }

    #[test]
    fn extension_round_trips_through_display() {
        for f in OutputFormat::ALL {
            assert_eq!(f.to_string().parse::<OutputFormat>().unwrap(), f);
        }
    }
}
