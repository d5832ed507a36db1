//! Conversion planning: decide direction, format and output path before
//! anything touches the file system.
//!
//! ## Direction
//!
//! A Markdown source asked for a native format (`docx`, `pptx`, `html`) is
//! **outbound** and goes to the external renderer. Everything else is
//! **inbound** and must target a normalized-text format (`md`, `json`,
//! `yaml`).
//!
//! ## Format precedence (highest wins)
//!
//! 1. explicit format flag
//! 2. named template's format
//! 3. configured default format (Markdown sources only)
//! 4. Markdown
//!
//! ## Output path
//!
//! `<dir>/<stem>.<format>` where `<dir>` is the explicit output directory,
//! else the configured default output directory, else the source's own
//! directory. Repeated conversions of the same source to the same format map
//! to the same path; confirming an overwrite is the caller's job.
//!
//! The planner assumes the source exists and is a regular file. It never
//! logs; it returns the first problem it finds as a [`ValidationError`].

use crate::config::OutputFormat;
use crate::error::ValidationError;
use docs2llm_config::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Which way a conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionDirection {
    /// Foreign document → normalized text.
    Inbound,
    /// Markdown → native document via the external renderer.
    Outbound,
}

/// The resolved, validated description of one conversion.
///
/// `output_path` always carries the extension of `format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionPlan {
    pub direction: ConversionDirection,
    pub format: OutputFormat,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    /// Extra renderer arguments; only meaningful for outbound plans.
    pub renderer_args: Option<Vec<String>>,
}

impl ConversionPlan {
    /// Attach renderer arguments. An empty list clears them.
    pub fn with_renderer_args(mut self, args: Vec<String>) -> Self {
        self.renderer_args = if args.is_empty() { None } else { Some(args) };
        self
    }

    pub fn is_outbound(&self) -> bool {
        self.direction == ConversionDirection::Outbound
    }

    /// Renderer arguments as a slice (empty when none are attached).
    pub fn renderer_args(&self) -> &[String] {
        self.renderer_args.as_deref().unwrap_or(&[])
    }
}

/// Caller-supplied inputs for [`build_plan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanRequest<'a> {
    /// Format from an explicit flag or menu pick.
    pub format: Option<OutputFormat>,
    /// Template picked in the wizard or named by an API caller.
    pub template: Option<&'a str>,
    /// Explicit output directory override.
    pub output_dir: Option<&'a Path>,
    /// Persisted configuration, when one was loaded.
    pub config: Option<&'a Config>,
}

impl<'a> PlanRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn template(mut self, name: &'a str) -> Self {
        self.template = Some(name);
        self
    }

    pub fn output_dir(mut self, dir: &'a Path) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn config(mut self, config: &'a Config) -> Self {
        self.config = Some(config);
        self
    }
}

/// `true` when the path has a `.md` extension (any case).
pub fn is_markdown_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// Build a [`ConversionPlan`] for `source`.
///
/// Outbound plans get renderer arguments from the configuration
/// (`rendererArgsByFormat[format]` followed by the template's arguments).
/// Template arguments are only attached when the template's own format is
/// the resolved format. The output goes next to the source unless
/// `output_dir` is set on the request.
pub fn build_plan(source: &Path, request: &PlanRequest<'_>) -> Result<ConversionPlan, ValidationError> {
    let is_markdown = is_markdown_source(source);
    let format = resolve_format(is_markdown, request)?;
    let direction = resolve_direction(source, is_markdown, format)?;
    let output_path = resolve_output_path(source, format, request);

    let plan = ConversionPlan {
        direction,
        format,
        source_path: source.to_path_buf(),
        output_path,
        renderer_args: None,
    };

    Ok(match (direction, request.config) {
        (ConversionDirection::Outbound, Some(config)) => {
            let template = request
                .template
                .filter(|name| template_format(config, name) == Some(format));
            let args = config.renderer_args(format.extension(), template);
            plan.with_renderer_args(args)
        }
        _ => plan,
    })
}

fn template_format(config: &Config, name: &str) -> Option<OutputFormat> {
    config.template(name).and_then(|t| t.format.parse().ok())
}

fn resolve_format(is_markdown: bool, request: &PlanRequest<'_>) -> Result<OutputFormat, ValidationError> {
    if let Some(format) = request.format {
        return Ok(format);
    }

    if let Some(name) = request.template {
        let template = request
            .config
            .and_then(|c| c.template(name))
            .ok_or_else(|| ValidationError::new(format!("Unknown template: {name}")))?;
        return template.format.parse().map_err(|e: ValidationError| {
            ValidationError::new(format!("Template \"{name}\": {}", e.message))
        });
    }

    if is_markdown {
        if let Some(token) = request.config.and_then(Config::default_format) {
            return token.parse().map_err(|e: ValidationError| {
                ValidationError::new(format!("Config defaults.format: {}", e.message))
            });
        }
    }

    Ok(OutputFormat::Markdown)
}

fn resolve_direction(
    source: &Path,
    is_markdown: bool,
    format: OutputFormat,
) -> Result<ConversionDirection, ValidationError> {
    let name = display_name(source);

    if format.is_native() {
        if is_markdown {
            return Ok(ConversionDirection::Outbound);
        }
        return Err(ValidationError::new(format!(
            "Cannot convert {name} to .{format}: native documents can only be produced from Markdown (.md) sources."
        )));
    }

    if is_markdown && format == OutputFormat::Markdown {
        return Err(ValidationError::new(format!(
            "{name} is already Markdown. Pick an output format: docx, pptx, html, json or yaml."
        )));
    }

    Ok(ConversionDirection::Inbound)
}

fn resolve_output_path(source: &Path, format: OutputFormat, request: &PlanRequest<'_>) -> PathBuf {
    let dir = request
        .output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source.parent().map(Path::to_path_buf).unwrap_or_default());

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    dir.join(format!("{stem}.{}", format.extension()))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
