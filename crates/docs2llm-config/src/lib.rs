//! # docs2llm-config
//!
//! Persisted configuration for `docs2llm`: default output format and
//! directory, extra renderer arguments per output format, and named
//! templates that bundle a format with renderer arguments.
//!
//! ## File discovery
//!
//! [`load_config`] looks for configuration in this order and stops at the
//! first file that exists:
//!
//! 1. `./.docs2llm.yaml` in the working directory ([`LOCAL_CONFIG_NAME`]).
//! 2. The global file returned by [`global_config_path`]
//!    (`~/.config/docs2llm/config.yaml` on Linux).
//!
//! ## Example file
//!
//! ```yaml
//! defaults:
//!   format: docx
//!   outputDir: ./out
//! rendererArgsByFormat:
//!   docx: ["--toc"]
//! templates:
//!   report:
//!     format: docx
//!     rendererArgs: ["--reference-doc=./template.docx"]
//!     description: Company report with TOC
//! ```
//!
//! Format tokens are kept as plain strings here; the conversion planner is
//! responsible for validating them.
//!
//! ## Environment variable overrides
//!
//! - `DOCS2LLM_CONFIG_DIR` — override the directory holding the global file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// File name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".docs2llm.yaml";

/// File name of the global configuration file inside [`global_config_dir`].
pub const GLOBAL_CONFIG_NAME: &str = "config.yaml";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while reading or writing configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML or does not match the expected shape.
    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Serialising a config to YAML failed.
    #[error("Failed to serialise config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// The file (or its parent directory) could not be written.
    #[error("Failed to write config '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Data model ───────────────────────────────────────────────────────────────

/// Root of a `docs2llm` configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Defaults::is_empty")]
    pub defaults: Defaults,

    /// Extra renderer arguments keyed by output format token (`docx`, …).
    #[serde(
        default,
        alias = "pandoc",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub renderer_args_by_format: BTreeMap<String, Vec<String>>,

    /// Named templates, listed alphabetically in menus.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, Template>,
}

/// Defaults applied when the caller does not say otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    /// Output format used for Markdown sources when none is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Directory that receives outputs when no `-o` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Defaults {
    fn is_empty(&self) -> bool {
        self.format.is_none() && self.output_dir.is_none()
    }
}

/// A named bundle of output format and renderer arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub format: String,

    #[serde(default, alias = "pandocArgs", skip_serializing_if = "Vec::is_empty")]
    pub renderer_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Config {
    /// Look up a template by name.
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Default output format token, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.defaults.format.as_deref()
    }

    /// Renderer arguments for `format`: the per-format list first, then the
    /// arguments of `template` when one is named and exists.
    pub fn renderer_args(&self, format: &str, template: Option<&str>) -> Vec<String> {
        let mut args = self
            .renderer_args_by_format
            .get(format)
            .cloned()
            .unwrap_or_default();
        if let Some(tpl) = template.and_then(|name| self.template(name)) {
            args.extend(tpl.renderer_args.iter().cloned());
        }
        args
    }
}

// ── Paths ────────────────────────────────────────────────────────────────────

/// Directory holding the global configuration file.
///
/// Default locations:
/// - **Linux**: `~/.config/docs2llm/`
/// - **macOS**: `~/Library/Application Support/docs2llm/`
/// - **Windows**: `%APPDATA%\docs2llm\`
///
/// Override by setting `DOCS2LLM_CONFIG_DIR`.
pub fn global_config_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("DOCS2LLM_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }

    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("docs2llm")
}

/// Full path of the global configuration file.
pub fn global_config_path() -> PathBuf {
    global_config_dir().join(GLOBAL_CONFIG_NAME)
}

/// Full path of the local configuration file for `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_NAME)
}

/// First existing configuration file: local to `cwd`, then global.
pub fn find_config(cwd: &Path) -> Option<PathBuf> {
    [local_config_path(cwd), global_config_path()]
        .into_iter()
        .find(|p| p.is_file())
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Load the configuration that applies to `cwd`, or `None` when no file exists.
pub fn load_config(cwd: &Path) -> Result<Option<Config>, ConfigError> {
    match find_config(cwd) {
        Some(path) => read_config(&path).map(Some),
        None => Ok(None),
    }
}

/// Read and parse a configuration file.
pub fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text, path)
}

/// Parse configuration text. `path` is only used in error messages.
///
/// An empty document yields [`Config::default`].
pub fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    if text.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Render a configuration as YAML.
pub fn serialize_config(config: &Config) -> Result<String, ConfigError> {
    serde_yaml::to_string(config).map_err(ConfigError::Serialize)
}

/// Write `config` to `path`, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let yaml = serialize_config(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, yaml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
defaults:
  format: docx
  outputDir: ./out
rendererArgsByFormat:
  docx: ["--toc"]
templates:
  report:
    format: docx
    rendererArgs: ["--reference-doc=./template.docx"]
    description: Company report with TOC
  slides:
    format: pptx
"#;

    #[test]
    fn parses_full_document() {
        let config = parse_config(SAMPLE, Path::new("sample.yaml")).unwrap();
        assert_eq!(config.default_format(), Some("docx"));
        assert_eq!(config.defaults.output_dir, Some(PathBuf::from("./out")));
        assert_eq!(config.templates.len(), 2);
        let report = config.template("report").unwrap();
        assert_eq!(report.format, "docx");
        assert_eq!(report.description.as_deref(), Some("Company report with TOC"));
        assert!(config.template("slides").unwrap().renderer_args.is_empty());
    }

    #[test]
    fn accepts_pandoc_key_aliases() {
        let text = "pandoc:\n  html: [\"--standalone\"]\ntemplates:\n  web:\n    format: html\n    pandocArgs: [\"--toc\"]\n";
        let config = parse_config(text, Path::new("legacy.yaml")).unwrap();
        assert_eq!(config.renderer_args("html", Some("web")), vec!["--standalone", "--toc"]);
    }

    #[test]
    fn renderer_args_combines_format_and_template() {
        let config = parse_config(SAMPLE, Path::new("sample.yaml")).unwrap();
        assert_eq!(config.renderer_args("docx", None), vec!["--toc"]);
        assert_eq!(
            config.renderer_args("docx", Some("report")),
            vec!["--toc", "--reference-doc=./template.docx"]
        );
        assert!(config.renderer_args("pptx", Some("missing")).is_empty());
    }

    #[test]
    fn empty_document_is_default() {
        let config = parse_config("  \n", Path::new("empty.yaml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let err = parse_config("defaults: [1, 2", Path::new("broken.yaml")).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"), "got: {err}");
    }

    #[test]
    fn save_then_load_prefers_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = parse_config(SAMPLE, Path::new("sample.yaml")).unwrap();
        save_config(&local_config_path(dir.path()), &config).unwrap();

        let loaded = load_config(dir.path()).unwrap().expect("local config found");
        assert_eq!(loaded, config);
    }

    #[test]
    fn serialised_config_omits_empty_sections() {
        let config = Config {
            defaults: Defaults {
                format: Some("html".into()),
                output_dir: None,
            },
            ..Config::default()
        };
        let yaml = serialize_config(&config).unwrap();
        assert!(yaml.contains("format: html"));
        assert!(!yaml.contains("templates"));
        assert!(!yaml.contains("outputDir"));
    }

    #[test]
    fn global_dir_override_via_env() {
        std::env::set_var("DOCS2LLM_CONFIG_DIR", "/tmp/test_docs2llm_override");
        let p = global_config_path();
        std::env::remove_var("DOCS2LLM_CONFIG_DIR");
        assert_eq!(p, PathBuf::from("/tmp/test_docs2llm_override/config.yaml"));
    }
}
