//! Data-driven menus for the interactive wizard.
//!
//! Menus are plain vectors of [`MenuEntry`] built from static descriptor
//! tables plus runtime data (scanned files, configured templates). Entries
//! without a value are section separators and cannot be picked. The terminal
//! front-end only renders entries and maps a pick back to its value.

use crate::config::OutputFormat;
use crate::plan::is_markdown_source;
use crate::scan::{format_hint, ScanResult};
use docs2llm_config::Config;
use std::path::{Path, PathBuf};

/// One selectable (or separator) line of a menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry<T> {
    pub label: String,
    pub hint: String,
    /// `None` for separators.
    pub value: Option<T>,
}

impl<T> MenuEntry<T> {
    pub fn item(label: impl Into<String>, hint: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            hint: hint.into(),
            value: Some(value),
        }
    }

    pub fn separator(title: &str) -> Self {
        Self {
            label: format!("── {title} ──"),
            hint: String::new(),
            value: None,
        }
    }

    pub fn is_separator(&self) -> bool {
        self.value.is_none()
    }
}

/// What the format menu returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatChoice {
    Format(OutputFormat),
    Template { name: String, format: OutputFormat },
}

impl FormatChoice {
    pub fn format(&self) -> OutputFormat {
        match self {
            FormatChoice::Format(f) => *f,
            FormatChoice::Template { format, .. } => *format,
        }
    }

    pub fn template(&self) -> Option<&str> {
        match self {
            FormatChoice::Format(_) => None,
            FormatChoice::Template { name, .. } => Some(name),
        }
    }
}

/// What the file menu returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePick {
    Path(PathBuf),
    /// Ask the user to type or paste a path.
    Browse,
}

/// Targets offered for Markdown sources, in menu order.
const MARKDOWN_TARGETS: &[OutputFormat] = &[
    OutputFormat::Docx,
    OutputFormat::Pptx,
    OutputFormat::Html,
    OutputFormat::Json,
    OutputFormat::Yaml,
];

/// Targets offered for every other source.
const DOCUMENT_TARGETS: &[OutputFormat] =
    &[OutputFormat::Markdown, OutputFormat::Json, OutputFormat::Yaml];

/// Format menu for `source`: built-in targets, then configured templates.
///
/// Templates whose format token does not parse are left out.
pub fn format_menu(source: &Path, config: Option<&Config>) -> Vec<MenuEntry<FormatChoice>> {
    let targets = if is_markdown_source(source) {
        MARKDOWN_TARGETS
    } else {
        DOCUMENT_TARGETS
    };

    let mut entries: Vec<_> = targets
        .iter()
        .map(|&f| MenuEntry::item(f.label(), format!(".{f}"), FormatChoice::Format(f)))
        .collect();

    let templates: Vec<_> = config
        .map(|c| c.templates.iter())
        .into_iter()
        .flatten()
        .filter_map(|(name, tpl)| {
            let format = tpl.format.parse::<OutputFormat>().ok()?;
            let hint = tpl.description.clone().unwrap_or_else(|| format!(".{format}"));
            Some(MenuEntry::item(
                name.clone(),
                hint,
                FormatChoice::Template {
                    name: name.clone(),
                    format,
                },
            ))
        })
        .collect();

    if !templates.is_empty() {
        entries.push(MenuEntry::separator("Templates"));
        entries.extend(templates);
    }
    entries
}

/// File menu: current directory, then Downloads, then a browse entry.
pub fn file_menu(scan: &ScanResult) -> Vec<MenuEntry<FilePick>> {
    let mut entries: Vec<_> = scan
        .cwd
        .iter()
        .map(|f| MenuEntry::item(f.name.clone(), format_hint(f), FilePick::Path(f.path.clone())))
        .collect();

    if !scan.downloads.is_empty() {
        if !scan.cwd.is_empty() {
            entries.push(MenuEntry::separator("Downloads"));
        }
        entries.extend(scan.downloads.iter().map(|f| {
            MenuEntry::item(f.name.clone(), format_hint(f), FilePick::Path(f.path.clone()))
        }));
    }

    entries.push(MenuEntry::item("Browse or paste a path…", "", FilePick::Browse));
    entries
}
