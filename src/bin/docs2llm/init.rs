//! `docs2llm init`: build a config file from a few questions.

use crate::prompt::Prompter;
use crate::{bold, dim, green};
use anyhow::{Context, Result};
use docs2llm::menu::MenuEntry;
use docs2llm::pipeline::render::sanitize;
use docs2llm::OutputFormat;
use docs2llm_config::{
    global_config_path, local_config_path, save_config, serialize_config, Config, Template,
};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

pub fn run(cwd: &Path, global: bool) -> Result<ExitCode> {
    let path = if global {
        global_config_path()
    } else {
        local_config_path(cwd)
    };
    let mut prompter = Prompter::stdio();
    prompter.note(&bold("docs2llm init"))?;

    if path.exists() {
        let message = format!("Config already exists at {}. Overwrite?", path.display());
        if prompter.confirm(&message, false)? != Some(true) {
            prompter.note(&dim("Cancelled."))?;
            return Ok(ExitCode::SUCCESS);
        }
    }

    let Some(config) = ask_config(&mut prompter)? else {
        prompter.note(&dim("Cancelled."))?;
        return Ok(ExitCode::SUCCESS);
    };

    let yaml = serialize_config(&config).context("Failed to serialize config")?;
    prompter.note(&format!("Config to write to {}:\n{}", path.display(), dim(&yaml)))?;
    save_config(&path, &config)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    prompter.note(&format!("{} Config saved to {}", green("✓"), path.display()))?;
    Ok(ExitCode::SUCCESS)
}

fn outbound_menu() -> Vec<MenuEntry<OutputFormat>> {
    [OutputFormat::Docx, OutputFormat::Pptx, OutputFormat::Html]
        .into_iter()
        .map(|f| MenuEntry::item(f.label(), format!(".{f}"), f))
        .collect()
}

/// Ask every question; `None` when the user cancels.
fn ask_config<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<Option<Config>> {
    let Some(format) =
        prompter.select("Default output format for Markdown files:", &outbound_menu())?
    else {
        return Ok(None);
    };

    let dir_menu = vec![
        MenuEntry::item("Same as input file", "", false),
        MenuEntry::item("Custom path", "", true),
    ];
    let Some(custom_dir) = prompter.select("Output directory:", &dir_menu)? else {
        return Ok(None);
    };
    let output_dir = if custom_dir {
        let Some(dir) = prompter.text("Output directory path:", "./out", |s| {
            if s.is_empty() {
                Err("Path is required.".into())
            } else {
                Ok(())
            }
        })?
        else {
            return Ok(None);
        };
        Some(PathBuf::from(dir))
    } else {
        None
    };

    let Some(add_toc) = prompter.confirm("Add table of contents by default?", false)? else {
        return Ok(None);
    };

    let mut config = Config::default();
    config.defaults.format = Some(format.to_string());
    config.defaults.output_dir = output_dir;
    if add_toc {
        config
            .renderer_args_by_format
            .insert(format.to_string(), vec!["--toc".to_string()]);
    }

    let Some(want_template) = prompter.confirm("Create a named template?", false)? else {
        return Ok(None);
    };
    if want_template {
        let Some((name, template)) = ask_template(prompter)? else {
            return Ok(None);
        };
        config.templates.insert(name, template);
    }

    Ok(Some(config))
}

fn validate_template_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        Err("Name is required.".into())
    } else if name.chars().any(char::is_whitespace) {
        Err("No spaces allowed.".into())
    } else {
        Ok(())
    }
}

fn split_args(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

fn ask_template<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
) -> Result<Option<(String, Template)>> {
    let Some(name) = prompter.text("Template name:", "report", validate_template_name)? else {
        return Ok(None);
    };
    let Some(format) = prompter.select("Template output format:", &outbound_menu())? else {
        return Ok(None);
    };
    let Some(description) =
        prompter.text("Description (optional):", "Company report with TOC", |_| Ok(()))?
    else {
        return Ok(None);
    };
    // Blocked flags would fail every conversion using this template.
    let Some(args) = prompter.text(
        "Renderer args (space-separated, optional):",
        "--toc --reference-doc=./template.docx",
        |s| sanitize(&split_args(s)).map_err(|e| e.to_string()),
    )?
    else {
        return Ok(None);
    };

    let template = Template {
        format: format.to_string(),
        renderer_args: split_args(&args),
        description: Some(description).filter(|d| !d.is_empty()),
    };
    Ok(Some((name, template)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answers(input: &str) -> Option<Config> {
        let mut p = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        ask_config(&mut p).unwrap()
    }

    #[test]
    fn minimal_answers() {
        let config = answers("1\n1\nn\nn\n").unwrap();
        assert_eq!(config.defaults.format.as_deref(), Some("docx"));
        assert!(config.defaults.output_dir.is_none());
        assert!(config.renderer_args_by_format.is_empty());
        assert!(config.templates.is_empty());
    }

    #[test]
    fn toc_and_custom_dir() {
        let config = answers("2\n2\n./out\ny\nn\n").unwrap();
        assert_eq!(config.defaults.format.as_deref(), Some("pptx"));
        assert_eq!(config.defaults.output_dir, Some(PathBuf::from("./out")));
        assert_eq!(config.renderer_args_by_format["pptx"], ["--toc"]);
    }

    #[test]
    fn template_with_blocked_flag_is_reasked() {
        let config = answers("3\n1\nn\ny\nmy report\nreport\n1\n\n--lua-filter=x.lua\n--toc  -N\n")
            .unwrap();
        let tpl = &config.templates["report"];
        assert_eq!(tpl.format, "docx");
        assert_eq!(tpl.renderer_args, ["--toc", "-N"]);
        assert!(tpl.description.is_none());
    }

    #[test]
    fn eof_cancels() {
        assert!(answers("1\n").is_none());
    }

    #[test]
    fn template_names() {
        assert!(validate_template_name("").is_err());
        assert_eq!(validate_template_name("a b"), Err("No spaces allowed.".into()));
        assert!(validate_template_name("report").is_ok());
    }
}
