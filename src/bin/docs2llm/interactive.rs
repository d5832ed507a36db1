//! Interactive wizard: pick a file, pick a format, convert.

use crate::prompt::Prompter;
use crate::{bold, dim, green, print_token_summary, red, spinner, yellow};
use anyhow::Result;
use docs2llm::menu::{file_menu, format_menu, FilePick, FormatChoice};
use docs2llm::scan::scan_for_files;
use docs2llm::{
    build_plan, execute, BuiltinConverter, ConverterConfig, InboundConverter, PlanRequest,
    RendererGateway,
};
use docs2llm_config::Config;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

pub async fn run(
    cwd: &Path,
    config: Option<&Config>,
    converter_config: &ConverterConfig,
) -> Result<ExitCode> {
    let mut prompter = Prompter::stdio();
    prompter.note(&bold("docs2llm"))?;

    let Some(source) = pick_file(&mut prompter, cwd)? else {
        return cancelled(&mut prompter);
    };
    let Some(choice) = prompter.select("Output format:", &format_menu(&source, config))? else {
        return cancelled(&mut prompter);
    };

    let mut request = request_for(&choice);
    if let Some(c) = config {
        request = request.config(c);
    }
    let plan = match build_plan(&source, &request) {
        Ok(plan) => plan,
        Err(e) => {
            prompter.note(&format!("{} {}", red("✗"), e))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if plan.output_path.exists() {
        let message = format!(
            "Output file already exists: {}\nOverwrite?",
            plan.output_path.display()
        );
        if prompter.confirm(&message, false)? != Some(true) {
            return cancelled(&mut prompter);
        }
    }

    let inbound: Arc<dyn InboundConverter> = Arc::new(BuiltinConverter);
    let gateway = RendererGateway::system(converter_config.renderer_program.clone());

    let bar = spinner("Converting…");
    let outcome = execute(&plan, &inbound, &gateway, converter_config).await;
    bar.finish_and_clear();

    match outcome {
        Ok(result) => {
            prompter.note(&format!(
                "{} {} → {}",
                green("✓"),
                result.source_path.display(),
                bold(&result.output_path.display().to_string())
            ))?;
            if let Some(ref content) = result.content {
                print_token_summary(content, converter_config);
            }
            prompter.note("Done!")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            prompter.note(&format!("{} Conversion failed.", red("✗")))?;
            prompter.note(&format!("  {e}"))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Templates are planned with their own format so their renderer args apply.
fn request_for(choice: &FormatChoice) -> PlanRequest<'_> {
    let request = PlanRequest::new().format(choice.format());
    match choice.template() {
        Some(name) => request.template(name),
        None => request,
    }
}

fn cancelled<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<ExitCode> {
    prompter.note(&dim("Cancelled."))?;
    Ok(ExitCode::SUCCESS)
}

fn pick_file<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    cwd: &Path,
) -> Result<Option<PathBuf>> {
    let scan = scan_for_files(cwd);
    if scan.is_empty() {
        prompter.note(&yellow(
            "No convertible files found in current folder or ~/Downloads.",
        ))?;
        return manual_input(prompter, cwd);
    }

    match prompter.select("Pick a file to convert:", &file_menu(&scan))? {
        Some(FilePick::Path(path)) => Ok(Some(path)),
        Some(FilePick::Browse) => manual_input(prompter, cwd),
        None => Ok(None),
    }
}

fn manual_input<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    cwd: &Path,
) -> Result<Option<PathBuf>> {
    let answer = prompter.text(
        "File path:",
        "Drag a file here or type a path",
        |input| validate_path(cwd, input),
    )?;
    Ok(answer.map(|input| resolve_input(cwd, &input)))
}

/// Strip the quoting terminals add when a file is dragged in.
fn clean_path_input(input: &str) -> String {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    unquoted.replace("\\ ", " ")
}

fn resolve_input(cwd: &Path, input: &str) -> PathBuf {
    cwd.join(clean_path_input(input))
}

fn validate_path(cwd: &Path, input: &str) -> Result<(), String> {
    if clean_path_input(input).is_empty() {
        return Err("Path is required.".into());
    }
    match std::fs::metadata(resolve_input(cwd, input)) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err("Not a file.".into()),
        Err(_) => Err("File not found.".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docs2llm::OutputFormat;

    #[test]
    fn dragged_paths_are_unquoted() {
        assert_eq!(clean_path_input("  '/tmp/a b.pdf' "), "/tmp/a b.pdf");
        assert_eq!(clean_path_input("\"/tmp/a.pdf\""), "/tmp/a.pdf");
        assert_eq!(clean_path_input("/tmp/a\\ b.pdf"), "/tmp/a b.pdf");
    }

    #[test]
    fn path_validation_messages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert_eq!(validate_path(dir.path(), "  "), Err("Path is required.".into()));
        assert_eq!(validate_path(dir.path(), "sub"), Err("Not a file.".into()));
        assert_eq!(validate_path(dir.path(), "nope.pdf"), Err("File not found.".into()));
        assert_eq!(validate_path(dir.path(), "a.pdf"), Ok(()));
    }

    #[test]
    fn template_choice_plans_with_template() {
        let choice = FormatChoice::Template {
            name: "report".into(),
            format: OutputFormat::Docx,
        };
        let request = request_for(&choice);
        assert_eq!(request.format, Some(OutputFormat::Docx));
        assert_eq!(request.template, Some("report"));
    }
}
