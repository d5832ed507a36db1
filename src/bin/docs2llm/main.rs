//! CLI binary for docs2llm.
//!
//! A thin shim over the library crate: maps flags to a `PlanRequest`, runs
//! single-file or folder conversions, and hosts the `serve` and `init`
//! commands plus the interactive wizard.

mod init;
mod interactive;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docs2llm::server::{self, AppState, DEFAULT_PORT};
use docs2llm::{
    build_plan, convert_folder, execute, BatchProgressCallback, BuiltinConverter,
    ConversionResult, ConverterConfig, EstimatingTokenCounter, InboundConverter, OutputFormat,
    PlanRequest, RendererGateway,
};
use docs2llm::tokens::{fit_report, format_fit_report, token_stats};
use docs2llm_config::load_config;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

pub(crate) fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
pub(crate) fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
pub(crate) fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
pub(crate) fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
pub(crate) fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
pub(crate) fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Spinner shown while a single conversion runs.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// `N words · ~T tokens` plus the fit line, for inbound results.
pub(crate) fn print_token_summary(content: &str, config: &ConverterConfig) {
    let stats = token_stats(content, &EstimatingTokenCounter);
    let fits = fit_report(stats.tokens, &config.token_limits);
    eprintln!(
        "  {}",
        dim(&format!("{} words · ~{} tokens", stats.words, stats.tokens))
    );
    eprintln!("  {}", dim(&format_fit_report(&fits)));
}

// ── Batch progress ───────────────────────────────────────────────────────────

/// Prints one `✓`/`✗`/`⊘` line per file above a progress bar.
struct CliBatchProgress {
    bar: ProgressBar,
    quiet: bool,
}

impl CliBatchProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(0)
        };
        Self { bar, quiet }
    }

    fn line(&self, text: String) {
        if self.bar.is_hidden() {
            eprintln!("{text}");
        } else {
            self.bar.println(text);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchProgressCallback for CliBatchProgress {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        self.bar.set_prefix("Converting");
    }

    fn on_file_start(&self, _index: usize, _total: usize, source: &Path) {
        self.bar.set_message(file_name(source));
    }

    fn on_file_complete(&self, _index: usize, _total: usize, source: &Path, output: &Path) {
        if !self.quiet {
            self.line(format!(
                "{} {} → {}",
                green("✓"),
                file_name(source),
                output.display()
            ));
        }
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, source: &Path, reason: &str) {
        if !self.quiet {
            self.line(format!("{} {}: {}", yellow("⊘"), file_name(source), reason));
        }
        self.bar.inc(1);
    }

    fn on_file_error(&self, _index: usize, _total: usize, source: &Path, error: &str) {
        self.line(format!("{} {}: {}", red("✗"), file_name(source), error));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _converted: usize, _failed: usize, _skipped: usize) {
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  Inbound (documents → LLM-friendly text):
    docs2llm report.pdf                 report.md next to the source
    docs2llm report.pdf -f json         structured JSON with metadata
    docs2llm ./inbox -o ./out           convert every file in a folder

  Outbound (Markdown → documents):
    docs2llm notes.md -f docx           Word document via pandoc
    docs2llm slides.md -f pptx          PowerPoint deck
    docs2llm notes.md -f html -o site/  standalone HTML page

  Other:
    docs2llm                            interactive wizard
    docs2llm init                       create .docs2llm.yaml here
    docs2llm init --global              create the global config
    docs2llm serve --port 8080          HTTP API + web page

FORMATS:
  md, json, yaml    inbound (from PDF, DOCX, HTML, CSV, EML, images, …)
  docx, pptx, html  outbound (from Markdown; requires pandoc)

CONFIG:
  .docs2llm.yaml in the current folder overrides the global config file.
  Keys: defaults.format, defaults.outputDir, rendererArgsByFormat, templates.

ENVIRONMENT VARIABLES:
  DOCS2LLM_FORMAT   Default for -f/--format
  DOCS2LLM_OUTPUT   Default for -o/--output
  DOCS2LLM_PORT     Default for serve --port
  RUST_LOG          Log filter (overrides -v/-q)
"#;

/// Convert documents to LLM-friendly text, and Markdown back to documents.
#[derive(Parser, Debug)]
#[command(
    name = "docs2llm",
    version,
    about = "Convert documents to LLM-friendly text, and Markdown back to documents",
    args_conflicts_with_subcommands = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// File or folder to convert. Omit to start the interactive wizard.
    input: Option<PathBuf>,

    /// Output format: md, json, yaml, docx, pptx, html.
    #[arg(short, long, env = "DOCS2LLM_FORMAT")]
    format: Option<String>,

    /// Output directory (default: config outputDir, else next to the source).
    #[arg(short, long, env = "DOCS2LLM_OUTPUT")]
    output: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "DOCS2LLM_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Create a config file interactively.
    Init {
        /// Write the global config instead of ./.docs2llm.yaml.
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Conversions print their own result lines, so library INFO logs stay
    // hidden unless asked for. The server logs requests at INFO.
    let serving = matches!(cli.command, Some(Command::Serve { .. }));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if serving {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("✗"), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Cannot determine the current directory")?;

    match cli.command {
        Some(Command::Serve { port }) => return serve(port).await,
        Some(Command::Init { global }) => return init::run(&cwd, global),
        None => {}
    }

    let config = load_config(&cwd).context("Failed to load config")?;
    let converter_config = ConverterConfig::default();

    let Some(input) = cli.input else {
        return interactive::run(&cwd, config.as_ref(), &converter_config).await;
    };

    let format = match cli.format.as_deref().map(str::parse::<OutputFormat>).transpose() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("{} {}", red("✗"), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let Ok(meta) = tokio::fs::metadata(&input).await else {
        eprintln!("Not found: {}", input.display());
        return Ok(ExitCode::FAILURE);
    };

    if let Some(ref dir) = cli.output {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut request = PlanRequest::new();
    if let Some(f) = format {
        request = request.format(f);
    }
    if let Some(ref dir) = cli.output {
        request = request.output_dir(dir);
    }
    if let Some(ref c) = config {
        request = request.config(c);
    }

    let inbound: Arc<dyn InboundConverter> = Arc::new(BuiltinConverter);
    let gateway = RendererGateway::system(converter_config.renderer_program.clone());

    if meta.is_dir() {
        let progress = CliBatchProgress::new(cli.quiet);
        let report = convert_folder(
            &input,
            &request,
            &inbound,
            &gateway,
            &converter_config,
            &progress,
        )
        .await
        .with_context(|| format!("Failed to read folder {}", input.display()))?;

        if report.total() == 0 {
            println!("No files found.");
        } else if !cli.quiet {
            println!("\nDone: {}.", report.summary());
        }
        // Per-file failures are reported above; the batch itself succeeded.
        return Ok(ExitCode::SUCCESS);
    }

    let plan = match build_plan(&input, &request) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("{} {}", red("✗"), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let bar = (!cli.quiet).then(|| spinner("Converting…"));
    let outcome = execute(&plan, &inbound, &gateway, &converter_config).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match outcome {
        Ok(result) => {
            if !cli.quiet {
                print_result(&result, &converter_config);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} {}", red("✗"), e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_result(result: &ConversionResult, config: &ConverterConfig) {
    println!(
        "{} {} → {}",
        green("✓"),
        file_name(&result.source_path),
        bold(&result.output_path.display().to_string())
    );
    if let Some(ref content) = result.content {
        print_token_summary(content, config);
    }
}

async fn serve(port: u16) -> Result<ExitCode> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = AppState::new(ConverterConfig::default());
    server::serve(addr, state)
        .await
        .with_context(|| format!("Failed to start server on port {port}"))?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positional_input_and_flags() {
        let cli = Cli::try_parse_from(["docs2llm", "notes.md", "-f", "docx", "-o", "out"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("notes.md")));
        assert_eq!(cli.format.as_deref(), Some("docx"));
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["docs2llm", "serve", "--port", "8080"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve { port: 8080 })));

        let cli = Cli::try_parse_from(["docs2llm", "init", "--global"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Init { global: true })));
    }

    #[test]
    fn no_arguments_means_wizard() {
        let cli = Cli::try_parse_from(["docs2llm"]).unwrap();
        assert!(cli.input.is_none() && cli.command.is_none());
    }
}
