//! Outbound rendering: Markdown → native document via an external tool.
//!
//! The gateway owns three concerns:
//!
//! * **Availability** — a `--version` probe run at most once per program per
//!   process. The answer is cached in a shared `OnceLock` and never
//!   re-checked, so installing the tool mid-process has no effect until
//!   restart. Two first-time callers may both probe; both write the same
//!   boolean and the second write is dropped.
//! * **Argument sanitisation** — extra arguments come from config files and
//!   API callers. Flags that make the renderer load and run external code
//!   are rejected before any process is spawned.
//! * **Invocation** — `program <source> [args…] -o <output>`, trusting the
//!   exit status. Stderr is captured and surfaced trimmed on failure.
//!
//! Process spawning sits behind [`CommandRunner`] so tests can substitute a
//! fake. This module does not log; errors carry everything the caller needs.

use crate::error::Docs2LlmError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, OnceLock};

/// Default external renderer.
pub const DEFAULT_RENDERER: &str = "pandoc";

/// Install guidance attached to [`Docs2LlmError::RendererUnavailable`].
pub const INSTALL_HINT: &str =
    "Install: https://pandoc.org/installing.html (macOS: brew install pandoc, Debian/Ubuntu: apt install pandoc)";

/// Long flags that load filters, scripts or option files.
const BLOCKED_LONG_FLAGS: &[&str] = &["--filter", "--lua-filter", "--defaults"];

/// Short aliases of [`BLOCKED_LONG_FLAGS`], with their canonical spelling.
const BLOCKED_SHORT_FLAGS: &[(char, &str)] = &[('F', "-F"), ('L', "-L"), ('d', "-d")];

/// Short options that consume the rest of their token as a value.
const VALUE_SHORT_FLAGS: &[char] = &['f', 'r', 't', 'w', 'o', 'M', 'V', 'c', 'H', 'B', 'A', 'D', 'T'];

// ── Command runner ───────────────────────────────────────────────────────────

/// Exit status and captured stderr of one subprocess run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Narrow seam over process spawning.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion. Stdout is discarded.
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(CommandOutput {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ── Availability cache ───────────────────────────────────────────────────────

static AVAILABILITY: Lazy<Mutex<HashMap<String, Arc<OnceLock<bool>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Process-wide availability cell for `program`.
fn shared_availability(program: &str) -> Arc<OnceLock<bool>> {
    match AVAILABILITY.lock() {
        Ok(mut cells) => cells.entry(program.to_string()).or_default().clone(),
        // A poisoned registry only costs an extra probe.
        Err(_) => Arc::new(OnceLock::new()),
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────────

/// Gateway to the external renderer.
#[derive(Debug, Clone)]
pub struct RendererGateway<R = TokioCommandRunner> {
    program: String,
    runner: R,
    availability: Arc<OnceLock<bool>>,
}

impl RendererGateway<TokioCommandRunner> {
    /// Gateway for `program` sharing the process-wide availability cache.
    pub fn system(program: impl Into<String>) -> Self {
        let program = program.into();
        let availability = shared_availability(&program);
        Self {
            program,
            runner: TokioCommandRunner,
            availability,
        }
    }
}

impl Default for RendererGateway<TokioCommandRunner> {
    fn default() -> Self {
        Self::system(DEFAULT_RENDERER)
    }
}

impl<R: CommandRunner> RendererGateway<R> {
    /// Gateway with a custom runner and its own availability cache.
    pub fn with_runner(program: impl Into<String>, runner: R) -> Self {
        Self {
            program: program.into(),
            runner,
            availability: Arc::new(OnceLock::new()),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Whether the renderer answers `--version` with exit code 0.
    ///
    /// Probed at most once per cache; spawn failures count as unavailable.
    pub async fn is_available(&self) -> bool {
        if let Some(&known) = self.availability.get() {
            return known;
        }
        let available = self
            .runner
            .run(&self.program, &["--version".to_string()])
            .await
            .is_ok_and(|out| out.success());
        // Concurrent probes agree; the losing write is dropped.
        let _ = self.availability.set(available);
        available
    }

    /// Render `source` into `output`, returning `output` on exit code 0.
    ///
    /// Order: sanitise `args`, check availability, spawn. A rejected flag
    /// therefore never starts a process, not even the probe.
    pub async fn render(
        &self,
        source: &Path,
        output: &Path,
        args: &[String],
    ) -> Result<PathBuf, Docs2LlmError> {
        sanitize(args)?;

        if !self.is_available().await {
            return Err(Docs2LlmError::RendererUnavailable {
                program: self.program.clone(),
                hint: INSTALL_HINT.to_string(),
            });
        }

        let argv = render_argv(source, output, args);
        let result = self
            .runner
            .run(&self.program, &argv)
            .await
            .map_err(|e| Docs2LlmError::RenderFailed {
                program: self.program.clone(),
                code: None,
                stderr: e.to_string(),
            })?;

        if !result.success() {
            return Err(Docs2LlmError::RenderFailed {
                program: self.program.clone(),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(output.to_path_buf())
    }
}

/// Argument vector for one render: `<source> [args…] -o <output>`.
pub fn render_argv(source: &Path, output: &Path, args: &[String]) -> Vec<String> {
    let mut argv = Vec::with_capacity(args.len() + 3);
    argv.push(source.to_string_lossy().into_owned());
    argv.extend(args.iter().cloned());
    argv.push("-o".to_string());
    argv.push(output.to_string_lossy().into_owned());
    argv
}

// ── Sanitisation ─────────────────────────────────────────────────────────────

/// Reject any argument that names a code-executing renderer flag.
///
/// The flag is the text before the first `=`. Long flags also match by
/// unambiguous-looking prefix (`--lua` → `--lua-filter`) because the
/// renderer's option parser accepts abbreviations. Short flags match when
/// attached to a value (`-Ffoo`) or inside a cluster (`-sF`).
pub fn sanitize(args: &[String]) -> Result<(), Docs2LlmError> {
    match args.iter().find_map(|arg| blocked_flag(arg)) {
        Some(flag) => Err(Docs2LlmError::BlockedRendererFlag {
            flag: flag.to_string(),
        }),
        None => Ok(()),
    }
}

fn blocked_flag(arg: &str) -> Option<&'static str> {
    let flag = arg.split('=').next().unwrap_or(arg);

    if let Some(name) = flag.strip_prefix("--") {
        if name.is_empty() {
            return None;
        }
        return BLOCKED_LONG_FLAGS
            .iter()
            .copied()
            .find(|blocked| blocked.starts_with(flag));
    }

    let cluster = flag.strip_prefix('-')?;
    for c in cluster.chars() {
        if let Some(&(_, canonical)) = BLOCKED_SHORT_FLAGS.iter().find(|(s, _)| *s == c) {
            return Some(canonical);
        }
        if VALUE_SHORT_FLAGS.contains(&c) {
            break;
        }
    }
    None
}
