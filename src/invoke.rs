//! Running the external tool against one file.
//!
//! The dispatcher only sees the [`Invoke`] trait, so tests can swap the
//! process-backed [`ToolInvoker`] for an in-memory one.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::Instant;
use tracing::{debug, trace};

/// Spurious driver warning emitted for every file when the compile command
/// carries linker flags. It is noise, not a diagnostic about the file.
static LINKER_INPUT_UNUSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^warning: .*'linker' input unused \[-Wunused-command-line-argument\]\n")
        .expect("linker warning pattern is valid")
});

/// How a single invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit code zero; stdout is forwarded verbatim.
    Success { stdout: Vec<u8> },
    /// Non-zero exit, death by signal, or failure to start.
    Failure,
}

/// Result of running the tool once, handed back to the dispatcher by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// The file the tool ran on.
    pub file: PathBuf,
    /// Success carries stdout; failure discards it.
    pub outcome: Outcome,
    /// Filtered stderr, shown on success and used as the failure explanation.
    pub stderr: String,
}

impl InvocationResult {
    /// Create a successful result.
    pub fn success(
        file: impl Into<PathBuf>,
        stdout: impl Into<Vec<u8>>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            outcome: Outcome::Success {
                stdout: stdout.into(),
            },
            stderr: stderr.into(),
        }
    }

    /// Create a failed result.
    pub fn failure(file: impl Into<PathBuf>, stderr: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            outcome: Outcome::Failure,
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    /// Stdout of a successful run, `None` for failures.
    pub fn stdout(&self) -> Option<&[u8]> {
        match &self.outcome {
            Outcome::Success { stdout } => Some(stdout),
            Outcome::Failure => None,
        }
    }
}

/// Something that can run the tool on one file.
///
/// Implementations are called concurrently from the worker threads and must
/// report every problem through the returned result rather than panicking.
pub trait Invoke: Sync {
    fn invoke(&self, file: &Path) -> InvocationResult;
}

/// Runs `<tool> -p <build dir> <file> [extra args...]` as a subprocess.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    tool: PathBuf,
    build_dir: PathBuf,
    extra_args: Vec<String>,
}

impl ToolInvoker {
    pub fn new(
        tool: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        extra_args: Vec<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            build_dir: build_dir.into(),
            extra_args,
        }
    }

    /// Build the command for one file.
    fn command(&self, file: &Path) -> Command {
        let mut cmd = Command::new(&self.tool);
        cmd.arg("-p").arg(&self.build_dir).arg(file);
        cmd.args(&self.extra_args);
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl Invoke for ToolInvoker {
    fn invoke(&self, file: &Path) -> InvocationResult {
        let start = Instant::now();
        // output() drains stdout and stderr concurrently, so a chatty tool
        // cannot deadlock on a full pipe.
        let output = match self.command(file).output() {
            Ok(output) => output,
            Err(e) => {
                debug!(file = %file.display(), error = %e, "Failed to start tool");
                return InvocationResult::failure(
                    file,
                    format!("Failed to run {}: {}\n", self.tool.display(), e),
                );
            }
        };

        let stderr = strip_linker_warnings(&String::from_utf8_lossy(&output.stderr));
        trace!(
            file = %file.display(),
            status = %output.status,
            elapsed_ms = start.elapsed().as_millis(),
            stdout_bytes = output.stdout.len(),
            "Tool finished"
        );

        if output.status.success() {
            InvocationResult::success(file, output.stdout, stderr)
        } else {
            debug!(file = %file.display(), status = %output.status, "Tool failed");
            InvocationResult::failure(file, stderr)
        }
    }
}

/// Removes the known-benign linker warning lines from stderr.
pub fn strip_linker_warnings(stderr: &str) -> String {
    LINKER_INPUT_UNUSED.replace_all(stderr, "").into_owned()
}
