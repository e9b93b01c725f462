//! Parallel dispatch of tool invocations.
//!
//! A fixed pool of scoped worker threads pulls files off a channel and runs
//! the tool on each. Results come back by value on a second channel and are
//! consumed in completion order by a single loop, which is the only place
//! that writes output, counts outcomes, or redraws progress.
//!
//! ```text
//!                 files (sorted)
//!                       │
//!              ┌────────▼────────┐
//!              │   task channel  │
//!              └──┬─────┬─────┬──┘
//!           ┌─────▼┐ ┌──▼───┐ ┌▼─────┐
//!           │  W1  │ │  W2  │ │  WN  │   one tool process at a time each
//!           └─────┬┘ └──┬───┘ └┬─────┘
//!              ┌──▼─────▼─────▼──┐
//!              │  result channel │
//!              └────────┬────────┘
//!                       │ first completed, first consumed
//!              ┌────────▼────────┐
//!              │ consuming loop  │ → stdout / stderr / progress / stats
//!              └─────────────────┘
//! ```

pub mod progress;

use crate::invoke::{InvocationResult, Invoke};
use crossbeam_channel::unbounded;
use progress::{Progress, ProgressMode};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Outcome counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub success_count: usize,
    pub failed_count: usize,
    pub total: usize,
}

impl DispatchStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Number of files handled so far.
    pub fn done(&self) -> usize {
        self.success_count + self.failed_count
    }

    /// Completion percentage; an empty batch counts as complete.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.done() as f64 / self.total as f64 * 100.0
        }
    }

    /// Process exit status for this batch: the negated failure count.
    ///
    /// The count is clamped to 255 first, so on Unix any failure still
    /// yields a non-zero status after truncation to eight bits.
    pub fn exit_code(&self) -> i32 {
        -(self.failed_count.min(255) as i32)
    }

    fn record(&mut self, success: bool) {
        if success {
            self.success_count += 1;
        } else {
            self.failed_count += 1;
        }
    }
}

/// Default worker count: one per available core.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker threads; clamped to `1..=files`.
    pub jobs: usize,
    /// How progress is shown.
    pub progress: ProgressMode,
    /// Tool name used in the progress line.
    pub tool_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            progress: ProgressMode::default(),
            tool_name: "clang".to_string(),
        }
    }
}

/// Runs an [`Invoke`] implementation over a list of files in parallel.
pub struct Dispatcher<'a, I: Invoke> {
    invoker: &'a I,
    config: DispatcherConfig,
}

impl<'a, I: Invoke> Dispatcher<'a, I> {
    pub fn new(invoker: &'a I, config: DispatcherConfig) -> Self {
        Self { invoker, config }
    }

    /// Process every file and return the final counters.
    ///
    /// Successful stdout goes to `out`; stderr text, failure reports and
    /// progress go to `err`. Each result is written in one piece, so text
    /// from two files never interleaves. A failing file never stops the
    /// others. The only error is an I/O error writing `out` or `err`, in
    /// which case workers stop picking up new files and the batch ends
    /// early.
    #[instrument(level = "debug", skip_all, fields(files = files.len()))]
    pub fn run<O, E>(
        &self,
        files: &[PathBuf],
        out: &mut O,
        err: &mut E,
    ) -> io::Result<DispatchStats>
    where
        O: Write,
        E: Write,
    {
        let mut stats = DispatchStats::new(files.len());
        let progress = Progress::new(self.config.progress, files.len(), &self.config.tool_name);

        if files.is_empty() {
            debug!("No files selected; nothing to dispatch");
            progress.finish(err)?;
            return Ok(stats);
        }

        let worker_count = self.config.jobs.clamp(1, files.len());
        info!(
            workers = worker_count,
            files = files.len(),
            tool = %self.config.tool_name,
            "Dispatching tool invocations"
        );
        let start = Instant::now();

        let (task_tx, task_rx) = unbounded::<&Path>();
        let (result_tx, result_rx) = unbounded::<InvocationResult>();
        for file in files {
            // Cannot fail: task_rx is alive for the whole function.
            let _ = task_tx.send(file.as_path());
        }
        drop(task_tx);

        let shutdown = AtomicBool::new(false);
        let invoker = self.invoker;

        let outcome = thread::scope(|s| -> io::Result<()> {
            for worker_id in 0..worker_count {
                let rx = task_rx.clone();
                let tx = result_tx.clone();
                let shutdown = &shutdown;
                let spawned = thread::Builder::new()
                    .name(format!("run-tool-worker-{}", worker_id))
                    .spawn_scoped(s, move || {
                        while let Ok(file) = rx.recv() {
                            if shutdown.load(Ordering::SeqCst) {
                                break;
                            }
                            let result = invoke_contained(invoker, file);
                            if tx.send(result).is_err() {
                                break;
                            }
                        }
                    });
                if let Err(e) = spawned {
                    shutdown.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
            // Workers hold the remaining senders; the loop below ends once
            // the last of them exits.
            drop(result_tx);

            for result in result_rx.iter() {
                if let Err(e) = self.consume(result, &mut stats, &progress, out, err) {
                    warn!(error = %e, "Output stream failed; stopping workers");
                    shutdown.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
            Ok(())
        });
        outcome?;

        progress.finish(err)?;
        info!(
            succeeded = stats.success_count,
            failed = stats.failed_count,
            elapsed_ms = start.elapsed().as_millis(),
            "Dispatch complete"
        );
        Ok(stats)
    }

    /// Emit one result as a single unit, then count it and redraw progress.
    fn consume<O, E>(
        &self,
        result: InvocationResult,
        stats: &mut DispatchStats,
        progress: &Progress,
        out: &mut O,
        err: &mut E,
    ) -> io::Result<()>
    where
        O: Write,
        E: Write,
    {
        let success = result.is_success();
        progress.suspend(|| emit(&result, out, err))?;
        if !success {
            debug!(file = %result.file.display(), "Invocation failed");
        }
        stats.record(success);
        progress.update(err, stats)
    }
}

/// Runs the invoker, turning a panic into a failure for that one file.
fn invoke_contained<I: Invoke>(invoker: &I, file: &Path) -> InvocationResult {
    panic::catch_unwind(AssertUnwindSafe(|| invoker.invoke(file))).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        InvocationResult::failure(file, format!("Worker panicked: {}\n", reason))
    })
}

/// Writes one result's text with a single `write_all` per stream.
fn emit<O: Write, E: Write>(result: &InvocationResult, out: &mut O, err: &mut E) -> io::Result<()> {
    match result.stdout() {
        Some(stdout) => {
            out.write_all(stdout)?;
            out.flush()?;
            if !result.stderr.is_empty() {
                err.write_all(result.stderr.as_bytes())?;
            }
        }
        None => {
            let report = format!(
                "\nFailed to process {}\n{}\n",
                result.file.display(),
                result.stderr
            );
            err.write_all(report.as_bytes())?;
        }
    }
    err.flush()
}
