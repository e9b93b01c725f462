//! Progress display for the dispatcher.
//!
//! On a terminal an indicatif bar is drawn; elsewhere (CI logs, pipes) a
//! plain carriage-return line is rewritten after every result.

use super::DispatchStats;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};

/// How progress is shown on the diagnostic stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive progress bar.
    Bar,
    /// Single line rewritten with `\r`.
    #[default]
    Line,
    /// No progress output at all.
    Hidden,
}

impl ProgressMode {
    /// Pick a mode for the current process.
    pub fn detect(quiet: bool) -> Self {
        if quiet {
            Self::Hidden
        } else if io::stderr().is_terminal() {
            Self::Bar
        } else {
            Self::Line
        }
    }
}

/// Formats the one-line progress summary.
///
/// # Examples
///
/// ```
/// use run_tool::dispatch::{DispatchStats, progress::format_progress};
///
/// let stats = DispatchStats { success_count: 3, failed_count: 1, total: 8 };
/// assert_eq!(
///     format_progress("rewrite_to_chrome_style", &stats),
///     "Processed 4/8 files with rewrite_to_chrome_style tool (1 failures) [50.00%]"
/// );
/// ```
pub fn format_progress(tool_name: &str, stats: &DispatchStats) -> String {
    format!(
        "Processed {}/{} files with {} tool ({} failures) [{:.2}%]",
        stats.done(),
        stats.total,
        tool_name,
        stats.failed_count,
        stats.percentage()
    )
}

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {prefix} ({msg}) [{percent}%]";

enum Surface {
    Bar(ProgressBar),
    Line,
    Hidden,
}

/// Live progress state, owned by the dispatcher's consuming loop.
pub(crate) struct Progress {
    surface: Surface,
    tool_name: String,
}

impl Progress {
    pub(crate) fn new(mode: ProgressMode, total: usize, tool_name: &str) -> Self {
        let surface = match mode {
            ProgressMode::Bar => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓▒░  "),
                );
                pb.set_prefix(tool_name.to_string());
                pb.set_message("0 failures");
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
                Surface::Bar(pb)
            }
            ProgressMode::Line => Surface::Line,
            ProgressMode::Hidden => Surface::Hidden,
        };
        Self {
            surface,
            tool_name: tool_name.to_string(),
        }
    }

    /// Run `f` with the bar cleared so its output is not mixed into the bar.
    pub(crate) fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        match &self.surface {
            Surface::Bar(pb) => pb.suspend(f),
            Surface::Line | Surface::Hidden => f(),
        }
    }

    /// Redraw after a result has been counted.
    pub(crate) fn update<E: Write>(&self, err: &mut E, stats: &DispatchStats) -> io::Result<()> {
        match &self.surface {
            Surface::Bar(pb) => {
                pb.set_position(stats.done() as u64);
                pb.set_message(format!("{} failures", stats.failed_count));
                Ok(())
            }
            Surface::Line => {
                write!(err, "{}\r", format_progress(&self.tool_name, stats))?;
                err.flush()
            }
            Surface::Hidden => Ok(()),
        }
    }

    /// Leave the final state visible and end the line.
    ///
    /// The trailing newline is written in every mode, so whatever follows
    /// on the diagnostic stream starts on a fresh line.
    pub(crate) fn finish<E: Write>(&self, err: &mut E) -> io::Result<()> {
        if let Surface::Bar(pb) = &self.surface {
            pb.finish();
        }
        writeln!(err)?;
        err.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(success: usize, failed: usize, total: usize) -> DispatchStats {
        DispatchStats {
            success_count: success,
            failed_count: failed,
            total,
        }
    }

    #[test]
    fn test_format_progress_percentage() {
        assert_eq!(
            format_progress("tool", &stats(1, 0, 3)),
            "Processed 1/3 files with tool tool (0 failures) [33.33%]"
        );
    }

    #[test]
    fn test_format_progress_complete() {
        assert_eq!(
            format_progress("empty_string", &stats(2, 2, 4)),
            "Processed 4/4 files with empty_string tool (2 failures) [100.00%]"
        );
    }

    #[test]
    fn test_line_mode_writes_carriage_return_line() {
        let progress = Progress::new(ProgressMode::Line, 2, "t");
        let mut err = Vec::new();
        progress.update(&mut err, &stats(1, 0, 2)).unwrap();
        progress.finish(&mut err).unwrap();
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Processed 1/2 files with t tool (0 failures) [50.00%]\r\n"
        );
    }

    #[test]
    fn test_hidden_mode_writes_only_final_newline() {
        let progress = Progress::new(ProgressMode::Hidden, 2, "t");
        let mut err = Vec::new();
        progress.update(&mut err, &stats(1, 1, 2)).unwrap();
        assert!(err.is_empty());
        progress.finish(&mut err).unwrap();
        assert_eq!(err, b"\n");
    }

    #[test]
    fn test_bar_mode_finishes_with_newline() {
        let progress = Progress::new(ProgressMode::Bar, 1, "t");
        let mut err = Vec::new();
        progress.update(&mut err, &stats(1, 0, 1)).unwrap();
        progress.finish(&mut err).unwrap();
        assert_eq!(err, b"\n");
    }

    #[test]
    fn test_detect_quiet_is_hidden() {
        assert_eq!(ProgressMode::detect(true), ProgressMode::Hidden);
    }

    #[test]
    fn test_suspend_returns_closure_value() {
        let progress = Progress::new(ProgressMode::Line, 1, "t");
        assert_eq!(progress.suspend(|| 42), 42);
    }
}
