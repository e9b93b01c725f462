//! run-tool - parallel clang tool runner

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stderr};
use tracing::{info, warn};

use run_tool::cli::{self, Cli};
use run_tool::corpus::{self, CorpusSource, compile_db};
use run_tool::dispatch::progress::ProgressMode;
use run_tool::dispatch::{Dispatcher, DispatcherConfig, default_jobs};
use run_tool::error::RunToolError;
use run_tool::invoke::ToolInvoker;
use run_tool::logging::{self, LogConfig};
use run_tool::shard::shard;

fn main() {
    let result = cli::expand_options_file(std::env::args_os().collect())
        .map_err(anyhow::Error::from)
        .and_then(|args| {
            let cli = Cli::parse_from(args);
            if cli.no_color {
                owo_colors::set_override(false);
            }
            logging::init(LogConfig::for_verbosity(cli.verbose).with_env_overrides());
            run(&cli)
        });

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!(
                "{}: {}",
                "error"
                    .if_supports_color(Stderr, |text| text.red())
                    .if_supports_color(Stderr, |text| text.bold()),
                e
            );
            for cause in e.chain().skip(1) {
                eprintln!(
                    "  {}: {}",
                    "caused by".if_supports_color(Stderr, |text| text.yellow()),
                    cause
                );
            }
            std::process::exit(1);
        }
    }
}

/// Select the files, run the tool on each and return the exit status.
fn run(cli: &Cli) -> Result<i32> {
    let tool = cli.tool_binary();
    if !tool.is_file() {
        return Err(RunToolError::ToolNotFound(tool).into());
    }
    let build_dir = run_tool::paths::expand_tilde(&cli.build_dir);

    if cli.generate_compdb {
        compile_db::generate_with_ninja(&build_dir)
            .with_context(|| format!("while preparing {}", build_dir.display()))?;
    }

    let source = if cli.all {
        if !cli.path_filter.is_empty() {
            warn!(
                filters = cli.path_filter.len(),
                "Path filters are ignored with --all"
            );
        }
        CorpusSource::CompileDb {
            build_dir: build_dir.clone(),
        }
    } else {
        CorpusSource::Git {
            repo_root: std::env::current_dir().context("cannot determine the current directory")?,
            filters: cli.path_filter.clone(),
        }
    };
    let mut files: Vec<PathBuf> = corpus::resolve(&source)?;

    if let Some(spec) = cli.shard {
        let total = files.len();
        files = shard(&files, spec);
        eprintln!(
            "Shard {} will process {} entries out of {}",
            spec,
            files.len(),
            total
        );
    }

    let invoker = ToolInvoker::new(tool, build_dir, cli.tool_args.clone());
    let config = DispatcherConfig {
        jobs: cli.jobs.unwrap_or_else(default_jobs),
        progress: ProgressMode::detect(cli.quiet),
        tool_name: cli.tool.clone(),
    };
    info!(files = files.len(), jobs = config.jobs, tool = %cli.tool, "Dispatching");

    // Stderr stays unlocked: the progress bar redraws it from its own thread.
    let stats = Dispatcher::new(&invoker, config)
        .run(&files, &mut io::stdout().lock(), &mut io::stderr())
        .context("failed to write tool output")?;

    if let Some(spec) = cli.shard {
        writeln!(
            io::stderr(),
            "Shard {}: {} succeeded, {} failed",
            spec, stats.success_count, stats.failed_count
        )?;
    }

    Ok(stats.exit_code())
}
