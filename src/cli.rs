//! Command-line interface definitions using clap.

use crate::error::{Result, RunToolError};
use crate::paths;
use crate::shard::ShardSpec;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

const OPTIONS_FILE_FLAG: &str = "--options-file";

/// Run a clang tool over many source files in parallel.
#[derive(Parser, Debug)]
#[command(name = "run-tool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the clang tool to run.
    #[arg(long)]
    pub tool: String,

    /// Directory that contains compile_commands.json.
    #[arg(short = 'p', value_name = "BUILD_DIR")]
    pub build_dir: PathBuf,

    /// Run the tool over every file in the compile database.
    #[arg(long)]
    pub all: bool,

    /// Regenerate the compile database before running the tool.
    #[arg(long, alias = "generate-manifest")]
    pub generate_compdb: bool,

    /// Only process shard <n> of <count>.
    #[arg(long, value_name = "<n>-of-<count>", value_parser = parse_shard)]
    pub shard: Option<ShardSpec>,

    /// Paths (directories or files) to restrict the run to.
    pub path_filter: Vec<PathBuf>,

    /// Extra argument passed to the tool (repeatable).
    #[arg(long = "tool-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub tool_args: Vec<String>,

    /// Directory that contains the tool binary.
    #[arg(long, env = "RUN_TOOL_PATH", default_value_os_t = paths::default_tool_dir())]
    pub tool_path: PathBuf,

    /// Read all options from this file instead of the command line.
    #[arg(long, value_name = "FILE")]
    pub options_file: Option<PathBuf>,

    /// Number of tool processes to run at once (defaults to CPU count).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Enable verbose output (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide the progress display.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

fn parse_shard(s: &str) -> std::result::Result<ShardSpec, String> {
    s.parse::<ShardSpec>().map_err(|e| e.to_string())
}

impl Cli {
    /// Path of the tool binary inside the tool directory.
    pub fn tool_binary(&self) -> PathBuf {
        paths::absolutize(&paths::expand_tilde(&self.tool_path)).join(&self.tool)
    }
}

/// Replace the arguments with the contents of `--options-file`, if given.
///
/// The program name is kept; every other argument is dropped and the
/// whitespace-separated words of the file take their place. Without the
/// flag the arguments are returned untouched.
pub fn expand_options_file(args: Vec<OsString>) -> Result<Vec<OsString>> {
    let Some(path) = find_options_file(&args) else {
        return Ok(args);
    };
    let path = paths::expand_tilde(path);
    let contents = std::fs::read_to_string(&path).map_err(|source| RunToolError::OptionsFile {
        path: path.clone(),
        source,
    })?;

    let mut expanded: Vec<OsString> = args.into_iter().take(1).collect();
    expanded.extend(contents.split_whitespace().map(OsString::from));
    Ok(expanded)
}

fn find_options_file(args: &[OsString]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let Some(arg) = arg.to_str() else { continue };
        if arg == "--" {
            break;
        }
        if arg == OPTIONS_FILE_FLAG {
            return iter.next().map(PathBuf::from);
        }
        if let Some(value) = arg
            .strip_prefix(OPTIONS_FILE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            return Some(PathBuf::from(value));
        }
    }
    None
}
