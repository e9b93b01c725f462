//! Error types for run-tool.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for run-tool.
///
/// Only configuration and selection problems surface here. A tool exiting
/// non-zero for one file is not an error; it is counted by the dispatcher.
#[derive(Error, Debug)]
pub enum RunToolError {
    #[error("Invalid shard spec '{0}': expected <n>-of-<count> with 1 <= n <= count")]
    InvalidShard(String),

    #[error("Failed to read options file {}: {source}", path.display())]
    OptionsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool not found: {}. Use --tool-path to point at the tool directory.", .0.display())]
    ToolNotFound(PathBuf),

    #[error("git ls-files failed: {0}")]
    GitListing(String),

    #[error("Invalid compile database {}: {message}", path.display())]
    CompileDb { path: PathBuf, message: String },

    #[error("Failed to generate compile database: {0}")]
    CompileDbGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for run-tool operations.
pub type Result<T> = std::result::Result<T, RunToolError>;
