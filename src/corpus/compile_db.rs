//! Reading and generating `compile_commands.json`.

use crate::error::{Result, RunToolError};
use crate::paths;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Ninja rules whose commands belong in the compile database.
const COMPDB_RULES: &[&str] = &["cc", "cxx", "objc", "objcxx"];

/// One entry of a compile database.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CompileCommand {
    /// Working directory of the compile command.
    pub directory: PathBuf,
    /// Source file, relative to `directory` or absolute.
    pub file: PathBuf,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<String>,
}

impl CompileCommand {
    /// Absolute, normalized path of the source file.
    pub fn source_path(&self) -> PathBuf {
        paths::normalize(self.directory.join(&self.file))
    }
}

/// Parse compile database JSON text.
pub fn parse(json: &str, origin: &Path) -> Result<Vec<CompileCommand>> {
    serde_json::from_str(json).map_err(|e| RunToolError::CompileDb {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read the compile database of a build directory.
pub fn read<P: AsRef<Path>>(build_dir: P) -> Result<Vec<CompileCommand>> {
    let path = paths::compile_db_path(build_dir);
    let text = std::fs::read_to_string(&path).map_err(|e| RunToolError::CompileDb {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let entries = parse(&text, &path)?;
    debug!(path = %path.display(), entries = entries.len(), "Read compile database");
    Ok(entries)
}

/// Every source file named by the compile database, deduplicated.
///
/// No extension filtering: every entry is assumed relevant, generated
/// files included.
pub fn source_files<P: AsRef<Path>>(build_dir: P) -> Result<BTreeSet<PathBuf>> {
    Ok(read(build_dir)?
        .iter()
        .map(CompileCommand::source_path)
        .collect())
}

/// Regenerate `compile_commands.json` with `ninja -t compdb`.
pub fn generate_with_ninja<P: AsRef<Path>>(build_dir: P) -> Result<()> {
    let build_dir = build_dir.as_ref();
    info!(build_dir = %build_dir.display(), "Generating compile database");

    let output = Command::new("ninja")
        .arg("-C")
        .arg(build_dir)
        .args(["-t", "compdb"])
        .args(COMPDB_RULES)
        .output()
        .map_err(|e| RunToolError::CompileDbGeneration(format!("failed to run ninja: {}", e)))?;

    if !output.status.success() {
        return Err(RunToolError::CompileDbGeneration(format!(
            "ninja exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    // Refuse to overwrite a good database with something unparsable.
    let text = String::from_utf8_lossy(&output.stdout);
    let path = paths::compile_db_path(build_dir);
    let entries = parse(&text, &path)?;
    std::fs::write(&path, text.as_bytes())?;
    info!(path = %path.display(), entries = entries.len(), "Wrote compile database");
    Ok(())
}
