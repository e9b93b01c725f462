//! Candidate files from the git index.

use crate::error::{Result, RunToolError};
use crate::paths;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Lists every file tracked by git under `repo_root`, as absolute paths.
///
/// Any failure of `git ls-files` aborts the listing; a partial corpus would
/// silently skip files.
pub fn list_files<P: AsRef<Path>>(repo_root: P) -> Result<Vec<PathBuf>> {
    let repo_root = repo_root.as_ref();
    let output = Command::new("git")
        .current_dir(repo_root)
        .args(["ls-files", "-z"])
        .output()
        .map_err(|e| RunToolError::GitListing(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        return Err(RunToolError::GitListing(format!(
            "git exited with {} in {}: {}",
            output.status,
            repo_root.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let files = parse_ls_files(&output.stdout, repo_root);
    debug!(
        repo_root = %repo_root.display(),
        files = files.len(),
        "Listed files from git"
    );
    Ok(files)
}

/// Parses NUL-separated `git ls-files -z` output relative to `repo_root`.
///
/// Entries keep their raw bytes, so file names that are not valid UTF-8
/// still name the file on disk.
fn parse_ls_files(stdout: &[u8], repo_root: &Path) -> Vec<PathBuf> {
    stdout
        .split(|&b| b == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| paths::normalize(repo_root.join(entry_path(entry))))
        .collect()
}

#[cfg(unix)]
fn entry_path(entry: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(entry))
}

#[cfg(not(unix))]
fn entry_path(entry: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(entry).into_owned())
}
