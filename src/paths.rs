//! Path utilities for run-tool.

use std::path::{Component, Path, PathBuf};

/// Name of the compile database inside a build directory.
pub const COMPILE_DB_FILENAME: &str = "compile_commands.json";

/// Tool directory used when `--tool-path` is not given, relative to the
/// checkout root (the current directory).
pub const DEFAULT_TOOL_DIR: &str = "third_party/llvm-build/Release+Asserts/bin";

/// Get the directory tools are resolved from by default.
pub fn default_tool_dir() -> PathBuf {
    absolutize(Path::new(DEFAULT_TOOL_DIR))
}

/// Get the path to the compile database for a build directory.
pub fn compile_db_path<P: AsRef<Path>>(build_dir: P) -> PathBuf {
    build_dir.as_ref().join(COMPILE_DB_FILENAME)
}

/// Expands a leading `~` in a path to the user's home directory.
///
/// Options files are read before the shell sees them, so `~` inside
/// `--options-file=~/opts` never gets expanded otherwise.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use run_tool::paths::expand_tilde;
///
/// let path = PathBuf::from("/tmp/foo");
/// assert_eq!(expand_tilde(&path), path);
/// ```
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Ok(stripped) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    path.to_path_buf()
}

/// Turns a path into an absolute, normalized path.
///
/// Symlinks are resolved when the path exists. Paths that do not exist
/// (a file deleted from the working tree but still in the git index, say)
/// are made absolute against the current directory and cleaned lexically,
/// so `out/Default/../../a.cc` and `a.cc` still compare equal.
pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    std::fs::canonicalize(path).unwrap_or_else(|_| absolutize(path))
}

/// Makes a path absolute and removes `.` and `..` components without
/// touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    clean(&joined)
}

/// Lexically removes `.` and `..` components.
///
/// `..` at the root stays at the root, matching how the kernel resolves it.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
