//! Resolving the set of candidate source files.
//!
//! Two sources are supported: every file named by the compile database, or
//! the files tracked by git, narrowed by path filters and restricted to
//! C-family sources. Both produce a sorted, deduplicated `Vec<PathBuf>`
//! of absolute paths.

pub mod compile_db;
pub mod git;

use crate::error::Result;
use crate::paths;
use crate::prune::prune;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions of the C, C++, Objective-C and Objective-C++ sources the
/// tools understand.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "m", "mm"];

/// Where candidate files come from.
#[derive(Debug, Clone)]
pub enum CorpusSource {
    /// Every file in `<build_dir>/compile_commands.json`.
    CompileDb { build_dir: PathBuf },
    /// Files tracked by git in `repo_root`, narrowed by `filters`.
    Git {
        repo_root: PathBuf,
        filters: Vec<PathBuf>,
    },
}

/// Path filters split into exact files and directory-style prefixes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filters {
    pub files: Vec<PathBuf>,
    pub prefixes: Vec<PathBuf>,
}

impl Filters {
    /// Normalize each filter and classify it by what is on disk.
    ///
    /// Anything that is not an existing regular file is treated as a prefix.
    pub fn classify<P: AsRef<Path>>(filters: &[P]) -> Self {
        let mut classified = Self::default();
        for filter in filters {
            let path = paths::normalize(filter);
            if path.is_file() {
                classified.files.push(path);
            } else {
                classified.prefixes.push(path);
            }
        }
        classified
    }

    /// Whether the full git listing is needed at all.
    ///
    /// With only exact files there is nothing to prune; with no filters at
    /// all, everything is wanted.
    pub fn needs_listing(&self) -> bool {
        !self.prefixes.is_empty() || self.files.is_empty()
    }
}

/// Resolve the candidate files for a source.
pub fn resolve(source: &CorpusSource) -> Result<Vec<PathBuf>> {
    let files = match source {
        CorpusSource::CompileDb { build_dir } => compile_db::source_files(build_dir)?,
        CorpusSource::Git { repo_root, filters } => from_git(repo_root, filters)?,
    };
    info!(files = files.len(), "Resolved candidate files");
    Ok(files.into_iter().collect())
}

/// Files from the git listing, pruned by the filters, plus exact files.
fn from_git(repo_root: &Path, filters: &[PathBuf]) -> Result<BTreeSet<PathBuf>> {
    let filters = Filters::classify(filters);
    debug!(
        exact_files = filters.files.len(),
        prefixes = filters.prefixes.len(),
        "Classified path filters"
    );

    let mut selected: BTreeSet<PathBuf> = filters.files.iter().cloned().collect();
    if filters.needs_listing() {
        let corpus: Vec<PathBuf> = git::list_files(repo_root)?
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if filters.prefixes.is_empty() {
            selected.extend(corpus);
        } else {
            let pruned = prune(&corpus, &filters.prefixes);
            debug!(corpus = corpus.len(), pruned = pruned.len(), "Pruned git listing");
            selected.extend(pruned);
        }
    }

    Ok(retain_sources(selected))
}

/// Whether a path has one of the [`SOURCE_EXTENSIONS`].
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Drops everything that is not a C-family source file.
pub fn retain_sources(mut files: BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    files.retain(|path| is_source_file(path));
    files
}
