//! Prefix pruning over a sorted file corpus.
//!
//! Matching is by whole path components: `/r/ab` selects `/r/ab` and
//! everything below `/r/ab/`, never `/r/abc/x.cc` or `/r/ab.cc`. `Path`
//! orders component by component, so in a sorted corpus everything under a
//! prefix forms one contiguous run that begins at the prefix itself. The
//! pruner walks the sorted prefixes and the corpus together with a cursor
//! that only moves forward, binary-searching each prefix from the cursor.

use std::path::{Path, PathBuf};

/// Selects the corpus entries that lie under at least one prefix.
///
/// `sorted_corpus` must be sorted in `Path` order and free of duplicates
/// (a `BTreeSet<PathBuf>` collected into a `Vec` is). The prefixes may come
/// in any order. The result keeps the corpus order and never repeats an
/// entry, even when one prefix is nested inside another.
///
/// Work is O(corpus + prefixes * log(corpus)).
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use run_tool::prune::prune;
///
/// let corpus: Vec<PathBuf> = ["/r/a/x.cc", "/r/a/y.cc", "/r/b/z.cc"]
///     .iter()
///     .map(PathBuf::from)
///     .collect();
/// let pruned = prune(&corpus, &[PathBuf::from("/r/a")]);
/// assert_eq!(pruned, vec![PathBuf::from("/r/a/x.cc"), PathBuf::from("/r/a/y.cc")]);
/// ```
pub fn prune<P: AsRef<Path>>(sorted_corpus: &[PathBuf], prefixes: &[P]) -> Vec<PathBuf> {
    debug_assert!(
        sorted_corpus.windows(2).all(|w| w[0] < w[1]),
        "corpus must be sorted and deduplicated"
    );

    if sorted_corpus.is_empty() || prefixes.is_empty() {
        return Vec::new();
    }

    let mut sorted_prefixes: Vec<&Path> = prefixes.iter().map(AsRef::as_ref).collect();
    sorted_prefixes.sort();
    sorted_prefixes.dedup();

    let mut pruned = Vec::new();
    let mut cursor = 0;
    for prefix in sorted_prefixes {
        let remaining = &sorted_corpus[cursor..];
        let start = cursor + remaining.partition_point(|entry| entry.as_path() < prefix);
        let run = sorted_corpus[start..]
            .iter()
            .take_while(|entry| entry.starts_with(prefix))
            .count();

        pruned.extend_from_slice(&sorted_corpus[start..start + run]);
        // A prefix without matches leaves the cursor at its insertion point,
        // which is still <= the run of every later (larger) prefix.
        cursor = start + run;
        if cursor == sorted_corpus.len() {
            break;
        }
    }

    pruned
}
