//! Deterministic index-based sharding of a sorted file list.

use crate::error::{Result, RunToolError};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One shard out of `count`, stored 0-based.
///
/// The command line speaks 1-based `<n>-of-<count>`; parsing subtracts one
/// and `Display` adds it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSpec {
    index: usize,
    count: usize,
}

impl ShardSpec {
    /// Create a shard spec from a 0-based index.
    pub fn new(index: usize, count: usize) -> Result<Self> {
        if count == 0 || index >= count {
            return Err(RunToolError::InvalidShard(format!(
                "{}-of-{}",
                index.saturating_add(1),
                count
            )));
        }
        Ok(Self { index, count })
    }

    /// 0-based shard index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Total number of shards.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the file at `position` in the sorted list belongs to this shard.
    pub fn contains(&self, position: usize) -> bool {
        position % self.count == self.index
    }
}

impl FromStr for ShardSpec {
    type Err = RunToolError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RunToolError::InvalidShard(s.to_string());
        let (number, count) = s.trim().split_once("-of-").ok_or_else(invalid)?;
        if !is_digits(number) || !is_digits(count) {
            return Err(invalid());
        }
        let number: usize = number.parse().map_err(|_| invalid())?;
        let count: usize = count.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }
        Self::new(number - 1, count).map_err(|_| invalid())
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for ShardSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-of-{}", self.index + 1, self.count)
    }
}

/// Keeps the files of one shard.
///
/// Position `i` of `sorted_files` goes to shard `i % count`, so shards are
/// disjoint, together they reproduce the input, and one shard can be
/// computed without the others.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use run_tool::shard::{ShardSpec, shard};
///
/// let files = vec![PathBuf::from("/r/a/x.cc"), PathBuf::from("/r/a/y.cc")];
/// let second: ShardSpec = "2-of-2".parse().unwrap();
/// assert_eq!(shard(&files, second), vec![PathBuf::from("/r/a/y.cc")]);
/// ```
pub fn shard(sorted_files: &[PathBuf], spec: ShardSpec) -> Vec<PathBuf> {
    sorted_files
        .iter()
        .enumerate()
        .filter(|(position, _)| spec.contains(*position))
        .map(|(_, file)| file.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_parse_shard_spec() {
        let spec: ShardSpec = "3-of-8".parse().unwrap();
        assert_eq!(spec.index(), 2);
        assert_eq!(spec.count(), 8);
    }

    #[test]
    fn test_parse_single_shard() {
        let spec: ShardSpec = "1-of-1".parse().unwrap();
        assert_eq!(spec.index(), 0);
        assert_eq!(spec.count(), 1);
    }

    #[test]
    fn test_display_is_one_based() {
        let spec = ShardSpec::new(0, 4).unwrap();
        assert_eq!(spec.to_string(), "1-of-4");
        let parsed: ShardSpec = spec.to_string().parse().unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_parse_rejects_invalid_specs() {
        for bad in [
            "0-of-2", "3-of-2", "1-of-0", "0-of-0", "1of2", "a-of-2", "1-of-b", "-1-of-2",
            "1-of-2x", "1-of-", "-of-2", "", "+1-of-2",
        ] {
            let err = bad.parse::<ShardSpec>().unwrap_err();
            assert!(
                matches!(err, RunToolError::InvalidShard(ref s) if s.as_str() == bad),
                "expected InvalidShard for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(ShardSpec::new(2, 2).is_err());
        assert!(ShardSpec::new(0, 0).is_err());
        assert!(ShardSpec::new(1, 2).is_ok());
    }

    #[test]
    fn test_shard_example() {
        let list = files(&["/r/a/x.cc", "/r/a/y.cc"]);
        assert_eq!(shard(&list, "1-of-2".parse().unwrap()), files(&["/r/a/x.cc"]));
        assert_eq!(shard(&list, "2-of-2".parse().unwrap()), files(&["/r/a/y.cc"]));
    }

    #[test]
    fn test_shard_more_shards_than_files() {
        let list = files(&["/a.cc", "/b.cc"]);
        assert!(shard(&list, "5-of-5".parse().unwrap()).is_empty());
        assert_eq!(shard(&list, "2-of-5".parse().unwrap()), files(&["/b.cc"]));
    }

    #[test]
    fn test_shard_empty_list() {
        assert!(shard(&[], "1-of-3".parse().unwrap()).is_empty());
    }
}
