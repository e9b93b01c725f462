//! run-tool - run a clang tool over many source files in parallel
//!
//! Files come from a compile database or from git, optionally narrowed by
//! path filters and split into shards, and are then processed by a pool of
//! workers that each run one tool process at a time.

pub mod cli;
pub mod corpus;
pub mod dispatch;
pub mod error;
pub mod invoke;
pub mod logging;
pub mod paths;
pub mod prune;
pub mod shard;
