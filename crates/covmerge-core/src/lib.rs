//! covmerge library
//!
//! Merges raw coverage from independently executed processes, remaps it to
//! original sources through source maps and writes coverage reports.

pub mod aggregator;
pub mod commands;
pub mod coverage;
pub mod discovery;
pub mod hook;
pub mod output;
pub mod pipeline;
pub mod source_map;
pub mod transform;
pub mod utils;

pub use coverage::{CoverageMap, FileCoverage};
pub use pipeline::{run, run_with_callback, Collaborators, RunOptions, RunOutcome};
pub use utils::{RunError, RunErrorKind};
