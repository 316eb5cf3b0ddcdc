//! Pipeline orchestration.
//!
//! A run validates the requested reports, registers compilers, discovers and
//! merges raw coverage, remaps it through source maps and writes the reports.
//! Each run owns its coverage model, source map store and reporter.

pub mod options;
pub mod run;

pub use options::{CompilerSpec, RunOptions};
pub use run::{run, run_with_callback, Collaborators, RunOutcome};
