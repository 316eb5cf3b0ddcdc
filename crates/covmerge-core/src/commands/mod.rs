//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod merge;
pub mod models;
pub mod report;
pub mod utils;

// Re-export main command functions
pub use merge::execute_merge;
pub use models::{MergeArgs, ReportArgs};
pub use report::execute_report;
pub use utils::{display_version, validate_coverage_file};
