//! Coverage data model and merge algebra.
//!
//! This module handles:
//! - The raw JSON schema produced by instrumented runs
//! - Normalizing raw records into consistent per-file coverage
//! - Merging coverage from many runs into one model

pub mod file;
pub mod map;
pub mod schema;

// Re-export main types
pub use file::{add_branch_hits, FileCoverage};
pub use map::CoverageMap;
pub use schema::{
    BranchMapping, ElementId, FnMapping, Position, Range, RawCoverage, RawFileCoverage,
};
