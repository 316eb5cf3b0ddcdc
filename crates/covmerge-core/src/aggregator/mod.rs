//! Ingestion of raw coverage files and coverage metrics.
//!
//! This module turns raw coverage on disk into:
//! - One merged coverage model
//! - Per-file and overall coverage summaries

pub mod ingest;
pub mod metrics;

// Re-export main types and functions
pub use ingest::{ingest_files, read_raw_coverage};
pub use metrics::{summarize_file, summarize_map, CoverageSummary, Totals, Watermark};
