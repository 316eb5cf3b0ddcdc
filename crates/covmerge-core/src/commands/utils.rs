use crate::aggregator::{read_raw_coverage, summarize_map};
use crate::coverage::CoverageMap;
use crate::output::REPORT_FORMATS;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a raw coverage JSON file
pub fn validate_coverage_file(file_path: PathBuf) -> Result<()> {
    println!("Validating raw coverage: {}", file_path.display());

    let raw = read_raw_coverage(&file_path)?;
    let mut map = CoverageMap::new();
    map.merge_raw(raw)
        .with_context(|| format!("{} is not valid coverage", file_path.display()))?;

    let (overall, _) = summarize_map(&map);

    println!("✓ Valid raw coverage JSON");
    println!("  Files: {}", map.len());
    for (label, totals) in overall.metrics() {
        println!("  {}: {}/{} ({}%)", label, totals.covered, totals.total, totals.pct);
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("covmerge v{}", env!("CARGO_PKG_VERSION"));
    println!("Report formats: {}", REPORT_FORMATS.join(", "));
    println!();
    println!("Merges raw coverage from many runs and remaps it through source maps.");
}
