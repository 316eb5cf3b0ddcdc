//! Merge command implementation.
//! Combines every raw coverage file under a root into one JSON file, without remapping.

use super::models::MergeArgs;
use crate::aggregator::ingest_files;
use crate::discovery::{FileMatcher, GlobMatcher};
use crate::output::write_coverage_map;
use anyhow::{Context, Result};
use colored::*;
use std::env;

/// Execute the merge command
pub fn execute_merge(args: MergeArgs) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to determine working directory")?,
    };

    // Step 1: Discover
    let files = GlobMatcher::new()
        .files_for(&root, &[args.include.clone()])
        .context("Failed to discover raw coverage files")?;
    if files.is_empty() {
        println!(
            "{} No files matching {} under {}",
            "⚠".yellow(),
            args.include,
            root.display()
        );
    }

    // Step 2: Merge
    let map = ingest_files(&files).context("Failed to merge raw coverage")?;

    // Step 3: Write
    write_coverage_map(&map, &args.output).context("Failed to write merged coverage")?;
    println!(
        "📊 Merged {} raw files ({} source files) into {}",
        files.len(),
        map.len(),
        args.output.display().to_string().cyan()
    );

    Ok(())
}
