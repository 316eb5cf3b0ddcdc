//! Report command implementation.
//!
//! The report command:
//! 1. Loads configuration
//! 2. Runs the pipeline (discover, merge, remap)
//! 3. Writes the requested reports

use super::models::ReportArgs;
use crate::pipeline::{run, Collaborators, RunOptions};
use crate::utils::config::resolve_config;
use anyhow::{Context, Result};
use colored::*;
use log::info;
use std::env;
use std::time::Instant;

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Configuration errors
/// * Any fatal pipeline error (bad format, discovery, parse, report write)
pub fn execute_report(args: ReportArgs) -> Result<()> {
    let start_time = Instant::now();
    let cwd = env::current_dir().context("Failed to determine working directory")?;

    let mut config =
        resolve_config(args.config.as_deref(), &cwd).context("Failed to load configuration")?;
    if let Some(dir) = args.dir {
        config.reporting.dir = dir;
    }

    let mut opts = RunOptions::new()
        .with_include(args.include)
        .with_compilers(args.compilers);
    if let Some(root) = args.root {
        opts = opts.with_root(root);
    }

    let outcome = run(&args.formats, &config, &opts, Collaborators::default()).map_err(|e| {
        if e.is_input_error() {
            anyhow::Error::new(e).context("Invalid arguments")
        } else {
            anyhow::Error::new(e).context("Coverage report failed")
        }
    })?;

    info!(
        "Processed {} raw coverage files in {:.2?}",
        outcome.inputs.len(),
        start_time.elapsed()
    );
    println!(
        "📊 {} report(s) [{}] for {} files written to {}",
        outcome.reports.len(),
        outcome.reports.join(", "),
        outcome.coverage.len(),
        config.reporting.dir.display().to_string().cyan()
    );

    Ok(())
}
