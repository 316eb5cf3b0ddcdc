//! JSON coverage output (`coverage-final.json`).
//!
//! Writes the reconciled coverage map with proper formatting and reads it back.

use super::{write_report_file, Report, ReportContext};
use crate::coverage::CoverageMap;
use crate::utils::error::ReportError;
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// File written by the `json` report
pub const COVERAGE_FINAL_FILE: &str = "coverage-final.json";

/// Write a coverage map to a JSON file
///
/// **Public** - used by the `json` report and the `merge` command
///
/// # Arguments
/// * `map` - Coverage to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `ReportError::WriteFailed` - I/O error during write
/// * `ReportError::SerializationFailed` - JSON serialization error
/// * `ReportError::InvalidPath` - Path cannot be created or is invalid
pub fn write_coverage_map(map: &CoverageMap, output_path: impl AsRef<Path>) -> Result<(), ReportError> {
    let output_path = output_path.as_ref();
    debug!(
        "Writing coverage for {} files to: {}",
        map.len(),
        output_path.display()
    );

    write_report_file(output_path, |writer| {
        serde_json::to_writer_pretty(writer, map)?;
        Ok(())
    })
}

/// Read a coverage map previously written by `write_coverage_map`
///
/// # Errors
/// * `ReportError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `ReportError::SerializationFailed` - JSON parse error
pub fn read_coverage_map(input_path: impl AsRef<Path>) -> Result<CoverageMap, ReportError> {
    let input_path = input_path.as_ref();
    debug!("Reading coverage from: {}", input_path.display());

    let file = File::open(input_path)?;
    let map: CoverageMap = serde_json::from_reader(BufReader::new(file))?;

    debug!("Coverage loaded: {} files", map.len());
    Ok(map)
}

/// `json`: the full reconciled map
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReport;

impl Report for JsonReport {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<(), ReportError> {
        write_coverage_map(ctx.map, ctx.dir.join(COVERAGE_FINAL_FILE))
    }
}
