//! Report generation over reconciled coverage.
//!
//! This module handles:
//! - The registry of report formats requested for a run
//! - Built-in JSON, JSON summary, lcov and text summary reports
//! - Writing report files under the report directory

pub mod json;
pub mod lcov;
pub mod summary;

// Re-export main types and functions
pub use json::{read_coverage_map, write_coverage_map, JsonReport};
pub use lcov::{render_lcov, LcovReport};
pub use summary::{render_text_summary, JsonSummaryReport, TextSummaryReport};

use crate::coverage::CoverageMap;
use crate::transform::SourceFinder;
use crate::utils::config::ReportingConfig;
use crate::utils::error::ReportError;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Names of the built-in report formats
pub const REPORT_FORMATS: &[&str] = &["json", "json-summary", "lcovonly", "text-summary"];

/// Everything a report needs to render the reconciled coverage
pub struct ReportContext<'a> {
    pub map: &'a CoverageMap,
    pub source_finder: &'a SourceFinder,
    /// Directory file-based reports write into
    pub dir: &'a Path,
    /// Low and high watermarks in percent
    pub watermarks: [f64; 2],
}

/// One report format
pub trait Report {
    fn name(&self) -> &str;

    /// Render the report
    ///
    /// # Errors
    /// * `ReportError` - the output could not be written
    fn write(&self, ctx: &ReportContext<'_>) -> Result<(), ReportError>;
}

/// Built-in report for `name`, if there is one
pub fn create_report(name: &str) -> Option<Box<dyn Report>> {
    match name {
        "json" => Some(Box::new(JsonReport)),
        "json-summary" => Some(Box::new(JsonSummaryReport)),
        "lcovonly" => Some(Box::new(LcovReport)),
        "text-summary" => Some(Box::new(TextSummaryReport)),
        _ => None,
    }
}

/// The set of reports configured for a run
pub struct Reporter {
    dir: PathBuf,
    watermarks: [f64; 2],
    reports: Vec<Box<dyn Report>>,
}

impl Reporter {
    pub fn new(config: &ReportingConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            watermarks: config.watermarks,
            reports: Vec::new(),
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Add a custom report
    pub fn add_report(&mut self, report: Box<dyn Report>) {
        self.reports.push(report);
    }

    /// Add every named built-in format; nothing is added if any name is unknown
    ///
    /// # Errors
    /// * `ReportError::UnknownFormat` - the first unrecognized name
    pub fn add_all(&mut self, formats: &[String]) -> Result<(), ReportError> {
        let mut resolved = Vec::with_capacity(formats.len());
        for format in formats {
            let report =
                create_report(format).ok_or_else(|| ReportError::UnknownFormat(format.clone()))?;
            resolved.push(report);
        }

        for report in resolved {
            if self.reports.iter().any(|r| r.name() == report.name()) {
                debug!("Report {} requested twice", report.name());
                continue;
            }
            self.reports.push(report);
        }
        Ok(())
    }

    /// Names of the configured reports, in write order
    pub fn formats(&self) -> Vec<&str> {
        self.reports.iter().map(|r| r.name()).collect()
    }

    /// Render every configured report, stopping at the first failure
    pub fn write(&self, map: &CoverageMap, source_finder: &SourceFinder) -> Result<(), ReportError> {
        let ctx = ReportContext {
            map,
            source_finder,
            dir: &self.dir,
            watermarks: self.watermarks,
        };

        for report in &self.reports {
            debug!("Writing {} report", report.name());
            report.write(&ctx)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("dir", &self.dir)
            .field("reports", &self.formats())
            .finish()
    }
}

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), ReportError> {
    if path.as_os_str().is_empty() {
        return Err(ReportError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(ReportError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create `path` (and its parent directories) and hand a buffered writer to `render`
pub(crate) fn write_report_file(
    path: &Path,
    render: impl FnOnce(&mut BufWriter<File>) -> Result<(), ReportError>,
) -> Result<(), ReportError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            fs::create_dir_all(parent).map_err(|e| {
                ReportError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    render(&mut writer)?;
    writer.flush()?;

    info!(
        "Wrote {} ({} bytes)",
        path.display(),
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    );
    Ok(())
}
