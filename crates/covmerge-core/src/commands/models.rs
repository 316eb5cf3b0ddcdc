use crate::utils::config::{DEFAULT_INCLUDE, DEFAULT_REPORT_DIR};
use std::path::PathBuf;

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Report formats; empty means the configured defaults
    pub formats: Vec<String>,

    /// Directory searched for raw coverage (working directory when unset)
    pub root: Option<PathBuf>,

    /// Glob selecting raw coverage files
    pub include: String,

    /// Compiler registrations (`ext:module`)
    pub compilers: Vec<String>,

    /// Report output directory, overriding the config file
    pub dir: Option<PathBuf>,

    /// Explicit config file
    pub config: Option<PathBuf>,
}

impl Default for ReportArgs {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            root: None,
            include: DEFAULT_INCLUDE.to_string(),
            compilers: Vec::new(),
            dir: None,
            config: None,
        }
    }
}

/// Arguments for the merge command
#[derive(Debug, Clone)]
pub struct MergeArgs {
    /// Directory searched for raw coverage (working directory when unset)
    pub root: Option<PathBuf>,

    /// Glob selecting raw coverage files
    pub include: String,

    /// Path of the merged JSON file
    pub output: PathBuf,
}

impl Default for MergeArgs {
    fn default() -> Self {
        Self {
            root: None,
            include: DEFAULT_INCLUDE.to_string(),
            output: PathBuf::from(DEFAULT_REPORT_DIR).join("coverage-merged.json"),
        }
    }
}
