//! Configuration and constants for the pipeline and CLI.
//!
//! Configuration is read from a TOML file (`.covmerge.toml` by default). Every
//! section is optional; missing values fall back to the defaults below.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default glob for raw coverage files
pub const DEFAULT_INCLUDE: &str = "**/coverage*.raw.json";

/// Directories never searched for raw coverage
pub const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**"];

/// Default output directory for file-based reports
pub const DEFAULT_REPORT_DIR: &str = "coverage";

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = ".covmerge.toml";

/// Reports written when the caller does not ask for any
pub const DEFAULT_REPORTS: &[&str] = &["lcovonly", "text-summary"];

/// Low/high coverage percentages used for coloring summaries
pub const DEFAULT_WATERMARKS: [f64; 2] = [50.0, 80.0];

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Enable debug logging
    #[serde(default)]
    pub verbose: bool,

    /// Instrumentation settings
    #[serde(default)]
    pub instrumentation: InstrumentationConfig,

    /// Reporting settings
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Options handed to the instrumenter
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumenterOptions {
    /// Register source map URLs found while instrumenting
    pub produce_source_map: bool,
}

impl Default for InstrumenterOptions {
    fn default() -> Self {
        Self {
            produce_source_map: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstrumentationConfig {
    /// Extensions the loader hook is allowed to intercept
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Register source map URLs found while instrumenting
    #[serde(default = "default_true")]
    pub produce_source_map: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            produce_source_map: true,
        }
    }
}

impl InstrumentationConfig {
    /// Extensions without their leading dot
    pub fn extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect()
    }

    pub fn instrumenter_opts(&self) -> InstrumenterOptions {
        InstrumenterOptions {
            produce_source_map: self.produce_source_map,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportingConfig {
    /// Output directory for file-based reports
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,

    /// Report formats used when none are requested explicitly
    #[serde(default = "default_reports")]
    pub reports: Vec<String>,

    /// Low and high watermarks in percent
    #[serde(default = "default_watermarks")]
    pub watermarks: [f64; 2],
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            dir: default_report_dir(),
            reports: default_reports(),
            watermarks: DEFAULT_WATERMARKS,
        }
    }
}

impl ReportingConfig {
    pub fn reports(&self) -> Vec<String> {
        self.reports.clone()
    }
}

fn default_extensions() -> Vec<String> {
    vec![".js".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_DIR)
}

fn default_reports() -> Vec<String> {
    DEFAULT_REPORTS.iter().map(|r| r.to_string()).collect()
}

fn default_watermarks() -> [f64; 2] {
    DEFAULT_WATERMARKS
}

/// Load configuration from a TOML file
///
/// # Errors
/// * `ConfigError::IoError` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

/// Load configuration from `explicit`, else `.covmerge.toml` in `cwd` if present, else defaults
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    let fallback = cwd.join(DEFAULT_CONFIG_FILE);
    if fallback.is_file() {
        log::debug!("Using config file {}", fallback.display());
        return load_config(fallback);
    }

    Ok(Config::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.verbose);
        assert_eq!(config.instrumentation.extensions(), vec!["js".to_string()]);
        assert!(config.instrumentation.instrumenter_opts().produce_source_map);
        assert_eq!(config.reporting.reports(), vec!["lcovonly", "text-summary"]);
        assert_eq!(config.reporting.dir, PathBuf::from("coverage"));
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
            verbose = true

            [instrumentation]
            extensions = [".js", ".mjs"]

            [reporting]
            reports = ["json"]
            watermarks = [60.0, 90.0]
            "#,
        )
        .unwrap();

        assert!(config.verbose);
        assert_eq!(config.instrumentation.extensions(), vec!["js", "mjs"]);
        assert_eq!(config.reporting.reports(), vec!["json"]);
        assert_eq!(config.reporting.watermarks, [60.0, 90.0]);
        assert_eq!(config.reporting.dir, PathBuf::from("coverage"));
    }

    #[test]
    fn test_resolve_config_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve_config(None, dir.path()).unwrap();
        assert_eq!(config.reporting.reports(), vec!["lcovonly", "text-summary"]);
    }

    #[test]
    fn test_resolve_config_picks_up_default_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[reporting]\nreports = [\"json-summary\"]\n",
        )
        .unwrap();

        let config = resolve_config(None, dir.path()).unwrap();
        assert_eq!(config.reporting.reports(), vec!["json-summary"]);
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "reporting = [").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::ParseFailed(_))));
    }
}
