//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in the commands and main.rs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while normalizing or merging coverage records
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Malformed coverage for {path}: {kind} count {id} has no location")]
    MissingLocation {
        path: String,
        kind: &'static str,
        id: u32,
    },
}

/// Errors that can occur while loading or decoding a source map
#[derive(Error, Debug)]
pub enum SourceMapError {
    #[error("Failed to read source map {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source map is not valid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported source map version: {0}")]
    UnsupportedVersion(u32),

    #[error("Indexed source maps (sections) are not supported")]
    IndexedMap,

    #[error("Invalid mappings: {0}")]
    InvalidMappings(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors from the file-matching collaborator
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Cannot determine the working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("Invalid include pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unknown report format: {0}")]
    UnknownFormat(String),

    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors raised by a module loader or instrumenter
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read module {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Instrumentation failed for {path}: {reason}")]
    InstrumentFailed { path: PathBuf, reason: String },

    #[error("Cannot register compiler {0}")]
    CompilerUnavailable(String),
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),
}

/// Broad classification of a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunErrorKind {
    /// Bad caller input (unknown report format, bad compiler spec)
    Input,
    /// File-matching collaborator failure
    Discovery,
    /// Unreadable, invalid or malformed raw coverage
    Parse,
    /// Report writing failure
    Report,
}

/// Fatal pipeline errors, surfaced once per run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid report request: {0}")]
    InvalidFormat(#[source] ReportError),

    #[error("Invalid compiler specification '{0}', expected 'ext:module'")]
    InvalidCompiler(String),

    #[error("Compiler registration failed: {0}")]
    CompilerRegistration(#[source] LoadError),

    #[error("Coverage discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to read raw coverage {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in raw coverage {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed raw coverage {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: CoverageError,
    },

    #[error("Report generation failed: {0}")]
    Report(#[source] ReportError),
}

impl RunError {
    /// Classify the error
    pub fn kind(&self) -> RunErrorKind {
        match self {
            RunError::InvalidFormat(_)
            | RunError::InvalidCompiler(_)
            | RunError::CompilerRegistration(_) => RunErrorKind::Input,
            RunError::Discovery(_) => RunErrorKind::Discovery,
            RunError::ReadFailed { .. }
            | RunError::InvalidJson { .. }
            | RunError::Malformed { .. } => RunErrorKind::Parse,
            RunError::Report(_) => RunErrorKind::Report,
        }
    }

    /// True when the failure was caused by the caller's request rather than an internal fault
    pub fn is_input_error(&self) -> bool {
        self.kind() == RunErrorKind::Input
    }
}
