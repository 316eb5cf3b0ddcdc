//! Reading raw coverage files from disk into one merged model.

use crate::coverage::{CoverageMap, RawCoverage};
use crate::utils::error::RunError;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Read and parse one raw coverage file
///
/// # Errors
/// * `RunError::ReadFailed` - the file cannot be read
/// * `RunError::InvalidJson` - the contents are not a raw coverage object
pub fn read_raw_coverage(path: impl AsRef<Path>) -> Result<RawCoverage, RunError> {
    let path = path.as_ref();
    debug!("Reading raw coverage from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|source| RunError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| RunError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse every file, then merge them all into one model
///
/// Every file is parsed before anything is merged, so a single corrupt file
/// aborts ingestion without producing a partial model.
///
/// # Errors
/// * `RunError::ReadFailed` / `RunError::InvalidJson` - from `read_raw_coverage`
/// * `RunError::Malformed` - a record references ids it has no location for
pub fn ingest_files(paths: &[PathBuf]) -> Result<CoverageMap, RunError> {
    let records = paths
        .iter()
        .map(|path| read_raw_coverage(path).map(|raw| (path, raw)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut model = CoverageMap::new();
    for (path, raw) in records {
        model
            .merge_raw(raw)
            .map_err(|source| RunError::Malformed {
                path: path.clone(),
                source,
            })?;
    }

    info!(
        "Merged {} raw coverage files covering {} source files",
        paths.len(),
        model.len()
    );
    Ok(model)
}
