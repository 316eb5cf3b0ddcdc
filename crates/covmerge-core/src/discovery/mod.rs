//! Discovery of raw coverage files under a root directory.

use crate::utils::config::DEFAULT_EXCLUDES;
use crate::utils::error::DiscoveryError;
use glob::{MatchOptions, Pattern};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Finds files under a root that match include patterns
pub trait FileMatcher {
    /// Matching files, sorted
    ///
    /// # Errors
    /// * `DiscoveryError` - bad pattern, missing root or unreadable directory
    fn files_for(&self, root: &Path, includes: &[String]) -> Result<Vec<PathBuf>, DiscoveryError>;
}

/// Walks the directory tree and matches relative paths against glob patterns
#[derive(Debug, Clone)]
pub struct GlobMatcher {
    excludes: Vec<String>,
}

impl GlobMatcher {
    pub fn new() -> Self {
        Self {
            excludes: DEFAULT_EXCLUDES.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }
}

impl Default for GlobMatcher {
    fn default() -> Self {
        Self::new()
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}

/// A directory is pruned when the excludes swallow everything beneath it
fn excludes_dir(excludes: &[Pattern], relative: &str) -> bool {
    let child = format!("{}/.covmerge-child", relative);
    excludes.iter().any(|p| p.matches_with(&child, MATCH_OPTIONS))
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, DiscoveryError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(DiscoveryError::from))
        .collect()
}

impl FileMatcher for GlobMatcher {
    fn files_for(&self, root: &Path, includes: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
        if !root.is_dir() {
            return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
        }

        let includes = compile(includes)?;
        let excludes = compile(&self.excludes)?;

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match relative_path(entry.path(), root) {
                    Some(relative) => !excludes_dir(&excludes, &relative),
                    None => true,
                }
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    warn!("Skipping symlink loop: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(relative) = relative_path(entry.path(), root) else {
                continue;
            };

            let included = includes
                .iter()
                .any(|p| p.matches_with(&relative, MATCH_OPTIONS));
            let excluded = excludes
                .iter()
                .any(|p| p.matches_with(&relative, MATCH_OPTIONS));

            if included && !excluded {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!(
            "Found {} files matching {:?} under {}",
            files.len(),
            includes.iter().map(Pattern::as_str).collect::<Vec<_>>(),
            root.display()
        );
        Ok(files)
    }
}
