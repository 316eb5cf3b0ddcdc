//! The coverage model: one `FileCoverage` per distinct file path.

use super::file::FileCoverage;
use super::schema::RawCoverage;
use crate::utils::error::CoverageError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Coverage for many files, keyed by path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverageMap {
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageMap {
    /// Empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and merge a raw record (path -> file coverage)
    ///
    /// Files land under their own `path`, falling back to the record key.
    /// Nothing is merged if any file in the record is malformed.
    ///
    /// # Errors
    /// * `CoverageError::MissingLocation` - a count references an unknown id
    pub fn merge_raw(&mut self, raw: RawCoverage) -> Result<(), CoverageError> {
        let normalized = raw
            .into_iter()
            .map(|(key, file)| FileCoverage::from_raw(&key, file))
            .collect::<Result<Vec<_>, _>>()?;

        for fc in normalized {
            self.add_file_coverage(fc);
        }
        Ok(())
    }

    /// Merge another model; overlapping paths merge, disjoint paths union
    pub fn merge(&mut self, other: &CoverageMap) {
        for (key, fc) in &other.files {
            match self.files.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(fc.clone());
                }
                Entry::Occupied(mut slot) => slot.get_mut().merge(fc),
            }
        }
    }

    /// Add one file, merging with any coverage already held for its path
    pub fn add_file_coverage(&mut self, fc: FileCoverage) {
        match self.files.entry(fc.path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(fc);
            }
            Entry::Occupied(mut slot) => slot.get_mut().merge(&fc),
        }
    }

    /// Coverage for `path`, if present
    pub fn file_coverage_for(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    /// All file paths, sorted
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileCoverage)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Keep only the files for which `keep` returns true
    pub fn filter(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.files.retain(|path, _| keep(path));
    }
}

impl IntoIterator for CoverageMap {
    type Item = (String, FileCoverage);
    type IntoIter = std::collections::btree_map::IntoIter<String, FileCoverage>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl FromIterator<FileCoverage> for CoverageMap {
    fn from_iter<I: IntoIterator<Item = FileCoverage>>(iter: I) -> Self {
        let mut map = CoverageMap::new();
        for fc in iter {
            map.add_file_coverage(fc);
        }
        map
    }
}
