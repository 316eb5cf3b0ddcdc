//! Per-file coverage: normalization of raw records and element-wise merging.

use super::schema::{BranchMapping, ElementId, FnMapping, Range, RawFileCoverage};
use crate::utils::error::CoverageError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Instrumentation metadata plus observed hit counts for one file.
///
/// Invariant: `statement_map`/`s`, `fn_map`/`f` and `branch_map`/`b`
/// always carry identical id sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub path: String,
    pub statement_map: BTreeMap<ElementId, Range>,
    pub fn_map: BTreeMap<ElementId, FnMapping>,
    pub branch_map: BTreeMap<ElementId, BranchMapping>,
    pub s: BTreeMap<ElementId, u64>,
    pub f: BTreeMap<ElementId, u64>,
    pub b: BTreeMap<ElementId, Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_source_map: Option<serde_json::Value>,
}

impl FileCoverage {
    /// Empty coverage for `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Normalize a raw record into a consistent `FileCoverage`.
    ///
    /// Ids with a location but no count get a zero count. Counts whose
    /// location map is missing entirely get placeholder locations. Counts
    /// referencing an id absent from a present location map are rejected.
    ///
    /// # Errors
    /// * `CoverageError::MissingLocation` - count without a location
    pub fn from_raw(key: &str, raw: RawFileCoverage) -> Result<Self, CoverageError> {
        let path = raw
            .path
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| key.to_string());

        let (statement_map, s) = reconcile(
            &path,
            "statement",
            raw.statement_map,
            raw.s.unwrap_or_default(),
            |_, _| Range::unknown(),
            |_| 0,
        )?;

        let (fn_map, f) = reconcile(
            &path,
            "function",
            raw.fn_map,
            raw.f.unwrap_or_default(),
            |id, _| FnMapping::unknown(id),
            |_| 0,
        )?;

        let (branch_map, mut b) = reconcile(
            &path,
            "branch",
            raw.branch_map,
            raw.b.unwrap_or_default(),
            |_, hits: &Vec<u64>| BranchMapping::unknown(hits.len()),
            |meta: &BranchMapping| vec![0; meta.locations.len()],
        )?;

        for (id, hits) in b.iter_mut() {
            let alternatives = branch_map[id].locations.len();
            if hits.len() < alternatives {
                hits.resize(alternatives, 0);
            }
        }

        Ok(Self {
            path,
            statement_map,
            fn_map,
            branch_map,
            s,
            f,
            b,
            input_source_map: raw.input_source_map,
        })
    }

    /// Merge another record for the same file into this one.
    ///
    /// Counts add, saturating at `u64::MAX` (branch vectors element-wise,
    /// zero-padding the shorter).
    /// When both sides carry a real location for an id, the incoming one wins.
    pub fn merge(&mut self, other: &FileCoverage) {
        for (id, loc) in &other.statement_map {
            merge_location(&mut self.statement_map, *id, loc, Range::is_unknown);
        }
        for (id, meta) in &other.fn_map {
            merge_location(&mut self.fn_map, *id, meta, FnMapping::is_unknown);
        }
        for (id, meta) in &other.branch_map {
            merge_location(&mut self.branch_map, *id, meta, BranchMapping::is_unknown);
        }

        for (id, hits) in &other.s {
            let slot = self.s.entry(*id).or_insert(0);
            *slot = slot.saturating_add(*hits);
        }
        for (id, hits) in &other.f {
            let slot = self.f.entry(*id).or_insert(0);
            *slot = slot.saturating_add(*hits);
        }
        for (id, hits) in &other.b {
            add_branch_hits(self.b.entry(*id).or_default(), hits);
        }

        if other.input_source_map.is_some() {
            self.input_source_map = other.input_source_map.clone();
        }
    }

    /// Hit count per line: the highest statement count starting on that line
    pub fn line_coverage(&self) -> BTreeMap<u32, u64> {
        let mut lines = BTreeMap::new();
        for (id, loc) in &self.statement_map {
            if loc.is_unknown() {
                continue;
            }
            let hits = self.s.get(id).copied().unwrap_or(0);
            let entry = lines.entry(loc.start.line).or_insert(hits);
            if *entry < hits {
                *entry = hits;
            }
        }
        lines
    }

    /// Lines that have statements but were never executed
    pub fn uncovered_lines(&self) -> Vec<u32> {
        self.line_coverage()
            .into_iter()
            .filter(|(_, hits)| *hits == 0)
            .map(|(line, _)| line)
            .collect()
    }
}

/// Add `incoming` branch hits into `target`, zero-padding whichever is shorter
pub fn add_branch_hits(target: &mut Vec<u64>, incoming: &[u64]) {
    if target.len() < incoming.len() {
        target.resize(incoming.len(), 0);
    }
    for (slot, hits) in target.iter_mut().zip(incoming) {
        *slot = slot.saturating_add(*hits);
    }
}

fn merge_location<T: Clone>(
    target: &mut BTreeMap<ElementId, T>,
    id: ElementId,
    incoming: &T,
    is_unknown: impl Fn(&T) -> bool,
) {
    match target.entry(id) {
        Entry::Vacant(slot) => {
            slot.insert(incoming.clone());
        }
        Entry::Occupied(mut slot) => {
            if !is_unknown(incoming) {
                slot.insert(incoming.clone());
            }
        }
    }
}

/// Make a location map and its count map agree on the id set
fn reconcile<L, C>(
    path: &str,
    kind: &'static str,
    locations: Option<BTreeMap<ElementId, L>>,
    mut counts: BTreeMap<ElementId, C>,
    placeholder: impl Fn(ElementId, &C) -> L,
    zero: impl Fn(&L) -> C,
) -> Result<(BTreeMap<ElementId, L>, BTreeMap<ElementId, C>), CoverageError> {
    let locations = match locations {
        Some(locations) => {
            if let Some(id) = counts.keys().find(|id| !locations.contains_key(id)) {
                return Err(CoverageError::MissingLocation {
                    path: path.to_string(),
                    kind,
                    id: *id,
                });
            }
            locations
        }
        None => {
            if !counts.is_empty() {
                debug!(
                    "{}: no {} locations, synthesizing {} placeholders",
                    path,
                    kind,
                    counts.len()
                );
            }
            counts
                .iter()
                .map(|(id, hits)| (*id, placeholder(*id, hits)))
                .collect()
        }
    };

    for (id, loc) in &locations {
        counts.entry(*id).or_insert_with(|| zero(loc));
    }

    Ok((locations, counts))
}
