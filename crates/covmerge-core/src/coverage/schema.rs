//! JSON schema definitions for raw coverage data.
//!
//! Raw coverage files map a file path to an object with
//! `statementMap`, `fnMap`, `branchMap` and the hit counters `s`, `f`, `b`.
//! Lines are 1-based, columns 0-based.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id of a statement, function or branch, unique within one file
pub type ElementId = u32;

/// A point in a file. An empty object (`{}`) reads as line 0, the placeholder line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A start/end span in a file
///
/// Instrumenters write the missing `else` of an `if` as `{"start":{},"end":{}}`;
/// that and any missing end deserialize to placeholder positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Placeholder for counts that arrived without any location data.
    /// Line 0 never occurs in real coverage.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.start.line == 0
    }
}

/// Location metadata for one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FnMapping {
    pub name: String,
    pub decl: Range,
    pub loc: Range,
    #[serde(default)]
    pub line: u32,
}

impl FnMapping {
    pub fn unknown(id: ElementId) -> Self {
        Self {
            name: format!("(unknown_{})", id),
            decl: Range::unknown(),
            loc: Range::unknown(),
            line: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.decl.is_unknown() && self.loc.is_unknown()
    }
}

/// Location metadata for one branch point and its alternatives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMapping {
    #[serde(default)]
    pub loc: Range,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub locations: Vec<Range>,
    #[serde(default)]
    pub line: u32,
}

impl BranchMapping {
    pub fn unknown(alternatives: usize) -> Self {
        Self {
            loc: Range::unknown(),
            kind: "unknown".to_string(),
            locations: vec![Range::unknown(); alternatives],
            line: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.loc.is_unknown() && self.locations.iter().all(Range::is_unknown)
    }
}

/// One file's coverage as found on disk, before normalization.
///
/// Every field is optional; `FileCoverage::from_raw` repairs what it can.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileCoverage {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub statement_map: Option<BTreeMap<ElementId, Range>>,
    #[serde(default)]
    pub fn_map: Option<BTreeMap<ElementId, FnMapping>>,
    #[serde(default)]
    pub branch_map: Option<BTreeMap<ElementId, BranchMapping>>,
    #[serde(default)]
    pub s: Option<BTreeMap<ElementId, u64>>,
    #[serde(default)]
    pub f: Option<BTreeMap<ElementId, u64>>,
    #[serde(default)]
    pub b: Option<BTreeMap<ElementId, Vec<u64>>>,
    #[serde(default)]
    pub input_source_map: Option<serde_json::Value>,
}

/// A whole raw coverage file: path -> raw file coverage
pub type RawCoverage = BTreeMap<String, RawFileCoverage>;
