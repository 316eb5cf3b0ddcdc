//! Coverage totals and percentages.
//!
//! Summaries follow the usual coverage conventions: a metric with nothing to
//! cover counts as 100% covered, and percentages are floored to two decimals
//! so partial coverage never displays as 100%.

use crate::coverage::{CoverageMap, FileCoverage};
use log::debug;
use serde::{Deserialize, Serialize};

/// Total/covered counts for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total: u64,
    pub covered: u64,
    pub skipped: u64,
    pub pct: f64,
}

impl Totals {
    pub fn new(total: u64, covered: u64) -> Self {
        Self {
            total,
            covered,
            skipped: 0,
            pct: percent(covered, total),
        }
    }

    /// Add another set of totals into this one
    pub fn merge(&mut self, other: &Totals) {
        self.total += other.total;
        self.covered += other.covered;
        self.skipped += other.skipped;
        self.pct = percent(self.covered, self.total);
    }
}

impl Default for Totals {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    ((covered as f64 * 10_000.0) / total as f64).floor() / 100.0
}

/// Line, statement, function and branch totals
///
/// **Public** - computed per file and for the whole model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub lines: Totals,
    pub statements: Totals,
    pub functions: Totals,
    pub branches: Totals,
}

impl CoverageSummary {
    pub fn merge(&mut self, other: &CoverageSummary) {
        self.lines.merge(&other.lines);
        self.statements.merge(&other.statements);
        self.functions.merge(&other.functions);
        self.branches.merge(&other.branches);
    }

    /// The four metrics with their display names, in report order
    pub fn metrics(&self) -> [(&'static str, &Totals); 4] {
        [
            ("Statements", &self.statements),
            ("Branches", &self.branches),
            ("Functions", &self.functions),
            ("Lines", &self.lines),
        ]
    }
}

/// Summarize one file
pub fn summarize_file(fc: &FileCoverage) -> CoverageSummary {
    let lines = fc.line_coverage();
    let branch_hits = fc.b.values().flatten();

    CoverageSummary {
        lines: Totals::new(
            lines.len() as u64,
            lines.values().filter(|hits| **hits > 0).count() as u64,
        ),
        statements: Totals::new(
            fc.s.len() as u64,
            fc.s.values().filter(|hits| **hits > 0).count() as u64,
        ),
        functions: Totals::new(
            fc.f.len() as u64,
            fc.f.values().filter(|hits| **hits > 0).count() as u64,
        ),
        branches: Totals::new(
            branch_hits.clone().count() as u64,
            branch_hits.filter(|hits| **hits > 0).count() as u64,
        ),
    }
}

/// Summarize every file in the model
///
/// # Returns
/// Overall totals plus a (path, summary) entry per file, sorted by path
pub fn summarize_map(map: &CoverageMap) -> (CoverageSummary, Vec<(String, CoverageSummary)>) {
    let mut overall = CoverageSummary::default();
    let per_file: Vec<(String, CoverageSummary)> = map
        .iter()
        .map(|(path, fc)| {
            let summary = summarize_file(fc);
            overall.merge(&summary);
            (path.to_string(), summary)
        })
        .collect();

    debug!(
        "Summarized {} files: {:.2}% statements covered",
        per_file.len(),
        overall.statements.pct
    );
    (overall, per_file)
}

/// Where a percentage falls relative to the configured watermarks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watermark {
    Low,
    Medium,
    High,
}

impl Watermark {
    /// `watermarks` is `[low, high]` in percent
    pub fn classify(pct: f64, watermarks: [f64; 2]) -> Self {
        if pct < watermarks[0] {
            Watermark::Low
        } else if pct >= watermarks[1] {
            Watermark::High
        } else {
            Watermark::Medium
        }
    }
}
