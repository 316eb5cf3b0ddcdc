//! Summary reports: `json-summary` (`coverage-summary.json`) and `text-summary` (stdout).

use super::{write_report_file, Report, ReportContext};
use crate::aggregator::metrics::{summarize_map, CoverageSummary, Watermark};
use crate::coverage::CoverageMap;
use crate::utils::error::ReportError;
use colored::Colorize;
use std::collections::BTreeMap;

/// File written by the `json-summary` report
pub const COVERAGE_SUMMARY_FILE: &str = "coverage-summary.json";

/// `json-summary`: totals per file plus a `total` entry
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSummaryReport;

impl Report for JsonSummaryReport {
    fn name(&self) -> &str {
        "json-summary"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<(), ReportError> {
        let (overall, per_file) = summarize_map(ctx.map);

        let mut entries: BTreeMap<String, CoverageSummary> = per_file.into_iter().collect();
        entries.insert("total".to_string(), overall);

        write_report_file(&ctx.dir.join(COVERAGE_SUMMARY_FILE), |writer| {
            serde_json::to_writer(writer, &entries)?;
            Ok(())
        })
    }
}

/// `text-summary`: overall percentages printed to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSummaryReport;

impl Report for TextSummaryReport {
    fn name(&self) -> &str {
        "text-summary"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<(), ReportError> {
        print!("{}", render_text_summary(ctx.map, ctx.watermarks));
        Ok(())
    }
}

/// Render the overall summary block, each metric colored by its watermark
pub fn render_text_summary(map: &CoverageMap, watermarks: [f64; 2]) -> String {
    let (overall, _) = summarize_map(map);

    let mut out = String::new();
    out.push('\n');
    out.push_str(&banner(" Coverage summary "));
    out.push('\n');

    for (label, totals) in overall.metrics() {
        let line = format!(
            "{:<13}: {}% ( {}/{} )",
            label, totals.pct, totals.covered, totals.total
        );
        let line = match Watermark::classify(totals.pct, watermarks) {
            Watermark::Low => line.red(),
            Watermark::Medium => line.yellow(),
            Watermark::High => line.green(),
        };
        out.push_str(&line.to_string());
        out.push('\n');
    }

    out.push_str(&"=".repeat(80));
    out.push('\n');
    out
}

fn banner(title: &str) -> String {
    let fill = 80usize.saturating_sub(title.len());
    let left = fill / 2;
    format!("{}{}{}", "=".repeat(left), title, "=".repeat(fill - left))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::RawCoverage;
    use crate::transform::SourceFinder;
    use serde_json::json;

    fn map() -> CoverageMap {
        let raw: RawCoverage = serde_json::from_value(json!({
            "/src/a.js": {
                "statementMap": {
                    "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 5 } },
                    "1": { "start": { "line": 2, "column": 0 }, "end": { "line": 2, "column": 5 } }
                },
                "s": { "0": 1, "1": 0 }
            }
        }))
        .unwrap();
        let mut map = CoverageMap::new();
        map.merge_raw(raw).unwrap();
        map
    }

    #[test]
    fn test_text_summary_lines() {
        colored::control::set_override(false);
        let text = render_text_summary(&map(), [50.0, 80.0]);

        assert!(text.contains("Statements   : 50% ( 1/2 )"));
        assert!(text.contains("Branches     : 100% ( 0/0 )"));
        assert!(text.contains("Lines        : 50% ( 1/2 )"));
        assert!(text.lines().any(|l| l.len() == 80 && l.contains(" Coverage summary ")));
    }

    #[test]
    fn test_json_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let map = map();
        let finder = SourceFinder::new();
        let ctx = ReportContext {
            map: &map,
            source_finder: &finder,
            dir: dir.path(),
            watermarks: [50.0, 80.0],
        };

        JsonSummaryReport.write(&ctx).unwrap();

        let text = std::fs::read_to_string(dir.path().join(COVERAGE_SUMMARY_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["total"]["statements"]["total"], 2);
        assert_eq!(value["total"]["statements"]["pct"], 50.0);
        assert_eq!(value["/src/a.js"]["lines"]["covered"], 1);
    }
}
