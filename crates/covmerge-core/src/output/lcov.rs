//! lcov tracefile output (`lcov.info`).

use super::{write_report_file, Report, ReportContext};
use crate::coverage::{CoverageMap, FileCoverage};
use crate::utils::error::ReportError;
use std::io::{self, Write};

/// File written by the `lcovonly` report
pub const LCOV_FILE: &str = "lcov.info";

/// `lcovonly`: one lcov record per file
#[derive(Debug, Clone, Copy, Default)]
pub struct LcovReport;

impl Report for LcovReport {
    fn name(&self) -> &str {
        "lcovonly"
    }

    fn write(&self, ctx: &ReportContext<'_>) -> Result<(), ReportError> {
        write_report_file(&ctx.dir.join(LCOV_FILE), |writer| {
            render_lcov(ctx.map, writer)?;
            Ok(())
        })
    }
}

/// Write every file of `map` as an lcov record.
///
/// Elements with placeholder locations have no line to report and are left out.
pub fn render_lcov(map: &CoverageMap, out: &mut impl Write) -> io::Result<()> {
    for (path, fc) in map.iter() {
        writeln!(out, "TN:")?;
        writeln!(out, "SF:{}", path)?;
        write_functions(fc, out)?;
        write_lines(fc, out)?;
        write_branches(fc, out)?;
        writeln!(out, "end_of_record")?;
    }
    Ok(())
}

fn write_functions(fc: &FileCoverage, out: &mut impl Write) -> io::Result<()> {
    let functions: Vec<_> = fc
        .fn_map
        .iter()
        .filter(|(_, meta)| !meta.is_unknown())
        .map(|(id, meta)| (meta, fc.f.get(id).copied().unwrap_or(0)))
        .collect();

    for (meta, _) in &functions {
        writeln!(out, "FN:{},{}", meta.decl.start.line, meta.name)?;
    }
    for (meta, hits) in &functions {
        writeln!(out, "FNDA:{},{}", hits, meta.name)?;
    }
    writeln!(out, "FNF:{}", functions.len())?;
    writeln!(
        out,
        "FNH:{}",
        functions.iter().filter(|(_, hits)| *hits > 0).count()
    )
}

fn write_lines(fc: &FileCoverage, out: &mut impl Write) -> io::Result<()> {
    let lines = fc.line_coverage();
    for (line, hits) in &lines {
        writeln!(out, "DA:{},{}", line, hits)?;
    }
    writeln!(out, "LF:{}", lines.len())?;
    writeln!(out, "LH:{}", lines.values().filter(|hits| **hits > 0).count())
}

fn write_branches(fc: &FileCoverage, out: &mut impl Write) -> io::Result<()> {
    let mut found = 0;
    let mut hit = 0;

    for (id, meta) in &fc.branch_map {
        if meta.is_unknown() {
            continue;
        }
        let line = if meta.loc.is_unknown() {
            meta.line
        } else {
            meta.loc.start.line
        };

        let hits = fc.b.get(id).map(Vec::as_slice).unwrap_or(&[]);
        for (alternative, taken) in hits.iter().enumerate() {
            writeln!(out, "BRDA:{},{},{},{}", line, id, alternative, taken)?;
            found += 1;
            if *taken > 0 {
                hit += 1;
            }
        }
    }

    writeln!(out, "BRF:{}", found)?;
    writeln!(out, "BRH:{}", hit)
}
