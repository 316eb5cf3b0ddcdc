//! Remapping of coverage from instrumented coordinates to original sources.
//!
//! Files without a usable source map pass through untouched. Files with one
//! are rebuilt element by element: each location is resolved through the map
//! and the element lands in the coverage of whichever original file it
//! resolves into. Elements that cannot be resolved keep their instrumented
//! location and path.

pub mod finder;
pub mod mapped;

pub use finder::{FsSourceReader, SourceFinder, SourceReader};
pub use mapped::MappedCoverage;

use crate::coverage::{CoverageMap, FileCoverage, Position, Range};
use crate::source_map::{Bias, OriginalPosition, SourceMap, SourceMapStore};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::Path;

/// Reconciled coverage plus access to the original source text
#[derive(Debug)]
pub struct TransformedCoverage {
    pub map: CoverageMap,
    pub source_finder: SourceFinder,
}

/// Remap `model` through `store`, reading original sources from disk on demand
pub fn transform_coverage(model: &CoverageMap, store: &mut SourceMapStore) -> TransformedCoverage {
    transform_coverage_with(model, store, SourceFinder::new())
}

/// Remap `model` through `store`, registering embedded source content with `finder`
pub fn transform_coverage_with(
    model: &CoverageMap,
    store: &mut SourceMapStore,
    mut finder: SourceFinder,
) -> TransformedCoverage {
    let mut mapped: BTreeMap<String, MappedCoverage> = BTreeMap::new();
    let mut passthrough: Vec<&FileCoverage> = Vec::new();
    let mut remapped_files = 0;

    for (path, fc) in model.iter() {
        let embedded;
        let map = match store.map_for(Path::new(path)) {
            Ok(Some(map)) => Some(map),
            Ok(None) => match embedded_map(fc) {
                Some(map) => {
                    embedded = map;
                    Some(&embedded)
                }
                None => None,
            },
            Err(e) => {
                warn!("Reporting {} unmapped, its source map failed to load: {}", path, e);
                None
            }
        };

        match map {
            Some(map) => {
                for (source, content) in map.embedded_sources() {
                    finder.add_embedded(source, content);
                }
                remap_file(fc, map, &mut mapped);
                remapped_files += 1;
            }
            None => passthrough.push(fc),
        }
    }

    let mut output = CoverageMap::new();
    for fc in passthrough {
        match mapped.get_mut(&fc.path) {
            Some(destination) => {
                debug!("Folding unmapped {} into remapped coverage", fc.path);
                destination.absorb(fc);
            }
            None => output.add_file_coverage(fc.clone()),
        }
    }
    for (_, file) in mapped {
        output.add_file_coverage(file.into_file_coverage());
    }

    info!(
        "Remapped {} of {} files through source maps ({} files after remapping)",
        remapped_files,
        model.len(),
        output.len()
    );

    TransformedCoverage {
        map: output,
        source_finder: finder,
    }
}

fn embedded_map(fc: &FileCoverage) -> Option<SourceMap> {
    let value = fc.input_source_map.clone()?;
    let base_dir = Path::new(&fc.path)
        .parent()
        .unwrap_or_else(|| Path::new(""));

    match SourceMap::from_value(value, base_dir) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!("Ignoring embedded source map of {}: {}", fc.path, e);
            None
        }
    }
}

fn destination<'a>(
    mapped: &'a mut BTreeMap<String, MappedCoverage>,
    path: &str,
) -> &'a mut MappedCoverage {
    mapped
        .entry(path.to_string())
        .or_insert_with(|| MappedCoverage::new(path))
}

fn remap_file(fc: &FileCoverage, map: &SourceMap, mapped: &mut BTreeMap<String, MappedCoverage>) {
    for (id, loc) in &fc.statement_map {
        let hits = fc.s.get(id).copied().unwrap_or(0);
        match map_range(map, loc) {
            Some((source, range)) => destination(mapped, &source).add_statement(range, hits),
            None => destination(mapped, &fc.path).add_statement(*loc, hits),
        };
    }

    for (id, meta) in &fc.fn_map {
        let hits = fc.f.get(id).copied().unwrap_or(0);
        match (map_range(map, &meta.decl), map_range(map, &meta.loc)) {
            (Some((decl_source, decl)), Some((loc_source, loc))) if decl_source == loc_source => {
                destination(mapped, &decl_source).add_function(&meta.name, decl, loc, hits)
            }
            _ => destination(mapped, &fc.path).add_function(&meta.name, meta.decl, meta.loc, hits),
        };
    }

    for (id, meta) in &fc.branch_map {
        let hits = fc.b.get(id).map(Vec::as_slice).unwrap_or(&[]);
        match map_alternatives(map, &meta.locations) {
            Some((source, locations)) => {
                let loc = match map_range(map, &meta.loc) {
                    Some((loc_source, loc)) if loc_source == source => loc,
                    _ => locations[0],
                };
                destination(mapped, &source).add_branch(&meta.kind, loc, locations, hits)
            }
            None => destination(mapped, &fc.path).add_branch(
                &meta.kind,
                meta.loc,
                meta.locations.clone(),
                hits,
            ),
        };
    }
}

/// Every real alternative must resolve, and into the same original file.
/// Placeholder alternatives (the missing `else` of an `if`) stay placeholders.
fn map_alternatives(map: &SourceMap, locations: &[Range]) -> Option<(String, Vec<Range>)> {
    let mut source: Option<String> = None;
    let mut mapped = Vec::with_capacity(locations.len());

    for loc in locations {
        if loc.is_unknown() {
            mapped.push(*loc);
            continue;
        }
        let (loc_source, range) = map_range(map, loc)?;
        match &source {
            Some(existing) if *existing != loc_source => return None,
            Some(_) => {}
            None => source = Some(loc_source),
        }
        mapped.push(range);
    }

    source.map(|source| (source, mapped))
}

/// Resolve both ends of an instrumented range into one original file
fn map_range(map: &SourceMap, loc: &Range) -> Option<(String, Range)> {
    if loc.is_unknown() {
        return None;
    }

    let start = map.lookup(loc.start.line, loc.start.column)?;
    let mut end = map.lookup(loc.end.line, loc.end.column)?;
    if start.source != end.source {
        return None;
    }

    // A range whose ends collapse onto one point ends just before the next mapping
    if start == end {
        if let Some(upper) =
            map.original_position_for(loc.end.line, loc.end.column, Bias::LeastUpperBound)
        {
            if upper.source == start.source && upper.column > 0 {
                end = OriginalPosition {
                    column: upper.column - 1,
                    ..upper
                };
            }
        }
    }

    let start_pos = Position::new(start.line, start.column);
    let mut end_pos = Position::new(end.line, end.column);
    if end_pos < start_pos {
        end_pos = start_pos;
    }

    Some((start.source, Range::new(start_pos, end_pos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{BranchMapping, FnMapping};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn statements(path: &str, entries: &[(Range, u64)]) -> FileCoverage {
        let mut fc = FileCoverage::new(path);
        for (id, (loc, hits)) in entries.iter().enumerate() {
            fc.statement_map.insert(id as u32, *loc);
            fc.s.insert(id as u32, *hits);
        }
        fc
    }

    fn register(store: &mut SourceMapStore, file: &str, value: serde_json::Value) {
        let map = SourceMap::from_value(value, Path::new("/project/dist")).unwrap();
        store.register_map(file, map);
    }

    fn finder() -> SourceFinder {
        SourceFinder::new()
    }

    #[test]
    fn test_files_without_maps_pass_through_unchanged() {
        let mut fc = statements("/project/a.js", &[(range(1, 0, 9), 2), (range(2, 0, 4), 0)]);
        fc.fn_map.insert(
            0,
            FnMapping {
                name: "main".to_string(),
                decl: range(1, 9, 13),
                loc: range(1, 0, 30),
                line: 1,
            },
        );
        fc.f.insert(0, 1);
        fc.branch_map.insert(
            0,
            BranchMapping {
                loc: range(2, 0, 4),
                kind: "if".to_string(),
                locations: vec![range(2, 0, 4), range(2, 0, 4)],
                line: 2,
            },
        );
        fc.b.insert(0, vec![1, 0]);

        let model: CoverageMap = vec![fc.clone()].into_iter().collect();
        let result = transform_coverage_with(&model, &mut SourceMapStore::new(), finder());

        assert_eq!(result.map, model);
        assert_eq!(result.map.file_coverage_for("/project/a.js"), Some(&fc));
    }

    #[test]
    fn test_coordinate_collapse_sums_counts() {
        let mut store = SourceMapStore::new();
        // Both generated lines map to a.ts 1:0
        register(
            &mut store,
            "/project/dist/a.js",
            json!({ "version": 3, "sources": ["../src/a.ts"], "mappings": "AAAA;AAAA" }),
        );

        let model: CoverageMap = vec![statements(
            "/project/dist/a.js",
            &[(range(1, 0, 5), 3), (range(2, 0, 5), 4)],
        )]
        .into_iter()
        .collect();

        let result = transform_coverage_with(&model, &mut store, finder());
        assert_eq!(result.map.files().collect::<Vec<_>>(), vec!["/project/src/a.ts"]);

        let fc = result.map.file_coverage_for("/project/src/a.ts").unwrap();
        assert_eq!(fc.statement_map.len(), 1);
        assert_eq!(fc.s[&0], 7);
    }

    #[test]
    fn test_elements_relocate_per_original_file() {
        let mut store = SourceMapStore::new();
        // Line 1 -> a.ts 1:0, line 2 -> b.ts 1:0, line 3 unmapped
        register(
            &mut store,
            "/project/dist/bundle.js",
            json!({
                "version": 3,
                "sources": ["../src/a.ts", "../src/b.ts"],
                "mappings": "AAAA;ACAA;"
            }),
        );

        let bundle = statements(
            "/project/dist/bundle.js",
            &[(range(1, 0, 5), 1), (range(2, 0, 5), 2), (range(3, 0, 5), 3)],
        );
        let already_original = statements("/project/src/a.ts", &[(range(1, 0, 0), 10)]);
        let model: CoverageMap = vec![bundle, already_original].into_iter().collect();

        let result = transform_coverage_with(&model, &mut store, finder());
        assert_eq!(
            result.map.files().collect::<Vec<_>>(),
            vec!["/project/dist/bundle.js", "/project/src/a.ts", "/project/src/b.ts"]
        );

        // The unmapped statement keeps its instrumented location
        let bundle = result.map.file_coverage_for("/project/dist/bundle.js").unwrap();
        assert_eq!(bundle.statement_map[&0], range(3, 0, 5));
        assert_eq!(bundle.s[&0], 3);

        // Pass-through coverage for a.ts folds into the remapped entry by location
        let a = result.map.file_coverage_for("/project/src/a.ts").unwrap();
        assert_eq!(a.statement_map.len(), 1);
        assert_eq!(a.s[&0], 11);

        let b = result.map.file_coverage_for("/project/src/b.ts").unwrap();
        assert_eq!(b.s[&0], 2);
    }

    #[test]
    fn test_branch_spanning_files_stays_instrumented() {
        let mut store = SourceMapStore::new();
        register(
            &mut store,
            "/project/dist/bundle.js",
            json!({
                "version": 3,
                "sources": ["../src/a.ts", "../src/b.ts"],
                "mappings": "AAAA;ACAA"
            }),
        );

        let mut fc = FileCoverage::new("/project/dist/bundle.js");
        fc.branch_map.insert(
            0,
            BranchMapping {
                loc: range(1, 0, 5),
                kind: "cond-expr".to_string(),
                locations: vec![range(1, 0, 5), range(2, 0, 5)],
                line: 1,
            },
        );
        fc.b.insert(0, vec![4, 1]);
        let model: CoverageMap = vec![fc].into_iter().collect();

        let result = transform_coverage_with(&model, &mut store, finder());
        let bundle = result.map.file_coverage_for("/project/dist/bundle.js").unwrap();
        assert_eq!(bundle.branch_map[&0].locations, vec![range(1, 0, 5), range(2, 0, 5)]);
        assert_eq!(bundle.b[&0], vec![4, 1]);
    }

    #[test]
    fn test_if_without_else_remaps_with_placeholder_arm() {
        let mut store = SourceMapStore::new();
        register(
            &mut store,
            "/project/dist/a.js",
            json!({ "version": 3, "sources": ["../src/a.ts"], "mappings": "AAAA" }),
        );

        let mut fc = FileCoverage::new("/project/dist/a.js");
        fc.branch_map.insert(
            0,
            BranchMapping {
                loc: range(1, 0, 5),
                kind: "if".to_string(),
                locations: vec![range(1, 0, 5), Range::unknown()],
                line: 1,
            },
        );
        fc.b.insert(0, vec![4, 1]);
        let model: CoverageMap = vec![fc].into_iter().collect();

        let result = transform_coverage_with(&model, &mut store, finder());
        assert_eq!(result.map.files().collect::<Vec<_>>(), vec!["/project/src/a.ts"]);

        let a = result.map.file_coverage_for("/project/src/a.ts").unwrap();
        assert_eq!(a.branch_map[&0].kind, "if");
        assert_eq!(a.branch_map[&0].locations.len(), 2);
        assert!(!a.branch_map[&0].locations[0].is_unknown());
        assert!(a.branch_map[&0].locations[1].is_unknown());
        assert_eq!(a.b[&0], vec![4, 1]);
    }

    #[test]
    fn test_broken_map_passes_file_through() {
        let mut store = SourceMapStore::new();
        store.register_url("/project/dist/a.js", "does-not-exist.js.map");

        let fc = statements("/project/dist/a.js", &[(range(1, 0, 5), 2)]);
        let model: CoverageMap = vec![fc.clone()].into_iter().collect();

        let result = transform_coverage_with(&model, &mut store, finder());
        assert_eq!(result.map.file_coverage_for("/project/dist/a.js"), Some(&fc));
    }

    #[test]
    fn test_embedded_input_source_map_and_sources_content() {
        let mut fc = statements("/project/dist/a.js", &[(range(1, 0, 5), 1)]);
        fc.fn_map.insert(
            0,
            FnMapping {
                name: "f".to_string(),
                decl: range(1, 0, 5),
                loc: range(1, 0, 5),
                line: 1,
            },
        );
        fc.f.insert(0, 6);
        fc.input_source_map = Some(json!({
            "version": 3,
            "sources": ["../src/a.ts"],
            "sourcesContent": ["export const a = 1;"],
            "mappings": "AAAA"
        }));
        let model: CoverageMap = vec![fc].into_iter().collect();

        let result = transform_coverage_with(&model, &mut SourceMapStore::new(), finder());
        let a = result.map.file_coverage_for("/project/src/a.ts").unwrap();
        assert_eq!(a.f[&0], 6);
        assert_eq!(a.fn_map[&0].name, "f");
        assert_eq!(
            result
                .source_finder
                .find(Path::new("/project/src/a.ts"))
                .unwrap(),
            "export const a = 1;"
        );
    }

    #[test]
    fn test_collapsed_end_uses_next_mapping() {
        // Line 1: col 0 -> a.ts 1:0, col 10 -> a.ts 1:8
        let map = SourceMap::from_value(
            json!({ "version": 3, "sources": ["a.ts"], "mappings": "AAAA,UAAQ" }),
            Path::new("/src"),
        )
        .unwrap();

        let (source, mapped) = map_range(&map, &range(1, 0, 4)).unwrap();
        assert_eq!(source, "/src/a.ts");
        assert_eq!(mapped, range(1, 0, 7));

        assert!(map_range(&map, &Range::unknown()).is_none());
    }
}
