//! Builder for coverage of one original file.
//!
//! Elements are keyed by location: two elements landing on the same
//! original location collapse into one and their hits are summed. Ids are
//! handed out sequentially in insertion order. Placeholder locations never
//! collapse.

use crate::coverage::{add_branch_hits, BranchMapping, ElementId, FileCoverage, FnMapping, Range};
use std::collections::HashMap;

#[derive(Debug)]
pub struct MappedCoverage {
    coverage: FileCoverage,
    statements: HashMap<Range, ElementId>,
    functions: HashMap<Range, ElementId>,
    branches: HashMap<Vec<Range>, ElementId>,
}

impl MappedCoverage {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            coverage: FileCoverage::new(path),
            statements: HashMap::new(),
            functions: HashMap::new(),
            branches: HashMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.coverage.path
    }

    pub fn add_statement(&mut self, loc: Range, hits: u64) -> ElementId {
        let id = match self.statements.get(&loc) {
            Some(id) => *id,
            None => {
                let id = self.coverage.statement_map.len() as ElementId;
                self.coverage.statement_map.insert(id, loc);
                self.coverage.s.insert(id, 0);
                if !loc.is_unknown() {
                    self.statements.insert(loc, id);
                }
                id
            }
        };
        let slot = self.coverage.s.entry(id).or_insert(0);
        *slot = slot.saturating_add(hits);
        id
    }

    /// Functions collapse on their declaration location; the first name seen is kept
    pub fn add_function(&mut self, name: &str, decl: Range, loc: Range, hits: u64) -> ElementId {
        let id = match self.functions.get(&decl) {
            Some(id) => *id,
            None => {
                let id = self.coverage.fn_map.len() as ElementId;
                self.coverage.fn_map.insert(
                    id,
                    FnMapping {
                        name: name.to_string(),
                        decl,
                        loc,
                        line: decl.start.line,
                    },
                );
                self.coverage.f.insert(id, 0);
                if !decl.is_unknown() {
                    self.functions.insert(decl, id);
                }
                id
            }
        };
        let slot = self.coverage.f.entry(id).or_insert(0);
        *slot = slot.saturating_add(hits);
        id
    }

    /// Branches collapse when every alternative lands on the same locations
    pub fn add_branch(
        &mut self,
        kind: &str,
        loc: Range,
        locations: Vec<Range>,
        hits: &[u64],
    ) -> ElementId {
        let id = match self.branches.get(&locations) {
            Some(id) => *id,
            None => {
                let id = self.coverage.branch_map.len() as ElementId;
                let placeholder = locations.iter().all(Range::is_unknown);
                self.coverage.b.insert(id, vec![0; locations.len()]);
                if !placeholder {
                    self.branches.insert(locations.clone(), id);
                }
                self.coverage.branch_map.insert(
                    id,
                    BranchMapping {
                        loc,
                        kind: kind.to_string(),
                        locations,
                        line: loc.start.line,
                    },
                );
                id
            }
        };
        add_branch_hits(self.coverage.b.entry(id).or_default(), hits);
        id
    }

    /// Re-add every element of `fc` at its own location
    pub fn absorb(&mut self, fc: &FileCoverage) {
        for (id, loc) in &fc.statement_map {
            self.add_statement(*loc, fc.s.get(id).copied().unwrap_or(0));
        }
        for (id, meta) in &fc.fn_map {
            self.add_function(
                &meta.name,
                meta.decl,
                meta.loc,
                fc.f.get(id).copied().unwrap_or(0),
            );
        }
        for (id, meta) in &fc.branch_map {
            let hits = fc.b.get(id).map(Vec::as_slice).unwrap_or(&[]);
            self.add_branch(&meta.kind, meta.loc, meta.locations.clone(), hits);
        }
    }

    pub fn into_file_coverage(self) -> FileCoverage {
        self.coverage
    }
}
