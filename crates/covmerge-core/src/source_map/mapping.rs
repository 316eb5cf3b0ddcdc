//! Source map v3 parsing and original-position lookup.
//!
//! Generated lines are 1-based and columns 0-based at this API, the same
//! convention raw coverage uses.

use super::vlq::decode_segment;
use crate::utils::error::SourceMapError;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Which neighbouring mapping to pick when no mapping starts exactly at the column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Closest mapping at or before the column
    GreatestLowerBound,
    /// Closest mapping at or after the column
    LeastUpperBound,
}

/// A resolved position in an original source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPosition {
    pub source: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: u32,
    #[serde(default)]
    source_root: Option<String>,
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    sources_content: Vec<Option<String>>,
    #[serde(default)]
    mappings: String,
    #[serde(default)]
    sections: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    generated_column: u32,
    original: Option<(usize, u32, u32)>,
}

/// A decoded source map
#[derive(Debug, Clone)]
pub struct SourceMap {
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    lines: Vec<Vec<Segment>>,
}

impl SourceMap {
    /// Parse map JSON text; relative sources resolve against `base_dir`
    pub fn from_json(text: &str, base_dir: &Path) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(text)?;
        Self::from_raw(raw, base_dir)
    }

    /// Parse an already-decoded JSON value
    pub fn from_value(value: serde_json::Value, base_dir: &Path) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_value(value)?;
        Self::from_raw(raw, base_dir)
    }

    fn from_raw(raw: RawSourceMap, base_dir: &Path) -> Result<Self, SourceMapError> {
        if raw.sections.is_some() {
            return Err(SourceMapError::IndexedMap);
        }
        if raw.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }

        let root = raw.source_root.as_deref().unwrap_or("");
        let sources = raw
            .sources
            .iter()
            .map(|s| resolve_source(base_dir, root, s.as_deref().unwrap_or("")))
            .collect();

        let lines = decode_mappings(&raw.mappings, raw.sources.len())?;

        Ok(Self {
            sources,
            sources_content: raw.sources_content,
            lines,
        })
    }

    /// Resolved source paths, in map order
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// (source path, embedded content) for every source that ships its content
    pub fn embedded_sources(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources
            .iter()
            .zip(&self.sources_content)
            .filter_map(|(path, content)| content.as_deref().map(|c| (path.as_str(), c)))
    }

    /// Original position for a generated position, or `None` if unmapped
    pub fn original_position_for(
        &self,
        line: u32,
        column: u32,
        bias: Bias,
    ) -> Option<OriginalPosition> {
        let segments = self.lines.get(line.checked_sub(1)? as usize)?;

        let found = match bias {
            Bias::GreatestLowerBound => {
                let idx = segments.partition_point(|s| s.generated_column <= column);
                idx.checked_sub(1).map(|i| segments[i])
            }
            Bias::LeastUpperBound => {
                let idx = segments.partition_point(|s| s.generated_column < column);
                segments.get(idx).copied()
            }
        }?;

        let (source, orig_line, orig_column) = found.original?;
        Some(OriginalPosition {
            source: self.sources.get(source)?.clone(),
            line: orig_line + 1,
            column: orig_column,
        })
    }

    /// Greatest-lower-bound lookup, retried with least-upper-bound on a miss
    pub fn lookup(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        self.original_position_for(line, column, Bias::GreatestLowerBound)
            .or_else(|| self.original_position_for(line, column, Bias::LeastUpperBound))
    }
}

fn decode_mappings(mappings: &str, source_count: usize) -> Result<Vec<Vec<Segment>>, SourceMapError> {
    let mut lines = Vec::new();
    let mut source: i64 = 0;
    let mut orig_line: i64 = 0;
    let mut orig_column: i64 = 0;

    for line_text in mappings.split(';') {
        let mut generated_column: i64 = 0;
        let mut segments = Vec::new();

        for segment_text in line_text.split(',').filter(|s| !s.is_empty()) {
            let fields = decode_segment(segment_text)?;
            generated_column += fields[0];

            let original = match fields.len() {
                1 => None,
                // A fifth field indexes `names`, which lookups never use
                4 | 5 => {
                    source += fields[1];
                    orig_line += fields[2];
                    orig_column += fields[3];
                    if source < 0
                        || source as usize >= source_count
                        || orig_line < 0
                        || orig_column < 0
                    {
                        return Err(SourceMapError::InvalidMappings(format!(
                            "segment '{}' points outside the source list",
                            segment_text
                        )));
                    }
                    Some((source as usize, orig_line as u32, orig_column as u32))
                }
                n => {
                    return Err(SourceMapError::InvalidMappings(format!(
                        "segment '{}' has {} fields",
                        segment_text, n
                    )))
                }
            };

            if generated_column < 0 {
                return Err(SourceMapError::InvalidMappings(format!(
                    "negative generated column in segment '{}'",
                    segment_text
                )));
            }

            segments.push(Segment {
                generated_column: generated_column as u32,
                original,
            });
        }

        segments.sort_by_key(|s| s.generated_column);
        lines.push(segments);
    }

    Ok(lines)
}

/// Join `root` and `source`, then anchor relative results at `base_dir`
fn resolve_source(base_dir: &Path, root: &str, source: &str) -> String {
    let source = source.strip_prefix("file://").unwrap_or(source);
    let joined = if root.is_empty() || Path::new(source).is_absolute() {
        PathBuf::from(source)
    } else {
        Path::new(root.strip_prefix("file://").unwrap_or(root)).join(source)
    };

    let anchored = if joined.is_absolute() {
        joined
    } else {
        base_dir.join(joined)
    };
    normalize_path(&anchored).to_string_lossy().into_owned()
}

/// Lexically remove `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
