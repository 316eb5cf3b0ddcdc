//! Registry of source maps for instrumented files.
//!
//! Instrumenters register a URL per file while they run; the map behind the
//! URL is only fetched and decoded the first time it is needed. A map that
//! cannot be loaded never aborts a run: callers fall back to the instrumented
//! position.

use super::mapping::{OriginalPosition, SourceMap};
use crate::utils::error::SourceMapError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
enum Registration {
    /// Data URL or path, not fetched yet
    Url(String),
    Loaded(SourceMap),
}

/// Maps instrumented file paths to their source maps
#[derive(Debug, Default)]
pub struct SourceMapStore {
    registrations: HashMap<PathBuf, Registration>,
}

impl SourceMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` has a source map at `url` (data URL or path relative to `file`).
    /// A later registration for the same file replaces the earlier one.
    pub fn register_url(&mut self, file: impl Into<PathBuf>, url: impl Into<String>) {
        let file = file.into();
        let url = url.into();
        debug!("Registered source map URL for {}", file.display());
        self.registrations.insert(file, Registration::Url(url));
    }

    /// Register an already-decoded map for `file`
    pub fn register_map(&mut self, file: impl Into<PathBuf>, map: SourceMap) {
        self.registrations
            .insert(file.into(), Registration::Loaded(map));
    }

    pub fn has_map(&self, file: &Path) -> bool {
        self.registrations.contains_key(file)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// The decoded map for `file`, fetching it on first use.
    ///
    /// Returns `Ok(None)` when nothing is registered for `file`.
    ///
    /// # Errors
    /// * `SourceMapError` - the registered URL could not be read or decoded
    pub fn map_for(&mut self, file: &Path) -> Result<Option<&SourceMap>, SourceMapError> {
        let Some(registration) = self.registrations.get_mut(file) else {
            return Ok(None);
        };

        if let Registration::Url(url) = &*registration {
            let map = load_url(url, file)?;
            *registration = Registration::Loaded(map);
        }

        Ok(match registration {
            Registration::Loaded(map) => Some(&*map),
            Registration::Url(_) => None,
        })
    }

    /// Original position for a position in instrumented `file`.
    ///
    /// `None` when no map is registered, the map fails to load, or the
    /// position is not covered by any mapping.
    pub fn resolve(&mut self, file: &Path, line: u32, column: u32) -> Option<OriginalPosition> {
        match self.map_for(file) {
            Ok(Some(map)) => map.lookup(line, column),
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring source map for {}: {}", file.display(), e);
                None
            }
        }
    }
}

fn parent_dir(file: &Path) -> &Path {
    file.parent().unwrap_or_else(|| Path::new(""))
}

fn load_url(url: &str, file: &Path) -> Result<SourceMap, SourceMapError> {
    if url.starts_with("data:") {
        let text = decode_data_url(url)?;
        return SourceMap::from_json(&text, parent_dir(file));
    }

    let target = Path::new(url.strip_prefix("file://").unwrap_or(url));
    let map_path = if target.is_absolute() {
        target.to_path_buf()
    } else {
        parent_dir(file).join(target)
    };

    debug!("Reading source map {}", map_path.display());
    let text = fs::read_to_string(&map_path).map_err(|source| SourceMapError::ReadFailed {
        path: map_path.clone(),
        source,
    })?;
    SourceMap::from_json(&text, parent_dir(&map_path))
}

/// Decode the payload of a `data:` URL into text
pub fn decode_data_url(url: &str) -> Result<String, SourceMapError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| SourceMapError::InvalidDataUrl("missing 'data:' scheme".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| SourceMapError::InvalidDataUrl("missing ',' separator".to_string()))?;

    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let bytes = STANDARD.decode(payload.trim())?;
        String::from_utf8(bytes).map_err(|e| SourceMapError::InvalidDataUrl(e.to_string()))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(text: &str) -> Result<String, SourceMapError> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| {
                    SourceMapError::InvalidDataUrl(format!("bad percent escape at offset {}", i))
                })?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|e| SourceMapError::InvalidDataUrl(e.to_string()))
}
