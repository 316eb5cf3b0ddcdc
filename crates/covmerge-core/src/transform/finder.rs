//! Lookup of original source text for report consumers.
//!
//! Content embedded in source maps (`sourcesContent`) is served first;
//! anything else is read through a `SourceReader` on first request and cached.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads source text for a path
pub trait SourceReader {
    fn read_source(&self, path: &Path) -> io::Result<String>;
}

/// Reads sources from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read_source(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Source text by original file path
pub struct SourceFinder {
    embedded: HashMap<PathBuf, String>,
    cache: RefCell<HashMap<PathBuf, String>>,
    reader: Box<dyn SourceReader>,
}

impl SourceFinder {
    /// Finder backed by the filesystem
    pub fn new() -> Self {
        Self::with_reader(Box::new(FsSourceReader))
    }

    pub fn with_reader(reader: Box<dyn SourceReader>) -> Self {
        Self {
            embedded: HashMap::new(),
            cache: RefCell::new(HashMap::new()),
            reader,
        }
    }

    /// Register content shipped inside a source map
    pub fn add_embedded(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.embedded.entry(path.into()).or_insert_with(|| content.into());
    }

    pub fn has_embedded(&self, path: &Path) -> bool {
        self.embedded.contains_key(path)
    }

    /// Source text for `path`
    ///
    /// # Errors
    /// * the reader's I/O error when the text is neither embedded nor readable
    pub fn find(&self, path: &Path) -> io::Result<String> {
        if let Some(content) = self.embedded.get(path) {
            return Ok(content.clone());
        }
        if let Some(content) = self.cache.borrow().get(path) {
            return Ok(content.clone());
        }

        let content = self.reader.read_source(path)?;
        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), content.clone());
        Ok(content)
    }
}

impl Default for SourceFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFinder")
            .field("embedded", &self.embedded.len())
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}
