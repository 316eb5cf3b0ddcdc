//! Module loading strategy and the extension-matching loader hook.
//!
//! The hook is an explicit object handed to a `ModuleLoader` rather than a
//! global interception table, so independent runs never share one.

use super::instrumenter::{Instrumenter, SourceMapSink};
use crate::pipeline::options::CompilerSpec;
use crate::utils::error::LoadError;
use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

fn extension_of(file: &Path) -> Option<&str> {
    file.extension().and_then(|e| e.to_str())
}

fn strip_dots(extensions: Vec<String>) -> Vec<String> {
    extensions
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_string())
        .collect()
}

/// Instruments files whose extension belongs to a registered compiler
pub struct LoaderHook {
    compiled: Vec<String>,
    extensions: Vec<String>,
    instrumenter: Box<dyn Instrumenter>,
    verbose: bool,
    loaded: BTreeSet<PathBuf>,
}

impl LoaderHook {
    /// `compiled` are the extensions that get instrumented (leading dots optional)
    pub fn new(compiled: Vec<String>, instrumenter: Box<dyn Instrumenter>) -> Self {
        Self {
            compiled: strip_dots(compiled),
            extensions: Vec::new(),
            instrumenter,
            verbose: false,
            loaded: BTreeSet::new(),
        }
    }

    /// Additional extensions the hook intercepts without instrumenting
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = strip_dots(extensions);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// True when loads of `file` should be instrumented
    pub fn matches(&self, file: &Path) -> bool {
        extension_of(file).is_some_and(|ext| self.compiled.iter().any(|c| c == ext))
    }

    /// True when loads of `file` pass through the hook at all
    pub fn intercepts(&self, file: &Path) -> bool {
        self.matches(file)
            || extension_of(file).is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Run `code` through the instrumenter when `file` matches; otherwise return it untouched
    ///
    /// # Errors
    /// * `LoadError` - the instrumenter failed
    pub fn transform(
        &mut self,
        code: &str,
        file: &Path,
        sink: &mut dyn SourceMapSink,
    ) -> Result<String, LoadError> {
        self.loaded.insert(file.to_path_buf());
        if !self.matches(file) {
            return Ok(code.to_string());
        }

        if self.verbose {
            debug!("Instrumenting {}", file.display());
        }
        self.instrumenter.instrument(code, file, sink)
    }

    /// True once `file` has gone through `transform`
    pub fn was_loaded(&self, file: &Path) -> bool {
        self.loaded.contains(file)
    }

    pub fn loaded(&self) -> impl Iterator<Item = &Path> {
        self.loaded.iter().map(PathBuf::as_path)
    }
}

impl std::fmt::Debug for LoaderHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderHook")
            .field("compiled", &self.compiled)
            .field("extensions", &self.extensions)
            .field("loaded", &self.loaded.len())
            .finish()
    }
}

/// Capability to register compilers and trigger side-effectful module loads
pub trait ModuleLoader {
    /// Make `spec`'s compiler available for its extension
    ///
    /// # Errors
    /// * `LoadError::CompilerUnavailable` - the compiler module cannot be found
    fn register_compiler(&mut self, spec: &CompilerSpec) -> Result<(), LoadError> {
        debug!("Registered compiler {} for .{}", spec.module, spec.extension);
        Ok(())
    }

    /// Load `path`, routing its contents through `hook`
    ///
    /// # Errors
    /// * `LoadError` - the module could not be read or instrumented
    fn load_module(
        &mut self,
        path: &Path,
        hook: &mut LoaderHook,
        sink: &mut dyn SourceMapSink,
    ) -> Result<(), LoadError>;
}

/// Loads modules by reading them from disk and passing them through the hook
#[derive(Debug, Default)]
pub struct FsModuleLoader {
    compilers: Vec<CompilerSpec>,
}

impl FsModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compilers(&self) -> &[CompilerSpec] {
        &self.compilers
    }
}

impl ModuleLoader for FsModuleLoader {
    fn register_compiler(&mut self, spec: &CompilerSpec) -> Result<(), LoadError> {
        // Path-like modules must exist; bare names are left to the runtime
        let module = Path::new(&spec.module);
        if module.is_absolute() && !module.exists() {
            return Err(LoadError::CompilerUnavailable(format!(
                "{} (no such file)",
                spec.module
            )));
        }

        debug!("Registered compiler {} for .{}", spec.module, spec.extension);
        self.compilers.push(spec.clone());
        Ok(())
    }

    fn load_module(
        &mut self,
        path: &Path,
        hook: &mut LoaderHook,
        sink: &mut dyn SourceMapSink,
    ) -> Result<(), LoadError> {
        let code = fs::read_to_string(path).map_err(|source| LoadError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        if !hook.intercepts(path) {
            debug!("Loaded {} without instrumentation", path.display());
            return Ok(());
        }
        hook.transform(&code, path, sink)?;
        Ok(())
    }
}
