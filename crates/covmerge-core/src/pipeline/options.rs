//! Options recognized by a pipeline run.

use crate::utils::config::DEFAULT_INCLUDE;
use crate::utils::error::{DiscoveryError, RunError};
use std::env;
use std::path::{Path, PathBuf};

/// A compiler registration, written `ext:module`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSpec {
    /// Extension without the leading dot
    pub extension: String,
    /// Module specifier; relative (`./x`) specifiers are anchored at the working directory
    pub module: String,
}

impl CompilerSpec {
    /// Parse `ext:module`
    ///
    /// # Errors
    /// * `RunError::InvalidCompiler` - missing separator, extension or module
    pub fn parse(spec: &str, cwd: &Path) -> Result<Self, RunError> {
        let (extension, module) = spec
            .split_once(':')
            .ok_or_else(|| RunError::InvalidCompiler(spec.to_string()))?;

        let extension = extension.trim().trim_start_matches('.');
        let module = module.trim();
        if extension.is_empty() || module.is_empty() {
            return Err(RunError::InvalidCompiler(spec.to_string()));
        }

        let module = if module.starts_with('.') {
            cwd.join(module).to_string_lossy().into_owned()
        } else {
            module.to_string()
        };

        Ok(Self {
            extension: extension.to_string(),
            module,
        })
    }
}

/// Per-run options
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Glob selecting raw coverage files under `root`
    pub include: String,
    /// Directory searched for raw coverage; the working directory when unset
    pub root: Option<PathBuf>,
    /// Compiler registrations (`ext:module`)
    pub compilers: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE.to_string(),
            root: None,
            compilers: Vec::new(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = include.into();
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_compilers(mut self, compilers: Vec<String>) -> Self {
        self.compilers = compilers;
        self
    }

    /// The search root, defaulting to the working directory
    pub fn resolve_root(&self) -> Result<PathBuf, DiscoveryError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => env::current_dir().map_err(DiscoveryError::CurrentDir),
        }
    }

    /// Parse every compiler registration against `cwd`
    pub fn compiler_specs(&self, cwd: &Path) -> Result<Vec<CompilerSpec>, RunError> {
        self.compilers
            .iter()
            .map(|spec| CompilerSpec::parse(spec, cwd))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RunOptions::default();
        assert_eq!(opts.include, "**/coverage*.raw.json");
        assert!(opts.root.is_none());
        assert!(opts.compilers.is_empty());
    }

    #[test]
    fn test_explicit_root() {
        let opts = RunOptions::new().with_root("/tmp/project");
        assert_eq!(opts.resolve_root().unwrap(), PathBuf::from("/tmp/project"));
    }

    #[test]
    fn test_parse_compiler_spec() {
        let cwd = Path::new("/work");

        let bare = CompilerSpec::parse("ts:ts-node/register", cwd).unwrap();
        assert_eq!(bare.extension, "ts");
        assert_eq!(bare.module, "ts-node/register");

        let relative = CompilerSpec::parse(".es6:./tools/register.js", cwd).unwrap();
        assert_eq!(relative.extension, "es6");
        assert_eq!(relative.module, "/work/./tools/register.js");
    }

    #[test]
    fn test_invalid_compiler_specs_are_input_errors() {
        for spec in ["ts", ":mod", "ts:", ""] {
            let err = CompilerSpec::parse(spec, Path::new("/")).unwrap_err();
            assert!(err.is_input_error(), "{spec} should be rejected");
        }
    }
}
