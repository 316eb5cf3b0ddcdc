//! Loader hook strategy used to force-load compiled files.
//!
//! Loading a compiled file runs it through the configured instrumenter,
//! which reports the file's source map URL to the run's `SourceMapStore`.

pub mod instrumenter;
pub mod loader;

pub use instrumenter::{find_source_mapping_url, Instrumenter, SourceMapSink, SourceMappingUrlScanner};
pub use loader::{FsModuleLoader, LoaderHook, ModuleLoader};
