//! Source map decoding and the per-run source map registry.

pub mod mapping;
pub mod store;
pub mod vlq;

pub use mapping::{normalize_path, Bias, OriginalPosition, SourceMap};
pub use store::{decode_data_url, SourceMapStore};
