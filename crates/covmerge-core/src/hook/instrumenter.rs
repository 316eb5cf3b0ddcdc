//! Instrumentation strategy and its source map side channel.

use crate::source_map::SourceMapStore;
use crate::utils::config::InstrumenterOptions;
use crate::utils::error::LoadError;
use log::debug;
use std::path::Path;

/// Receives the source map URL of each instrumented file
pub trait SourceMapSink {
    fn record_source_map(&mut self, file: &Path, url: &str);
}

impl SourceMapSink for SourceMapStore {
    fn record_source_map(&mut self, file: &Path, url: &str) {
        self.register_url(file, url);
    }
}

/// Turns source text into instrumented text
pub trait Instrumenter {
    /// Instrument `code` loaded from `file`, reporting any source map URL to `sink`
    ///
    /// # Errors
    /// * `LoadError::InstrumentFailed` - the code cannot be instrumented
    fn instrument(
        &mut self,
        code: &str,
        file: &Path,
        sink: &mut dyn SourceMapSink,
    ) -> Result<String, LoadError>;
}

/// Pass-through instrumenter that only harvests `sourceMappingURL` comments.
///
/// Compiled files already carry their counters; what the pipeline still
/// needs from them is where their source maps live.
#[derive(Debug, Clone)]
pub struct SourceMappingUrlScanner {
    opts: InstrumenterOptions,
}

impl SourceMappingUrlScanner {
    pub fn new(opts: InstrumenterOptions) -> Self {
        Self { opts }
    }
}

impl Instrumenter for SourceMappingUrlScanner {
    fn instrument(
        &mut self,
        code: &str,
        file: &Path,
        sink: &mut dyn SourceMapSink,
    ) -> Result<String, LoadError> {
        if self.opts.produce_source_map {
            if let Some(url) = find_source_mapping_url(code) {
                debug!("{} declares source map {}", file.display(), truncate(url));
                sink.record_source_map(file, url);
            }
        }
        Ok(code.to_string())
    }
}

/// The last `sourceMappingURL` comment in `code`, if any
pub fn find_source_mapping_url(code: &str) -> Option<&str> {
    code.lines().rev().find_map(|line| {
        let line = line.trim();
        let body = line
            .strip_prefix("//#")
            .or_else(|| line.strip_prefix("//@"))
            .or_else(|| {
                line.strip_prefix("/*#")
                    .or_else(|| line.strip_prefix("/*@"))
                    .and_then(|rest| rest.strip_suffix("*/"))
            })?;
        let url = body.trim().strip_prefix("sourceMappingURL=")?.trim();
        (!url.is_empty()).then_some(url)
    })
}

fn truncate(url: &str) -> &str {
    if url.starts_with("data:") {
        url.split(',').next().unwrap_or(url)
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorded(Vec<(PathBuf, String)>);

    impl SourceMapSink for Recorded {
        fn record_source_map(&mut self, file: &Path, url: &str) {
            self.0.push((file.to_path_buf(), url.to_string()));
        }
    }

    #[test]
    fn test_find_source_mapping_url() {
        assert_eq!(
            find_source_mapping_url("var a;\n//# sourceMappingURL=a.js.map\n"),
            Some("a.js.map")
        );
        assert_eq!(
            find_source_mapping_url("var a;\n//@ sourceMappingURL=old.map"),
            Some("old.map")
        );
        assert_eq!(
            find_source_mapping_url("a {}\n/*# sourceMappingURL=a.css.map */"),
            Some("a.css.map")
        );
        assert_eq!(find_source_mapping_url("var a; // sourceMappingURL=x"), None);
        assert_eq!(find_source_mapping_url("//# sourceMappingURL="), None);
    }

    #[test]
    fn test_last_comment_wins() {
        let code = "//# sourceMappingURL=first.map\nvar a;\n//# sourceMappingURL=second.map";
        assert_eq!(find_source_mapping_url(code), Some("second.map"));
    }

    #[test]
    fn test_scanner_records_and_passes_code_through() {
        let mut scanner = SourceMappingUrlScanner::new(InstrumenterOptions::default());
        let mut sink = Recorded::default();
        let code = "var a = 1;\n//# sourceMappingURL=a.js.map";

        let out = scanner
            .instrument(code, Path::new("/dist/a.js"), &mut sink)
            .unwrap();

        assert_eq!(out, code);
        assert_eq!(
            sink.0,
            vec![(PathBuf::from("/dist/a.js"), "a.js.map".to_string())]
        );
    }

    #[test]
    fn test_scanner_respects_produce_source_map() {
        let mut scanner = SourceMappingUrlScanner::new(InstrumenterOptions {
            produce_source_map: false,
        });
        let mut sink = Recorded::default();
        scanner
            .instrument("//# sourceMappingURL=a.js.map", Path::new("a.js"), &mut sink)
            .unwrap();
        assert!(sink.0.is_empty());
    }

    #[test]
    fn test_store_is_a_sink() {
        let mut store = SourceMapStore::new();
        store.record_source_map(Path::new("/dist/a.js"), "a.js.map");
        assert!(store.has_map(Path::new("/dist/a.js")));
    }
}
