//! The `run` entry point: validate, discover, ingest, remap, report.

use super::options::RunOptions;
use crate::aggregator::ingest_files;
use crate::coverage::CoverageMap;
use crate::discovery::{FileMatcher, GlobMatcher};
use crate::hook::{FsModuleLoader, Instrumenter, LoaderHook, ModuleLoader, SourceMappingUrlScanner};
use crate::output::{Report, Reporter};
use crate::source_map::SourceMapStore;
use crate::transform::{transform_coverage_with, FsSourceReader, SourceFinder, SourceReader};
use crate::utils::config::Config;
use crate::utils::error::RunError;
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};

/// External collaborators a run depends on
pub struct Collaborators {
    pub matcher: Box<dyn FileMatcher>,
    pub loader: Box<dyn ModuleLoader>,
    /// Built from the instrumentation config when unset
    pub instrumenter: Option<Box<dyn Instrumenter>>,
    pub source_reader: Box<dyn SourceReader>,
    /// Extra reports rendered after the requested formats
    pub extra_reports: Vec<Box<dyn Report>>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            matcher: Box::new(GlobMatcher::new()),
            loader: Box::new(FsModuleLoader::new()),
            instrumenter: None,
            source_reader: Box::new(FsSourceReader),
            extra_reports: Vec::new(),
        }
    }
}

/// What a successful run produced
#[derive(Debug)]
pub struct RunOutcome {
    /// Raw coverage files that were merged
    pub inputs: Vec<PathBuf>,
    /// The reconciled coverage handed to the reports
    pub coverage: CoverageMap,
    /// Formats written, in order
    pub reports: Vec<String>,
}

/// Run the whole pipeline once.
///
/// An empty `formats` list falls back to the configured reports. Every
/// failure aborts the run except source map problems (the file is reported
/// unmapped) and forced-load failures (the file keeps its coverage).
///
/// # Errors
/// * `RunErrorKind::Input` - unknown report format or bad compiler registration
/// * `RunErrorKind::Discovery` - raw coverage files could not be listed
/// * `RunErrorKind::Parse` - a raw coverage file is unreadable, invalid or malformed
/// * `RunErrorKind::Report` - a report could not be written
pub fn run(
    formats: &[String],
    config: &Config,
    opts: &RunOptions,
    collaborators: Collaborators,
) -> Result<RunOutcome, RunError> {
    let Collaborators {
        matcher,
        mut loader,
        instrumenter,
        source_reader,
        extra_reports,
    } = collaborators;

    // 1. Report formats
    let formats = if formats.is_empty() {
        config.reporting.reports()
    } else {
        formats.to_vec()
    };
    let mut reporter = Reporter::new(&config.reporting);
    reporter.add_all(&formats).map_err(RunError::InvalidFormat)?;
    for report in extra_reports {
        reporter.add_report(report);
    }

    // 2. Compilers and the loader hook
    let mut store = SourceMapStore::new();
    let mut hook = register_compilers(config, opts, loader.as_mut(), instrumenter)?;

    // 3. Discovery
    let root = opts.resolve_root()?;
    info!("Searching {} for {}", root.display(), opts.include);
    let inputs = matcher.files_for(&root, &[opts.include.clone()])?;

    // 4-5. Ingest and merge
    let model = ingest_files(&inputs)?;

    // 6. Force-load files nothing loaded during the test run
    if let Some(hook) = hook.as_mut() {
        force_load(&model, loader.as_mut(), hook, &mut store);
    }

    // 7. Remap
    let transformed =
        transform_coverage_with(&model, &mut store, SourceFinder::with_reader(source_reader));

    // 8. Reports
    reporter
        .write(&transformed.map, &transformed.source_finder)
        .map_err(RunError::Report)?;

    Ok(RunOutcome {
        inputs,
        reports: reporter.formats().into_iter().map(String::from).collect(),
        coverage: transformed.map,
    })
}

/// Run the pipeline and report the result to `callback` exactly once
pub fn run_with_callback(
    formats: &[String],
    config: &Config,
    opts: &RunOptions,
    collaborators: Collaborators,
    callback: impl FnOnce(Option<RunError>),
) {
    match run(formats, config, opts, collaborators) {
        Ok(outcome) => {
            debug!("Run finished: {} reports written", outcome.reports.len());
            callback(None)
        }
        Err(e) => callback(Some(e)),
    }
}

fn register_compilers(
    config: &Config,
    opts: &RunOptions,
    loader: &mut dyn ModuleLoader,
    instrumenter: Option<Box<dyn Instrumenter>>,
) -> Result<Option<LoaderHook>, RunError> {
    if opts.compilers.is_empty() {
        return Ok(None);
    }

    let cwd = env::current_dir().unwrap_or_default();
    let specs = opts.compiler_specs(&cwd)?;
    for spec in &specs {
        loader
            .register_compiler(spec)
            .map_err(RunError::CompilerRegistration)?;
    }

    let instrumenter = instrumenter.unwrap_or_else(|| {
        Box::new(SourceMappingUrlScanner::new(
            config.instrumentation.instrumenter_opts(),
        )) as Box<dyn Instrumenter>
    });
    let compiled = specs.into_iter().map(|spec| spec.extension).collect();

    Ok(Some(
        LoaderHook::new(compiled, instrumenter)
            .with_extensions(config.instrumentation.extensions())
            .with_verbose(config.verbose),
    ))
}

fn force_load(
    model: &CoverageMap,
    loader: &mut dyn ModuleLoader,
    hook: &mut LoaderHook,
    store: &mut SourceMapStore,
) {
    for path in model.files() {
        let path = Path::new(path);
        if hook.was_loaded(path) {
            continue;
        }
        if let Err(e) = loader.load_module(path, hook, store) {
            warn!("Could not load {}: {}", path.display(), e);
        }
    }
}
