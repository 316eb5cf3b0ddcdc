//! covmerge CLI
//!
//! Merges raw coverage files, remaps them to original sources and writes
//! coverage reports.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::{Path, PathBuf};

use covmerge_core::commands::{
    display_version, execute_merge, execute_report, validate_coverage_file, MergeArgs, ReportArgs,
};
use covmerge_core::utils::config::{resolve_config, DEFAULT_INCLUDE};

/// covmerge - coverage aggregation and source map reconciliation
#[derive(Parser, Debug)]
#[command(name = "covmerge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to .covmerge.toml in the working directory)
    #[arg(short, long, global = true, env = "COVMERGE_CONFIG")]
    config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge raw coverage, remap it through source maps and write reports
    Report {
        /// Report formats (json, json-summary, lcovonly, text-summary)
        formats: Vec<String>,

        /// Directory searched for raw coverage files
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Glob selecting raw coverage files under the root
        #[arg(short, long, default_value = DEFAULT_INCLUDE)]
        include: String,

        /// Compiler registration as ext:module (repeatable)
        #[arg(long = "compiler", value_name = "EXT:MODULE")]
        compilers: Vec<String>,

        /// Report output directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Merge raw coverage files into one JSON file without remapping
    Merge {
        /// Directory searched for raw coverage files
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Glob selecting raw coverage files under the root
        #[arg(short, long, default_value = DEFAULT_INCLUDE)]
        include: String,

        /// Output path for the merged JSON
        #[arg(short, long, default_value = "coverage/coverage-merged.json")]
        output: PathBuf,
    },

    /// Validate a raw coverage JSON file
    Validate {
        /// Path to raw coverage JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

/// `verbose = true` in the config file also turns on debug logging
fn config_wants_verbose(explicit: Option<&Path>) -> bool {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| resolve_config(explicit, &cwd).ok())
        .is_some_and(|config| config.verbose)
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let verbose = cli.verbose || config_wants_verbose(cli.config.as_deref());
    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Report {
            formats,
            root,
            include,
            compilers,
            dir,
        } => {
            let args = ReportArgs {
                formats,
                root,
                include,
                compilers,
                dir,
                config: cli.config,
            };
            execute_report(args)?;
        }

        Commands::Merge {
            root,
            include,
            output,
        } => {
            execute_merge(MergeArgs {
                root,
                include,
                output,
            })?;
        }

        Commands::Validate { file } => {
            validate_coverage_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
