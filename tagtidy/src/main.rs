//! tagtidy - Main entry point
//!
//! A small program to tidy music files. It recursively explores a
//! given directory and standardises folder structures, file naming
//! conventions and ID3 tags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagtidy::pipeline;
use tagtidy_common::{Config, WriteMode};

/// Command-line arguments for tagtidy
#[derive(Parser, Debug)]
#[command(name = "tagtidy")]
#[command(about = "Standardises music folder structures, file names and ID3 tags")]
#[command(version)]
struct Args {
    /// Directory to recursively search for music files in
    directory: PathBuf,

    /// Write changes to disk. Default is to do a dry run (no file changes)
    #[arg(short = 'f', long = "write")]
    write: bool,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Directory to build the organized collection in
    #[arg(short, long, env = "TAGTIDY_OUTPUT")]
    output: Option<PathBuf>,

    /// Path to a config file (default: ./tagtidy.toml if present)
    #[arg(long, env = "TAGTIDY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "tagtidy=debug"
    } else {
        "tagtidy=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let mode = if args.write {
        WriteMode::Commit
    } else {
        WriteMode::DryRun
    };
    let output = args.output.unwrap_or_else(|| {
        let mut name = args.directory.file_name().unwrap_or_default().to_os_string();
        name.push("_tagtidy");
        args.directory.with_file_name(name)
    });

    info!("Organizing {}", args.directory.display());
    info!("Output tree: {}", output.display());
    if mode == WriteMode::DryRun {
        info!("Dry run: pass -f to write changes");
    }

    let summary = pipeline::run(&args.directory, &output, &config, mode)
        .context("Organizing run failed")?;

    info!(
        files = summary.files_found,
        skipped = summary.files_skipped,
        duplicates = summary.duplicates_removed,
        warnings = summary.warnings,
        moves = summary.moves_planned,
        written = summary.files_written,
        "run complete"
    );
    Ok(())
}
