//! CLI logic for the amlgraph importer.
//!
//! This module contains the core CLI logic: load the configuration, import
//! the AML document when needed, and open its store.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{io, path::Path};

use log::info;
use serde::Serialize;

use amlgraph::{AmlError, Importer, graph::Stats};

/// Entity counts of a store, printed with `--stats`.
#[derive(Debug, Serialize)]
struct StatsReport<'a> {
    store: &'a Path,
    entities: Stats,
}

/// Run the amlgraph CLI application
///
/// This function imports the input document into its store when the store
/// is missing or `--force` is given, then opens the store.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `AmlError` for:
/// - A missing input file
/// - Configuration loading errors
/// - Parsing errors
/// - Storage errors
pub fn run(args: &Args) -> Result<(), AmlError> {
    info!(
        input_path = args.input,
        force = args.force;
        "Processing AML export"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let importer = Importer::new(app_config);
    let repository = importer.open(&args.input, args.force)?;

    info!(store_path = repository.path().display().to_string(); "Store ready");

    if args.stats {
        let report = StatsReport {
            store: repository.path(),
            entities: repository.stats()?,
        };
        print!("{}", render_stats(&report)?);
    }

    Ok(())
}

fn render_stats(report: &StatsReport<'_>) -> Result<String, AmlError> {
    toml::to_string(report).map_err(|err| AmlError::Io(io::Error::other(err)))
}
