//! Command-line argument definitions for the amlgraph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input document, whether to rebuild
//! its store, the configuration file, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the amlgraph importer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input AML file
    #[arg(help = "Path to the input AML file")]
    pub input: String,

    /// Rebuild the store even if it already exists
    #[arg(short, long)]
    pub force: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the entity counts of the store as TOML
    #[arg(long)]
    pub stats: bool,
}
