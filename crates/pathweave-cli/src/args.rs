//! Command-line argument definitions for the Pathweave CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input document, the output paths,
//! configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Pathweave conversion tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input pathway document (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the exported document
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to write the converted node/edge graph (JSON)
    #[arg(short, long)]
    pub graph: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
