//! Configuration module.
//!
//! Command-line interface of the tool, parsed with `clap`.

use clap::Parser;
use std::path::PathBuf;

/// Extracts the memory regions of an ELF image into a partition manifest.
///
/// Each run of sections with matching load flags inside a loadable segment
/// becomes one region block describing its offset, size, access attributes
/// and load flags.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// ELF image to read
    #[arg(value_name = "ELF")]
    pub input: PathBuf,

    /// Manifest file to write
    #[arg(value_name = "MANIFEST")]
    pub output: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", help = "Set the logging level")]
    pub log_level: String,
}
