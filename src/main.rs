//! Entry point for segmanifest.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Set up `tracing` output on stderr.
//! 3. Convert the ELF image into a manifest.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use segmanifest::config::Config;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    segmanifest::convert(&config.input, &config.output)
}
