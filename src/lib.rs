//! ELF segments to memory region manifest.
//!
//! This library turns the loadable segments of an ELF image into the memory
//! region description a secure partition loader consumes.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `error`: Fatal conditions of the region model.
//! - `image`: Reading loadable segments and their sections.
//! - `note`: GNU property notes (BTI detection).
//! - `flags`: Region attribute and load flag sets.
//! - `region`: Merging sections into regions.
//! - `segment`: Per-segment region lists.
//! - `writer`: Manifest text output.
//! - `utils`: Page size arithmetic.
//! - `manifest`: The whole pipeline.

pub mod config;
pub mod error;
pub mod flags;
pub mod image;
pub mod manifest;
pub mod note;
pub mod region;
pub mod segment;
pub mod utils;
pub mod writer;

pub use error::ManifestError;
pub use manifest::{convert, Manifest};
