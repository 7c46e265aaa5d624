//! Manifest generation.
//!
//! This module ties the pipeline together:
//! 1. Read the loadable segments of the ELF image.
//! 2. Build the region list of each segment (alignment check, merge, BTI).
//! 3. Compute the load base address.
//! 4. Render all regions and write the manifest file.

use anyhow::{Context, Result};
use std::path::Path;

use crate::error::ManifestError;
use crate::image::ElfImage;
use crate::segment::Segment;
use crate::writer;

/// The region layout of a whole image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub segments: Vec<Segment>,
    /// Lowest load address of all loadable segments. Region offsets are
    /// relative to it.
    pub load_base_addr: u64,
}

impl Manifest {
    pub fn from_image(image: &ElfImage) -> Result<Self> {
        let segments = image
            .segments
            .iter()
            .map(Segment::new)
            .collect::<Result<Vec<_>>>()?;

        let load_base_addr = segments
            .iter()
            .map(|s| s.load_address)
            .min()
            .ok_or(ManifestError::NoLoadSegments)?;

        Ok(Self { segments, load_base_addr })
    }

    pub fn region_count(&self) -> usize {
        self.segments.iter().map(|s| s.regions.len()).sum()
    }

    /// Renders the manifest text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writer::write_segments(&mut out, &self.segments, self.load_base_addr);
        out
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("failed to write manifest {}", path.display()))
    }
}

/// Reads the ELF image at `input` and writes its memory region manifest to
/// `output`. Nothing is written if any step fails.
pub fn convert(input: &Path, output: &Path) -> Result<()> {
    let image = ElfImage::open(input)?;
    let manifest = Manifest::from_image(&image)
        .with_context(|| format!("failed to build regions of {}", input.display()))?;
    manifest.write(output)?;

    tracing::info!(
        "Wrote {} regions from {} segments ({} with BTI) to {} (load base 0x{:x})",
        manifest.region_count(),
        manifest.segments.len(),
        manifest.segments.iter().filter(|s| s.bti).count(),
        output.display(),
        manifest.load_base_addr
    );
    Ok(())
}
