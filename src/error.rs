//! Fatal conditions detected while building the region model.
//!
//! Parser and I/O failures are not wrapped here; they travel through
//! `anyhow` with context attached at the call site.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// A loadable segment is not aligned to the page size. Usually the
    /// linker script is wrong.
    Misaligned { index: usize, vaddr: u64, align: u64 },
    /// The image has no `PT_LOAD` program headers.
    NoLoadSegments,
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Misaligned { index, vaddr, align } => write!(
                f,
                "segment {} at 0x{:x} has alignment 0x{:x}, segments must be 4k aligned, check LD script",
                index, vaddr, align
            ),
            ManifestError::NoLoadSegments => write!(f, "no loadable segments found in ELF image"),
        }
    }
}

impl std::error::Error for ManifestError {}
