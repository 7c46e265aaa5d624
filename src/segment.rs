//! Loadable segments and their regions.

use anyhow::Result;

use crate::error::ManifestError;
use crate::flags::MemAttr;
use crate::image::ProgramSegment;
use crate::region::{merge_sections, Region};
use crate::utils::PAGE_SIZE;

/// A `PT_LOAD` segment reduced to the regions the loader has to map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Index in the program header table.
    pub index: usize,
    pub load_address: u64,
    /// Whether the segment's GNU property note enables BTI.
    pub bti: bool,
    pub regions: Vec<Region>,
}

impl Segment {
    /// Builds the region list of a loadable segment.
    ///
    /// Fails if the segment is not aligned to the page size.
    pub fn new(segment: &ProgramSegment) -> Result<Self> {
        if segment.align != PAGE_SIZE {
            return Err(ManifestError::Misaligned {
                index: segment.index,
                vaddr: segment.vaddr,
                align: segment.align,
            }
            .into());
        }

        let attributes = MemAttr::from_p_flags(segment.flags);
        let mut regions = merge_sections(attributes, &segment.sections);

        // Guarded pages only apply to code.
        let bti = segment.note.as_ref().is_some_and(|note| note.is_bti_enabled());
        if bti {
            for region in &mut regions {
                region.set_bti_if_executable();
            }
        }

        tracing::debug!(
            "Segment {} at 0x{:x}: {} sections, {} regions, attributes {}, bti {}",
            segment.index,
            segment.vaddr,
            segment.sections.len(),
            regions.len(),
            attributes,
            bti
        );

        Ok(Self {
            index: segment.index,
            load_address: segment.vaddr,
            bti,
            regions,
        })
    }
}
