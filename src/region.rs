//! Memory regions.
//!
//! A region is a run of consecutive sections of one segment that share the
//! same load flags. It is the unit the loader maps, so it is also the unit
//! written to the manifest.

use crate::flags::{LoadFlags, MemAttr};
use crate::image::SectionInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// First byte of the region (virtual address).
    pub start_address: u64,
    /// One past the last byte of the region.
    pub end_address: u64,
    pub attributes: MemAttr,
    pub load_flags: LoadFlags,
    /// Names of the member sections, in address order.
    pub sections: Vec<String>,
}

impl Region {
    /// Creates a single-section region. Access attributes come from the
    /// owning segment, load flags from the section type.
    pub fn from_section(attributes: MemAttr, section: &SectionInfo) -> Self {
        let mut load_flags = LoadFlags::empty();
        load_flags.set(LoadFlags::NO_BITS, section.no_bits);
        Self {
            start_address: section.address,
            end_address: section.address + section.size,
            attributes,
            load_flags,
            sections: vec![section.name.clone()],
        }
    }

    pub fn is_compatible(&self, other: &Region) -> bool {
        self.load_flags.is_compatible(other.load_flags)
    }

    /// Extends this region up to the end of `other` and takes over its sections.
    /// The end never moves backwards, even if sections are out of address order.
    pub fn append(&mut self, other: Region) {
        self.end_address = self.end_address.max(other.end_address);
        self.sections.extend(other.sections);
    }

    /// Marks executable regions as guarded pages.
    pub fn set_bti_if_executable(&mut self) {
        if self.attributes.contains(MemAttr::X) {
            self.attributes |= MemAttr::GP;
        }
    }

    pub fn len(&self) -> u64 {
        self.end_address.saturating_sub(self.start_address)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Merges consecutive sections with compatible load flags into regions.
pub fn merge_sections(attributes: MemAttr, sections: &[SectionInfo]) -> Vec<Region> {
    let mut regions: Vec<Region> = Vec::new();
    for section in sections {
        let region = Region::from_section(attributes, section);
        match regions.last_mut() {
            Some(current) if current.is_compatible(&region) => current.append(region),
            _ => regions.push(region),
        }
    }
    regions
}
