//! Region attribute and load flag sets.
//!
//! Both sets are written to the manifest as a plain integer followed by a
//! comment listing the set flag names in declaration order.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Memory access attributes of a region, in manifest encoding.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct MemAttr: u32 {
        const R = 0x01;
        const W = 0x02;
        const X = 0x04;
        /// Shareable.
        const S = 0x08;
        /// Guarded page (BTI landing pads enforced).
        const GP = 0x10;
    }
}

bitflags! {
    /// Load flags of a region, in manifest encoding.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct LoadFlags: u32 {
        /// Zero-filled on load, not backed by file content.
        const NO_BITS = 0x01;
    }
}

impl MemAttr {
    /// Builds the access attributes from ELF program header `p_flags`.
    pub fn from_p_flags(p_flags: u32) -> Self {
        let mut attr = MemAttr::empty();
        attr.set(MemAttr::R, p_flags & object::elf::PF_R != 0);
        attr.set(MemAttr::W, p_flags & object::elf::PF_W != 0);
        attr.set(MemAttr::X, p_flags & object::elf::PF_X != 0);
        attr
    }
}

impl LoadFlags {
    /// Two flag sets can share a region when they agree on `NO_BITS`.
    pub fn is_compatible(self, other: LoadFlags) -> bool {
        self.contains(LoadFlags::NO_BITS) == other.contains(LoadFlags::NO_BITS)
    }
}

/// Writes the names of the set flags, comma separated, in declaration order.
fn write_names<'a>(
    f: &mut fmt::Formatter<'_>,
    names: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    for (i, name) in names.enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        f.write_str(name)?;
    }
    Ok(())
}

impl fmt::Display for MemAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.iter_names().map(|(name, _)| name))
    }
}

impl fmt::Display for LoadFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, self.iter_names().map(|(name, _)| name))
    }
}
