//! GNU property notes.
//!
//! A loadable segment may carry a `.note.gnu.property` section. The only
//! property of interest is the AArch64 feature set, whose BTI bit tells the
//! loader that executable pages can be mapped as guarded pages.

use object::elf::{
    GNU_PROPERTY_AARCH64_FEATURE_1_AND, GNU_PROPERTY_AARCH64_FEATURE_1_BTI, NT_GNU_PROPERTY_TYPE_0,
};
use object::endian::Endian;
use object::Endianness;

/// Name of the section holding the GNU property notes.
pub const GNU_PROPERTY_SECTION: &str = ".note.gnu.property";

/// Owner name of GNU notes.
const GNU_OWNER: &[u8] = b"GNU";

/// One entry of a GNU property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GnuProperty {
    pub pr_type: u32,
    pub pr_data: Vec<u8>,
}

/// One note of a note section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    /// Owner name without the terminating NUL.
    pub owner: Vec<u8>,
    pub n_type: u32,
    /// Properties decoded from the descriptor, empty unless this is a GNU
    /// property note.
    pub properties: Vec<GnuProperty>,
}

/// The parsed `.note.gnu.property` section of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityNote {
    pub endian: Endianness,
    pub entries: Vec<NoteEntry>,
}

impl GnuProperty {
    fn is_bti(&self, endian: Endianness) -> bool {
        if self.pr_type != GNU_PROPERTY_AARCH64_FEATURE_1_AND {
            return false;
        }
        match self.pr_data.get(..4).and_then(|d| <[u8; 4]>::try_from(d).ok()) {
            Some(bytes) => endian.read_u32_bytes(bytes) & GNU_PROPERTY_AARCH64_FEATURE_1_BTI != 0,
            None => false,
        }
    }
}

impl NoteEntry {
    fn is_gnu_property(&self) -> bool {
        self.owner == GNU_OWNER && self.n_type == NT_GNU_PROPERTY_TYPE_0
    }
}

impl CapabilityNote {
    pub fn new(endian: Endianness, entries: Vec<NoteEntry>) -> Self {
        Self { endian, entries }
    }

    /// Returns whether any GNU property note enables BTI.
    pub fn is_bti_enabled(&self) -> bool {
        self.entries
            .iter()
            .filter(|note| note.is_gnu_property())
            .any(|note| note.properties.iter().any(|p| p.is_bti(self.endian)))
    }
}
