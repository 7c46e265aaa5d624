//! ELF image reader.
//!
//! Maps the input file, walks its `PT_LOAD` program headers and collects the
//! sections each of them contains. Everything is copied out into plain data
//! so the mapping can be dropped before the region model is built.

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use object::elf;
use object::read::elf::{FileHeader, ProgramHeader, SectionHeader};
use object::{Endianness, FileKind};
use std::fs::File;
use std::path::Path;

use crate::note::{CapabilityNote, GnuProperty, NoteEntry, GNU_PROPERTY_SECTION};

/// A section contained in a loadable segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub name: String,
    pub address: u64,
    pub size: u64,
    /// `SHT_NOBITS`: occupies memory but no file space.
    pub no_bits: bool,
}

/// A `PT_LOAD` program header together with its member sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSegment {
    /// Index in the program header table.
    pub index: usize,
    pub vaddr: u64,
    pub align: u64,
    /// Raw `p_flags`.
    pub flags: u32,
    /// Member sections in section header order, without the property note.
    pub sections: Vec<SectionInfo>,
    pub note: Option<CapabilityNote>,
}

/// The loadable part of an ELF image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElfImage {
    pub segments: Vec<ProgramSegment>,
}

/// Placement of a section header, as needed for the containment test.
#[derive(Debug, Clone, Copy)]
struct SectionSpan {
    sh_type: u32,
    sh_flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
}

/// Placement of a program header, in memory and in the file.
#[derive(Debug, Clone, Copy)]
struct SegmentSpan {
    vaddr: u64,
    offset: u64,
    filesz: u64,
    memsz: u64,
}

/// Checks that `[start, start + size)` lies within `[base, base + len)`.
/// An empty range sitting exactly at the end does not count.
fn span_within(start: u64, size: u64, base: u64, len: u64) -> bool {
    let Some(rel) = start.checked_sub(base) else {
        return false;
    };
    let Some(last) = len.checked_sub(1) else {
        return false;
    };
    rel.checked_add(size).is_some_and(|end| end <= len) && rel <= last
}

impl SegmentSpan {
    /// Strict section-in-segment test of a `PT_LOAD` header. Only
    /// allocated sections are ever loaded, so nothing else is a member.
    fn contains(&self, section: &SectionSpan) -> bool {
        if section.sh_type == elf::SHT_NULL || section.sh_flags & u64::from(elf::SHF_ALLOC) == 0 {
            return false;
        }
        if !span_within(section.addr, section.size, self.vaddr, self.memsz) {
            return false;
        }
        if section.sh_type == elf::SHT_NOBITS {
            return true;
        }
        span_within(section.offset, section.size, self.offset, self.filesz)
    }
}

impl ElfImage {
    /// Maps and parses the ELF file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("failed to map {}", path.display()))?;
        Self::parse(&mmap).with_context(|| format!("failed to read ELF image {}", path.display()))
    }

    /// Parses an in-memory ELF image of either class and byte order.
    pub fn parse(data: &[u8]) -> Result<Self> {
        match FileKind::parse(data).context("failed to identify file format")? {
            FileKind::Elf32 => read_image::<elf::FileHeader32<Endianness>>(data),
            FileKind::Elf64 => read_image::<elf::FileHeader64<Endianness>>(data),
            kind => bail!("not an ELF image: {:?}", kind),
        }
    }
}

fn read_image<Elf: FileHeader<Endian = Endianness>>(data: &[u8]) -> Result<ElfImage> {
    let header = Elf::parse(data).context("failed to parse ELF header")?;
    let endian = header.endian()?;
    let program_headers = header
        .program_headers(endian, data)
        .context("failed to parse program headers")?;
    let sections = header
        .sections(endian, data)
        .context("failed to parse section headers")?;

    let mut segments = Vec::new();
    for (index, phdr) in program_headers.iter().enumerate() {
        if phdr.p_type(endian) != elf::PT_LOAD {
            tracing::trace!("Skipping program header {} (type 0x{:x})", index, phdr.p_type(endian));
            continue;
        }

        let span = SegmentSpan {
            vaddr: phdr.p_vaddr(endian).into(),
            offset: phdr.p_offset(endian).into(),
            filesz: phdr.p_filesz(endian).into(),
            memsz: phdr.p_memsz(endian).into(),
        };
        let mut segment = ProgramSegment {
            index,
            vaddr: span.vaddr,
            align: phdr.p_align(endian).into(),
            flags: phdr.p_flags(endian),
            sections: Vec::new(),
            note: None,
        };

        for section in sections.iter() {
            let section_span = SectionSpan {
                sh_type: section.sh_type(endian),
                sh_flags: section.sh_flags(endian).into(),
                addr: section.sh_addr(endian).into(),
                offset: section.sh_offset(endian).into(),
                size: section.sh_size(endian).into(),
            };
            if !span.contains(&section_span) {
                continue;
            }

            let name = sections
                .section_name(endian, section)
                .context("failed to read section name")?;
            let name = String::from_utf8_lossy(name).into_owned();

            if name == GNU_PROPERTY_SECTION {
                tracing::trace!("Segment {}: found {}", index, name);
                segment.note = Some(read_notes::<Elf>(section, endian, data)?);
                continue;
            }

            tracing::trace!(
                "Segment {}: section {} at 0x{:x} (size 0x{:x})",
                index, name, section_span.addr, section_span.size
            );
            segment.sections.push(SectionInfo {
                name,
                address: section_span.addr,
                size: section_span.size,
                no_bits: section_span.sh_type == elf::SHT_NOBITS,
            });
        }

        segments.push(segment);
    }

    Ok(ElfImage { segments })
}

/// Decodes every note of a note section. GNU property notes also get their
/// property list decoded.
fn read_notes<Elf: FileHeader<Endian = Endianness>>(
    section: &Elf::SectionHeader,
    endian: Endianness,
    data: &[u8],
) -> Result<CapabilityNote> {
    let mut entries = Vec::new();
    let Some(mut notes) = section
        .notes(endian, data)
        .context("failed to parse GNU property section")?
    else {
        return Ok(CapabilityNote::new(endian, entries));
    };

    while let Some(note) = notes.next().context("failed to parse note")? {
        let mut properties = Vec::new();
        if let Some(mut props) = note.gnu_properties(endian) {
            while let Some(prop) = props.next().context("failed to parse GNU property")? {
                properties.push(GnuProperty {
                    pr_type: prop.pr_type(),
                    pr_data: prop.pr_data().to_vec(),
                });
            }
        }
        entries.push(NoteEntry {
            owner: note.name().to_vec(),
            n_type: note.n_type(endian),
            properties,
        });
    }

    Ok(CapabilityNote::new(endian, entries))
}
