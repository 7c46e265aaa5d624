//! Builds small ELF64 images for the integration tests.
//!
//! The images only carry what the tool looks at: the file header, program
//! headers, section headers, the section name table and section contents.

#![allow(dead_code)]

use object::elf;
use object::endian::{U16, U32, U64};
use object::pod::bytes_of;
use object::Endianness;
use std::path::PathBuf;

pub struct SegmentDef {
    pub p_type: u32,
    pub flags: u32,
    pub vaddr: u64,
    pub offset: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

pub struct SectionDef {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub align: u64,
    pub data: Vec<u8>,
}

impl SegmentDef {
    pub fn load(flags: u32, vaddr: u64, filesz: u64, memsz: u64) -> Self {
        Self {
            p_type: elf::PT_LOAD,
            flags,
            vaddr,
            offset: vaddr,
            filesz,
            memsz,
            align: 0x1000,
        }
    }

    /// Moves the segment to another file offset.
    pub fn at(self, offset: u64) -> Self {
        Self { offset, ..self }
    }
}

impl SectionDef {
    /// A file-backed allocated section placed at the file offset equal to its address.
    pub fn progbits(name: &str, flags: u32, addr: u64, size: u64) -> Self {
        Self {
            name: name.to_string(),
            sh_type: elf::SHT_PROGBITS,
            flags: u64::from(elf::SHF_ALLOC | flags),
            addr,
            offset: addr,
            size,
            align: 8,
            data: Vec::new(),
        }
    }

    /// Moves the section contents to another file offset.
    pub fn at(self, offset: u64) -> Self {
        Self { offset, ..self }
    }

    pub fn nobits(name: &str, addr: u64, size: u64) -> Self {
        Self {
            sh_type: elf::SHT_NOBITS,
            ..Self::progbits(name, elf::SHF_WRITE, addr, size)
        }
    }

    /// A `.note.gnu.property` section holding one AArch64 feature property.
    pub fn gnu_property(endian: Endianness, addr: u64, features: u32) -> Self {
        let data = gnu_property_note(endian, features);
        Self {
            name: ".note.gnu.property".to_string(),
            sh_type: elf::SHT_NOTE,
            size: data.len() as u64,
            data,
            ..Self::progbits("", 0, addr, 0)
        }
    }
}

/// Encodes an ELF64 `NT_GNU_PROPERTY_TYPE_0` note with a single
/// `GNU_PROPERTY_AARCH64_FEATURE_1_AND` property.
pub fn gnu_property_note(endian: Endianness, features: u32) -> Vec<u8> {
    let mut note = Vec::new();
    let mut push = |v: u32| note.extend_from_slice(bytes_of(&U32::new(endian, v)));
    push(4); // n_namesz
    push(16); // n_descsz
    push(elf::NT_GNU_PROPERTY_TYPE_0);
    note.extend_from_slice(b"GNU\0");
    let mut push = |v: u32| note.extend_from_slice(bytes_of(&U32::new(endian, v)));
    push(elf::GNU_PROPERTY_AARCH64_FEATURE_1_AND);
    push(4); // pr_datasz
    push(features);
    push(0); // padding to 8 bytes
    note
}

pub struct ElfBuilder {
    pub endian: Endianness,
    pub segments: Vec<SegmentDef>,
    pub sections: Vec<SectionDef>,
}

impl ElfBuilder {
    pub fn new(endian: Endianness) -> Self {
        Self { endian, segments: Vec::new(), sections: Vec::new() }
    }

    pub fn segment(mut self, segment: SegmentDef) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn section(mut self, section: SectionDef) -> Self {
        self.sections.push(section);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let endian = self.endian;
        let u16 = |v: u16| U16::new(endian, v);
        let u32 = |v: u32| U32::new(endian, v);
        let u64 = |v: u64| U64::new(endian, v);

        let ehsize = 64u64;
        let phentsize = 56u64;
        let shentsize = 64u64;
        let phoff = if self.segments.is_empty() { 0 } else { ehsize };

        // Section contents live at their own offsets; the name table follows them.
        let contents_end = self
            .sections
            .iter()
            .filter(|s| s.sh_type != elf::SHT_NOBITS)
            .map(|s| s.offset + s.size)
            .chain(std::iter::once(ehsize + phentsize * self.segments.len() as u64))
            .max()
            .unwrap_or(ehsize);

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let shstrtab_offset = contents_end;
        let shoff = (shstrtab_offset + shstrtab.len() as u64 + 7) & !7;
        let shnum = self.sections.len() as u16 + 2;

        let data = match endian {
            Endianness::Little => elf::ELFDATA2LSB,
            Endianness::Big => elf::ELFDATA2MSB,
        };
        let file_header = elf::FileHeader64::<Endianness> {
            e_ident: elf::Ident {
                magic: elf::ELFMAG,
                class: elf::ELFCLASS64,
                data,
                version: elf::EV_CURRENT,
                os_abi: elf::ELFOSABI_SYSV,
                abi_version: 0,
                padding: [0; 7],
            },
            e_type: u16(elf::ET_EXEC),
            e_machine: u16(elf::EM_AARCH64),
            e_version: u32(elf::EV_CURRENT as u32),
            e_entry: u64(self.segments.first().map_or(0, |s| s.vaddr)),
            e_phoff: u64(phoff),
            e_shoff: u64(shoff),
            e_flags: u32(0),
            e_ehsize: u16(ehsize as u16),
            e_phentsize: u16(phentsize as u16),
            e_phnum: u16(self.segments.len() as u16),
            e_shentsize: u16(shentsize as u16),
            e_shnum: u16(shnum),
            e_shstrndx: u16(shnum - 1),
        };

        let mut buffer = Vec::new();
        buffer.extend_from_slice(bytes_of(&file_header));

        for segment in &self.segments {
            let header = elf::ProgramHeader64::<Endianness> {
                p_type: u32(segment.p_type),
                p_flags: u32(segment.flags),
                p_offset: u64(segment.offset),
                p_vaddr: u64(segment.vaddr),
                p_paddr: u64(segment.vaddr),
                p_filesz: u64(segment.filesz),
                p_memsz: u64(segment.memsz),
                p_align: u64(segment.align),
            };
            buffer.extend_from_slice(bytes_of(&header));
        }

        buffer.resize(contents_end as usize, 0);
        for section in &self.sections {
            if !section.data.is_empty() {
                let start = section.offset as usize;
                buffer[start..start + section.data.len()].copy_from_slice(&section.data);
            }
        }

        buffer.extend_from_slice(&shstrtab);
        buffer.resize(shoff as usize, 0);

        let null = elf::SectionHeader64::<Endianness> {
            sh_name: u32(0),
            sh_type: u32(elf::SHT_NULL),
            sh_flags: u64(0),
            sh_addr: u64(0),
            sh_offset: u64(0),
            sh_size: u64(0),
            sh_link: u32(0),
            sh_info: u32(0),
            sh_addralign: u64(0),
            sh_entsize: u64(0),
        };
        buffer.extend_from_slice(bytes_of(&null));

        for (section, name) in self.sections.iter().zip(&name_offsets) {
            let header = elf::SectionHeader64::<Endianness> {
                sh_name: u32(*name),
                sh_type: u32(section.sh_type),
                sh_flags: u64(section.flags),
                sh_addr: u64(section.addr),
                sh_offset: u64(section.offset),
                sh_size: u64(section.size),
                sh_link: u32(0),
                sh_info: u32(0),
                sh_addralign: u64(section.align),
                sh_entsize: u64(0),
            };
            buffer.extend_from_slice(bytes_of(&header));
        }

        let strtab = elf::SectionHeader64::<Endianness> {
            sh_name: u32(shstrtab_name),
            sh_type: u32(elf::SHT_STRTAB),
            sh_flags: u64(0),
            sh_addr: u64(0),
            sh_offset: u64(shstrtab_offset),
            sh_size: u64(shstrtab.len() as u64),
            sh_link: u32(0),
            sh_info: u32(0),
            sh_addralign: u64(1),
            sh_entsize: u64(0),
        };
        buffer.extend_from_slice(bytes_of(&strtab));

        buffer
    }
}

/// A fresh scratch directory for one test.
pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("segmanifest-{}-{}", std::process::id(), test));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
