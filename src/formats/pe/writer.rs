//! Minimal image writer producing synthetic fixtures.
//!
//! Emits just enough of a PE image for the inspector: DOS stub pointer,
//! COFF header, optional header directory fields, two section headers and an
//! import table. Used by tests, benchmarks and fuzz seeds.

use crate::formats::pe::types::*;

const PE_OFFSET: usize = 0x80;
const TEXT_VA: u32 = 0x1000;
const TEXT_RAW: u32 = 0x200;
const IDATA_VA: u32 = 0x2000;
const IDATA_RAW: u32 = 0x400;

/// Builder for a synthetic image
#[derive(Debug, Clone)]
pub struct ImageWriter {
    machine: u16,
    magic: u16,
    directory_count: u32,
    with_optional_header: bool,
    import_rva_override: Option<u32>,
    signature: [u8; 4],
    imports: Vec<String>,
}

impl ImageWriter {
    pub fn new(machine: u16) -> Self {
        Self {
            machine,
            magic: PE32_MAGIC,
            directory_count: 16,
            with_optional_header: true,
            import_rva_override: None,
            signature: *b"PE\0\0",
            imports: Vec::new(),
        }
    }

    /// Use the 64-bit optional header layout
    pub fn pe32plus(mut self) -> Self {
        self.magic = PE32PLUS_MAGIC;
        self
    }

    pub fn magic(mut self, magic: u16) -> Self {
        self.magic = magic;
        self
    }

    pub fn directory_count(mut self, count: u32) -> Self {
        self.directory_count = count;
        self
    }

    pub fn without_optional_header(mut self) -> Self {
        self.with_optional_header = false;
        self
    }

    /// Point the import directory at an arbitrary RVA
    pub fn import_rva(mut self, rva: u32) -> Self {
        self.import_rva_override = Some(rva);
        self
    }

    pub fn signature(mut self, signature: [u8; 4]) -> Self {
        self.signature = signature;
        self
    }

    pub fn import(mut self, name: impl Into<String>) -> Self {
        self.imports.push(name.into());
        self
    }

    pub fn imports<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(names.into_iter().map(Into::into));
        self
    }

    fn optional_header_size(&self) -> usize {
        if !self.with_optional_header {
            0
        } else if self.magic == PE32PLUS_MAGIC {
            112 + 16 * 8
        } else {
            96 + 16 * 8
        }
    }

    /// Import descriptors followed by the NUL-terminated module names
    fn idata(&self) -> Vec<u8> {
        let table_len = (self.imports.len() + 1) * IMPORT_DESCRIPTOR_SIZE as usize;
        let mut table = vec![0u8; table_len];
        let mut names = Vec::new();

        for (i, name) in self.imports.iter().enumerate() {
            let name_rva = IDATA_VA + (table_len + names.len()) as u32;
            let at = i * IMPORT_DESCRIPTOR_SIZE as usize + IMPORT_NAME_RVA_OFFSET as usize;
            table[at..at + 4].copy_from_slice(&name_rva.to_le_bytes());
            names.extend_from_slice(name.as_bytes());
            names.push(0);
        }

        table.extend_from_slice(&names);
        table
    }

    pub fn build(&self) -> Vec<u8> {
        let idata = self.idata();
        let mut data = vec![0u8; IDATA_RAW as usize + idata.len()];

        data[0..2].copy_from_slice(b"MZ");
        put_u32(&mut data, LFANEW_OFFSET as usize, PE_OFFSET as u32);

        let pe = PE_OFFSET;
        data[pe..pe + 4].copy_from_slice(&self.signature);
        put_u16(&mut data, pe + 4, self.machine);
        put_u16(&mut data, pe + 6, 2);
        let opt_size = self.optional_header_size();
        put_u16(&mut data, pe + 20, opt_size as u16);

        let opt = pe + OPTIONAL_HEADER_OFFSET as usize;
        if self.with_optional_header {
            put_u16(&mut data, opt, self.magic);
            let (count_at, import_at) = if self.magic == PE32PLUS_MAGIC {
                (108, 120)
            } else {
                (92, 104)
            };
            put_u32(&mut data, opt + count_at, self.directory_count);
            let rva = self.import_rva_override.unwrap_or(IDATA_VA);
            put_u32(&mut data, opt + import_at, rva);
            put_u32(&mut data, opt + import_at + 4, idata.len() as u32);
        }

        let sections = opt + opt_size;
        write_section(&mut data, sections, b".text\0\0\0", TEXT_VA, 0x100, TEXT_RAW);
        write_section(
            &mut data,
            sections + SECTION_HEADER_SIZE as usize,
            b".idata\0\0",
            IDATA_VA,
            idata.len() as u32,
            IDATA_RAW,
        );

        data[IDATA_RAW as usize..].copy_from_slice(&idata);
        data
    }
}

fn write_section(data: &mut [u8], at: usize, name: &[u8; 8], va: u32, size: u32, raw: u32) {
    data[at..at + 8].copy_from_slice(name);
    put_u32(data, at + 8, size);
    put_u32(data, at + 12, va);
    put_u32(data, at + 16, size);
    put_u32(data, at + 20, raw);
}

fn put_u16(data: &mut [u8], at: usize, value: u16) {
    data[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], at: usize, value: u32) {
    data[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
