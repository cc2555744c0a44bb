//! PE header parsing

use std::io::{Read, Seek};

use crate::error::{BridgeError, Result};
use crate::formats::pe::types::*;
use crate::formats::pe::utils::StreamReadExt;

/// The handful of COFF header fields the inspector needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoffHeader {
    /// Absolute offset of the "PE\0\0" signature
    pub pe_offset: u64,
    pub machine: u16,
    pub number_of_sections: u16,
    pub size_of_optional_header: u16,
}

impl CoffHeader {
    pub fn architecture(&self) -> Architecture {
        Architecture::from(self.machine)
    }

    /// Absolute offset of the optional header
    pub fn optional_header_offset(&self) -> u64 {
        self.pe_offset + OPTIONAL_HEADER_OFFSET
    }

    /// Absolute offset of the first section header
    pub fn section_table_offset(&self) -> u64 {
        self.optional_header_offset() + u64::from(self.size_of_optional_header)
    }
}

/// Optional header flavors with distinct data directory layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalHeaderLayout {
    Pe32,
    Pe32Plus,
}

impl OptionalHeaderLayout {
    pub fn from_magic(magic: u16) -> Option<Self> {
        match magic {
            PE32_MAGIC => Some(Self::Pe32),
            PE32PLUS_MAGIC => Some(Self::Pe32Plus),
            _ => None,
        }
    }

    /// Offset of NumberOfRvaAndSizes within the optional header
    pub fn directory_count_offset(&self) -> u64 {
        match self {
            Self::Pe32 => 92,
            Self::Pe32Plus => 108,
        }
    }

    /// Offset of the import directory RVA within the optional header
    pub fn import_rva_offset(&self) -> u64 {
        match self {
            Self::Pe32 => 104,
            Self::Pe32Plus => 120,
        }
    }
}

/// Locate and validate the PE signature, then read the COFF fields.
pub fn parse_coff_header<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<CoffHeader> {
    let pe_offset = u64::from(reader.read_u32_le_at(LFANEW_OFFSET, "PE header pointer")?);

    let signature = reader.read_u32_le_at(pe_offset, "PE signature")?;
    if signature != PE_SIGNATURE {
        return Err(BridgeError::malformed(format!(
            "cannot find PE header at {pe_offset:#x} (found {signature:#010x})"
        )));
    }

    Ok(CoffHeader {
        pe_offset,
        machine: reader.read_u16_le_at(pe_offset + COFF_MACHINE_OFFSET, "machine type")?,
        number_of_sections: reader
            .read_u16_le_at(pe_offset + COFF_SECTION_COUNT_OFFSET, "section count")?,
        size_of_optional_header: reader
            .read_u16_le_at(pe_offset + COFF_OPTIONAL_SIZE_OFFSET, "optional header size")?,
    })
}

/// Read the import directory RVA from the optional header.
///
/// Returns `None` for an unknown optional header magic or a directory array
/// too short to hold the import entry.
pub fn read_import_directory_rva<R: Read + Seek + ?Sized>(
    reader: &mut R,
    coff: &CoffHeader,
) -> Result<Option<u32>> {
    let base = coff.optional_header_offset();
    let magic = reader.read_u16_le_at(base, "optional header magic")?;

    let Some(layout) = OptionalHeaderLayout::from_magic(magic) else {
        return Ok(None);
    };

    let directory_count =
        reader.read_u32_le_at(base + layout.directory_count_offset(), "directory count")?;
    if directory_count <= IMAGE_DIRECTORY_ENTRY_IMPORT {
        return Ok(None);
    }

    reader
        .read_u32_le_at(base + layout.import_rva_offset(), "import table RVA")
        .map(Some)
}
