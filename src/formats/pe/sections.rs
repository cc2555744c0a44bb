//! Section header scan and RVA translation

use std::io::{Read, Seek};

use crate::error::{BridgeError, Result};
use crate::formats::pe::headers::CoffHeader;
use crate::formats::pe::types::SECTION_HEADER_SIZE;
use crate::formats::pe::utils::StreamReadExt;

/// Section header fields needed for address translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub pointer_to_raw_data: u32,
}

impl SectionHeader {
    /// Whether `rva` falls inside `[virtual_address, virtual_address + virtual_size)`
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address);
        let end = start + u64::from(self.virtual_size);
        (start..end).contains(&u64::from(rva))
    }
}

/// Fixed RVA to file offset translation taken from one section.
///
/// Every RVA in the import table is translated with the delta of the section
/// holding the table itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RvaTranslation {
    /// virtual address minus raw file offset
    pub delta: i64,
}

impl RvaTranslation {
    pub fn for_section(section: &SectionHeader) -> Self {
        Self {
            delta: i64::from(section.virtual_address) - i64::from(section.pointer_to_raw_data),
        }
    }

    pub fn to_offset(&self, rva: u32) -> Result<u64> {
        let offset = i64::from(rva) - self.delta;
        u64::try_from(offset).map_err(|_| {
            BridgeError::malformed(format!(
                "RVA {rva:#010x} translates before the start of the file"
            ))
        })
    }
}

/// Read one section header from the section table.
pub fn read_section_header<R: Read + Seek + ?Sized>(
    reader: &mut R,
    coff: &CoffHeader,
    index: u16,
) -> Result<SectionHeader> {
    let offset = coff.section_table_offset() + u64::from(index) * SECTION_HEADER_SIZE;
    Ok(SectionHeader {
        virtual_size: reader.read_u32_le_at(offset + 8, "section virtual size")?,
        virtual_address: reader.read_u32_le_at(offset + 12, "section virtual address")?,
        pointer_to_raw_data: reader.read_u32_le_at(offset + 20, "section raw offset")?,
    })
}

/// Scan sections in table order; the first one containing `rva` wins.
pub fn find_section_containing_rva<R: Read + Seek + ?Sized>(
    reader: &mut R,
    coff: &CoffHeader,
    rva: u32,
) -> Result<Option<SectionHeader>> {
    for index in 0..coff.number_of_sections {
        let section = read_section_header(reader, coff, index)?;
        if section.contains_rva(rva) {
            return Ok(Some(section));
        }
    }
    Ok(None)
}
