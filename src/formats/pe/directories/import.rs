//! Import table parsing

use std::io::{Read, Seek};

use tracing::trace;

use crate::error::Result;
use crate::formats::pe::sections::RvaTranslation;
use crate::formats::pe::types::*;
use crate::formats::pe::utils::StreamReadExt;

/// Walk the import descriptors starting at `table_rva` and collect module names.
///
/// A descriptor whose name RVA is zero terminates the table.
pub fn read_import_names<R: Read + Seek + ?Sized>(
    reader: &mut R,
    translation: &RvaTranslation,
    table_rva: u32,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entry_offset = translation.to_offset(table_rva)?;

    loop {
        let name_rva =
            reader.read_u32_le_at(entry_offset + IMPORT_NAME_RVA_OFFSET, "import name RVA")?;
        if name_rva == 0 {
            break;
        }

        let name_offset = translation.to_offset(name_rva)?;
        let name = reader.read_cstring_at(name_offset, MAX_IMPORT_NAME_LEN)?;
        trace!(module = %name, offset = name_offset, "import descriptor");
        names.push(name);

        entry_offset += IMPORT_DESCRIPTOR_SIZE;
    }

    Ok(names)
}
