//! Minimal PE inspector: architecture and imported module names.
//!
//! The inspector never loads or executes the image. It reads only the
//! header fields and the import table, so it works on any `Read + Seek`
//! source and keeps no state between calls.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

pub mod directories;
pub mod headers;
pub mod sections;
pub mod types;
pub mod utils;
/// Fixture builder for tests, benches and fuzz seeds; not part of the API.
#[doc(hidden)]
pub mod writer;

use crate::error::{BridgeError, Result};
use crate::triage::config::IOConfig;
use directories::read_import_names;
use headers::{parse_coff_header, read_import_directory_rva};
use sections::{find_section_containing_rva, RvaTranslation};
pub use types::*;

/// Inspect an image from a seekable stream.
///
/// Fails with `MalformedImage` when the PE signature is missing or the stream
/// ends early. Degenerate but recognizable layouts (no optional header,
/// unknown optional header magic, no import directory, import RVA outside
/// every section) yield `ImageInfo` without import data.
pub fn inspect<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ImageInfo> {
    let coff = parse_coff_header(reader)?;
    let architecture = coff.architecture();

    if coff.size_of_optional_header == 0 {
        debug!(%architecture, "no optional header");
        return Ok(ImageInfo::without_imports(architecture));
    }

    let Some(import_rva) = read_import_directory_rva(reader, &coff)? else {
        debug!(%architecture, "no import directory");
        return Ok(ImageInfo::without_imports(architecture));
    };

    let Some(section) = find_section_containing_rva(reader, &coff, import_rva)? else {
        debug!(%architecture, import_rva, "import table outside every section");
        return Ok(ImageInfo::without_imports(architecture));
    };

    let translation = RvaTranslation::for_section(&section);
    let imports = read_import_names(reader, &translation, import_rva)?;

    Ok(ImageInfo::new(architecture, Some(imports)))
}

/// Inspect an image file on disk.
pub fn inspect_path<P: AsRef<Path>>(path: P, io: &IOConfig) -> Result<ImageInfo> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| BridgeError::truncated(format!("opening {}", path.display()), e))?;

    let size = file
        .metadata()
        .map_err(|e| BridgeError::truncated(format!("reading metadata of {}", path.display()), e))?
        .len();
    if size > io.max_file_size {
        return Err(BridgeError::malformed(format!(
            "{} is {size} bytes, over the {} byte limit",
            path.display(),
            io.max_file_size
        )));
    }

    inspect(&mut BufReader::new(file))
}
