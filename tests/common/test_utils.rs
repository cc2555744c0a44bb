//! Shared helpers for putting images on disk.

use std::io::Write;

use boostlink::formats::pe::writer::ImageWriter;
use tempfile::NamedTempFile;

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Writes a synthetic image with the given machine type and imports.
pub fn create_image(machine: u16, imports: &[&str]) -> NamedTempFile {
    let bytes = ImageWriter::new(machine)
        .imports(imports.iter().copied())
        .build();
    create_temp_file(&bytes)
}
