//! Utility functions for reading PE fields from a seekable stream

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::error::{BridgeError, Result};

/// Extension trait for reading little-endian primitives at absolute offsets.
///
/// Every read repositions the stream; I/O failures (including short reads)
/// surface as `MalformedImage` naming the field being read.
pub trait StreamReadExt: Read + Seek {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8], what: &str) -> Result<()> {
        self.seek(SeekFrom::Start(offset))
            .map_err(|e| BridgeError::truncated(format!("seeking to {what}"), e))?;
        self.read_exact(buf)
            .map_err(|e| BridgeError::truncated(format!("reading {what} at {offset:#x}"), e))
    }

    fn read_u16_le_at(&mut self, offset: u64, what: &str) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact_at(offset, &mut buf, what)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32_le_at(&mut self, offset: u64, what: &str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_at(offset, &mut buf, what)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a NUL-terminated ASCII string; non-ASCII bytes become `?`.
    fn read_cstring_at(&mut self, offset: u64, max_len: usize) -> Result<String> {
        self.seek(SeekFrom::Start(offset))
            .map_err(|e| BridgeError::truncated("seeking to import name", e))?;

        let mut name = String::new();
        let mut byte = [0u8; 1];
        loop {
            match self.read(&mut byte) {
                Ok(0) => {
                    return Err(BridgeError::truncated(
                        format!("unterminated import name at {offset:#x}"),
                        ErrorKind::UnexpectedEof.into(),
                    ))
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BridgeError::truncated("reading import name", e)),
            }
            if byte[0] == 0 {
                return Ok(name);
            }
            if name.len() == max_len {
                return Err(BridgeError::malformed(format!(
                    "import name at {offset:#x} exceeds {max_len} bytes"
                )));
            }
            name.push(if byte[0].is_ascii() {
                byte[0] as char
            } else {
                '?'
            });
        }
    }
}

impl<T: Read + Seek + ?Sized> StreamReadExt for T {}
