//! Core PE data types and constants used by the inspector

use serde::{Deserialize, Serialize};
use std::fmt;

// PE constants
pub const LFANEW_OFFSET: u64 = 0x3C;
pub const PE_SIGNATURE: u32 = 0x0000_4550; // "PE\0\0", little-endian
pub const PE32_MAGIC: u16 = 0x10B;
pub const PE32PLUS_MAGIC: u16 = 0x20B;

// Field offsets relative to the PE signature
pub const COFF_MACHINE_OFFSET: u64 = 4;
pub const COFF_SECTION_COUNT_OFFSET: u64 = 6;
pub const COFF_OPTIONAL_SIZE_OFFSET: u64 = 20;
pub const OPTIONAL_HEADER_OFFSET: u64 = 24;

pub const SECTION_HEADER_SIZE: u64 = 40;
pub const IMPORT_DESCRIPTOR_SIZE: u64 = 20;
pub const IMPORT_NAME_RVA_OFFSET: u64 = 12;

/// Index of the import entry in the data directory array
pub const IMAGE_DIRECTORY_ENTRY_IMPORT: u32 = 1;

// Machine types
pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014c;
pub const IMAGE_FILE_MACHINE_IA64: u16 = 0x0200;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;

/// Longest module name accepted from an import descriptor
pub const MAX_IMPORT_NAME_LEN: usize = 4096;

/// CPU architecture an image was built for.
///
/// Only the architectures a native test bridge ships for are recognized;
/// everything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    Amd64,
    IA64,
    Unknown,
}

impl From<u16> for Architecture {
    fn from(value: u16) -> Self {
        match value {
            IMAGE_FILE_MACHINE_I386 => Self::X86,
            IMAGE_FILE_MACHINE_AMD64 => Self::Amd64,
            IMAGE_FILE_MACHINE_IA64 => Self::IA64,
            _ => Self::Unknown,
        }
    }
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Amd64 => "amd64",
            Self::IA64 => "ia64",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of inspecting an image.
///
/// `imports` is `None` when the image carries no usable import data, which is
/// distinct from an import directory listing zero modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub architecture: Architecture,
    pub imports: Option<Vec<String>>,
}

impl ImageInfo {
    pub fn new(architecture: Architecture, imports: Option<Vec<String>>) -> Self {
        Self {
            architecture,
            imports,
        }
    }

    /// Image without usable import data
    pub fn without_imports(architecture: Architecture) -> Self {
        Self::new(architecture, None)
    }

    pub fn imports(&self) -> Option<&[String]> {
        self.imports.as_deref()
    }

    pub fn has_import_data(&self) -> bool {
        self.imports.is_some()
    }
}
