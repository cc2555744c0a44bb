//! PE data directory parsers

pub mod import;

pub use import::read_import_names;
