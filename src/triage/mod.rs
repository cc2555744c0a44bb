//! Triage of candidate test images.
//!
//! Decides whether an inspected image can be driven by the native test
//! bridge, and with which build of it.

pub mod classify;
pub mod config;

pub use classify::{classify, is_testable, BuildConfiguration, TestabilityVerdict};
pub use config::{AdapterConfig, BridgeConfig, ClassifyConfig, IOConfig};
