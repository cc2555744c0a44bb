//! Configuration for the adapter.
//!
//! Provides centralized configuration for classification, native bridge
//! location and file access, with sensible defaults. Every field is optional
//! in serialized form.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::formats::pe::Architecture;
use crate::triage::classify::BuildConfiguration;

/// Master configuration for the adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Classification of inspected images.
    pub classify: ClassifyConfig,
    /// Native bridge library location and entry points.
    pub bridge: BridgeConfig,
    /// I/O limits for image inspection.
    pub io: IOConfig,
}

impl AdapterConfig {
    /// Parse a JSON document; missing sections and fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.classify.framework_prefix.is_empty() {
            return Err(BridgeError::InvalidConfig(
                "classify.framework_prefix must not be empty".into(),
            ));
        }
        if self.bridge.library_name.is_empty() {
            return Err(BridgeError::InvalidConfig(
                "bridge.library_name must not be empty".into(),
            ));
        }
        if self.bridge.explore_entry.is_empty() || self.bridge.run_entry.is_empty() {
            return Err(BridgeError::InvalidConfig(
                "bridge entry point names must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Framework detection rules applied to an image's imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Prefix of the test framework library name (default: "boost_unit_test_framework").
    pub framework_prefix: String,
    /// Infix marking a debug build of the framework library (default: "-gd-").
    pub debug_marker: String,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            framework_prefix: "boost_unit_test_framework".to_string(),
            debug_marker: "-gd-".to_string(),
        }
    }
}

/// Where the native bridge lives and what it exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base directory holding one `<arch>/<configuration>` subfolder per build.
    pub directory: PathBuf,
    /// File name of the bridge library (default: "BoostTestBridge.dll").
    pub library_name: String,
    /// Exploration entry point (default: "BoostTestExplore").
    pub explore_entry: String,
    /// Execution entry point (default: "BoostTestRun").
    pub run_entry: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            library_name: "BoostTestBridge.dll".to_string(),
            explore_entry: "BoostTestExplore".to_string(),
            run_entry: "BoostTestRun".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Bridge library built for the given architecture and configuration.
    pub fn library_path(
        &self,
        architecture: Architecture,
        configuration: BuildConfiguration,
    ) -> PathBuf {
        self.directory
            .join(architecture.as_str())
            .join(configuration.as_str())
            .join(&self.library_name)
    }
}

/// I/O configuration for image inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOConfig {
    /// Maximum file size to inspect (default: 268435456 = 256MB).
    pub max_file_size: u64,
}

impl Default for IOConfig {
    fn default() -> Self {
        Self {
            max_file_size: 268435456, // 256MB
        }
    }
}
