//! Testability verdicts derived from an image's imports.
//!
//! An image is testable when it links the unit test framework library. The
//! framework's file name also tells which build configuration it came from.
//! Only the first matching import is considered: images referencing several
//! differently configured framework builds are not disambiguated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::formats::pe::{Architecture, ImageInfo};
use crate::triage::config::ClassifyConfig;

/// Build configuration of the framework library an image links against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildConfiguration {
    Debug,
    Release,
}

impl BuildConfiguration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a session needs to know about a testable image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestabilityVerdict {
    pub architecture: Architecture,
    pub configuration: BuildConfiguration,
    /// Import that matched the framework prefix
    pub framework_module: String,
}

impl TestabilityVerdict {
    /// Label shown next to the top-level suite, e.g. `x86 (Debug)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.architecture, self.configuration)
    }
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Classify an inspected image; `None` means it is not testable.
pub fn classify(info: &ImageInfo, config: &ClassifyConfig) -> Option<TestabilityVerdict> {
    let module = info
        .imports()?
        .iter()
        .find(|name| starts_with_ignore_case(name, &config.framework_prefix))?;

    let configuration = if contains_ignore_case(module, &config.debug_marker) {
        BuildConfiguration::Debug
    } else {
        BuildConfiguration::Release
    };

    Some(TestabilityVerdict {
        architecture: info.architecture,
        configuration,
        framework_module: module.clone(),
    })
}

/// Whether an image links the test framework at all.
pub fn is_testable(info: &ImageInfo, config: &ClassifyConfig) -> bool {
    classify(info, config).is_some()
}
