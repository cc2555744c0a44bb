//! Severity-ordered test outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a test step.
///
/// Variants are declared from least to most severe so the derived `Ord`
/// is the severity order: `Passed < Skipped < Canceled < Failed < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Outcome {
    #[default]
    Passed,
    Skipped,
    Canceled,
    Failed,
    /// An assertion failed or the test threw
    Error,
}

impl Outcome {
    /// Combine two outcomes, keeping the more severe one.
    pub fn combine(self, other: Outcome) -> Outcome {
        self.max(other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Skipped => "skipped",
            Outcome::Canceled => "canceled",
            Outcome::Failed => "failed",
            Outcome::Error => "error",
        }
    }

    pub const ALL: [Outcome; 5] = [
        Outcome::Passed,
        Outcome::Skipped,
        Outcome::Canceled,
        Outcome::Failed,
        Outcome::Error,
    ];
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
