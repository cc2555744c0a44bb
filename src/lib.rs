//! boostlink: discovers and runs native Boost.Test suites from a host process.
//!
//! Candidate images are inspected without loading them ([`formats::pe`]),
//! classified by the test framework they import ([`triage`]), and handed to a
//! native bridge library ([`bridge`]) whose callbacks feed the discovery and
//! execution state machines in [`session`]. [`driver::TestDriver`] ties the
//! pieces together per file.

pub mod bridge;
pub mod core;
pub mod driver;
pub mod error;
pub mod formats;
pub mod logging;
pub mod session;
pub mod triage;

pub use driver::{ExecutionOptions, FileRun, TestDriver};
pub use error::{BridgeError, Result};
