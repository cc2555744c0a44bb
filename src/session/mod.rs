//! Discovery and execution sessions driven by the native engine's callbacks.

pub mod callbacks;
pub mod context;
pub mod explore;
pub mod run;

pub use callbacks::{ExecutionListener, TreeVisitor};
pub use context::SessionContext;
pub use explore::{Explorer, TreeBuilder};
pub use run::{RunSummary, Runner};
