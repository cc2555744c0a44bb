//! Core data types: outcomes, the test tree, steps and collaborator traits.

pub mod filter;
pub mod messages;
pub mod outcome;
pub mod step;
pub mod test_tree;

pub use filter::{EmptyFilterSet, FilterSet, FilterSetResult, RuleFilterSet};
pub use messages::{MessageSink, ModelMessage, ProgressMonitor, SubProgress, TracingProgress};
pub use outcome::Outcome;
pub use step::{ExecutionFrame, StepId, TestResult, TestStep};
pub use test_tree::{NodeIndex, NodeKind, TestNode, TestTree};
