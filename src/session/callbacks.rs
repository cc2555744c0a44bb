//! Callback protocol between the native engine and a session.
//!
//! One method per engine event. Every method returns `true` to let the
//! engine continue and `false` to ask it to stop; failures never escape.

use tracing::error;

/// Events raised while the engine walks its test registry.
pub trait TreeVisitor {
    fn begin_suite(&mut self, name: &str) -> bool;
    fn visit_case(&mut self, name: &str) -> bool;
    fn end_suite(&mut self, name: &str) -> bool;

    /// Error text reported by the engine itself
    fn report_error(&mut self, text: &str) {
        error!(engine_error = text, "native test engine reported an error");
    }
}

/// Events raised while the engine executes tests.
///
/// During a run the engine re-walks its registry through [`TreeVisitor`],
/// asking [`should_skip`](Self::should_skip) after each visited node, and
/// then reports execution events in strict nesting order.
pub trait ExecutionListener: TreeVisitor {
    /// Whether the node just visited must be disabled (`true` = skip)
    fn should_skip(&mut self, name: &str) -> bool;
    fn test_start(&mut self, leaf_count: u64) -> bool;
    fn test_finish(&mut self) -> bool;
    fn test_aborted(&mut self) -> bool;
    fn test_unit_start(&mut self, name: &str, is_suite: bool) -> bool;
    fn test_unit_finish(&mut self, name: &str, is_suite: bool, elapsed_micros: u64) -> bool;
    /// No finish event follows a skip
    fn test_unit_skipped(&mut self, name: &str, is_suite: bool) -> bool;
    /// A finish event always follows an abort
    fn test_unit_aborted(&mut self, name: &str, is_suite: bool) -> bool;
    fn assertion_result(&mut self, passed: bool) -> bool;
    fn exception_caught(&mut self, text: &str) -> bool;
}
