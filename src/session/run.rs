//! Execution: turns the engine's run events into published steps.
//!
//! One stack of [`ExecutionFrame`]s mirrors the open suites and cases. A
//! finished frame folds its outcome, assertion count and duration into the
//! frame below it, since the engine does not bubble severity up by itself.

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::core::filter::{FilterSet, FilterSetResult};
use crate::core::messages::{ModelMessage, ProgressMonitor};
use crate::core::outcome::Outcome;
use crate::core::step::{ExecutionFrame, TestResult, TestStep};
use crate::core::test_tree::{NodeIndex, TestTree};
use crate::error::{BridgeError, Result};
use crate::session::callbacks::{ExecutionListener, TreeVisitor};
use crate::session::context::{guard, Boundary, SessionContext};
use crate::session::explore::TreeBuilder;

/// What a run left behind once the engine returned
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Result of the root step, if the engine finished the run
    pub root: Option<TestResult>,
    /// Steps still open when the engine returned, reported as canceled
    pub canceled_steps: usize,
}

/// Execution state machine for one run of one image.
pub struct Runner<'a> {
    builder: TreeBuilder,
    ctx: SessionContext<'a>,
    filter: &'a dyn FilterSet,
    frames: Vec<ExecutionFrame>,
    model_published: bool,
    root_result: Option<TestResult>,
}

impl<'a> Runner<'a> {
    pub fn new(ctx: SessionContext<'a>, filter: &'a dyn FilterSet) -> Self {
        Self {
            builder: TreeBuilder::new(ctx.file.clone(), &ctx.verdict),
            ctx,
            filter,
            frames: Vec::new(),
            model_published: false,
            root_result: None,
        }
    }

    pub fn tree(&self) -> &TestTree {
        self.builder.tree()
    }

    /// Depth of the frame stack
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Close whatever the engine left open and report it as canceled,
    /// innermost first.
    pub fn finish(mut self) -> RunSummary {
        self.publish_model();

        let mut canceled_steps = 0;
        while let Some(frame) = self.frames.pop() {
            let mut result = frame.result;
            result.outcome = Outcome::Canceled;
            warn!(step = %frame.step.name, "step still open after the engine returned");
            self.ctx.sink.publish(ModelMessage::StepFinished {
                step_id: frame.step.id,
                result,
            });
            canceled_steps += 1;
        }

        RunSummary {
            root: self.root_result,
            canceled_steps,
        }
    }

    fn publish_model(&mut self) {
        if !self.model_published {
            self.model_published = true;
            let tree = self.builder.tree().clone();
            self.ctx.sink.publish(ModelMessage::TestModel { tree });
        }
    }

    fn top_frame(&mut self) -> Result<&mut ExecutionFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| BridgeError::Protocol("no test unit is running".into()))
    }

    fn resolve_skip(&self) -> bool {
        let tree = self.builder.tree();
        let current = self.builder.current_test();

        let decisive = |index: NodeIndex| match self.filter.evaluate(tree.node(index)) {
            FilterSetResult::Exclude => Some(true),
            FilterSetResult::Include => Some(false),
            FilterSetResult::Indeterminate => None,
        };

        if let Some(skip) = decisive(current) {
            return skip;
        }
        if let Some(skip) = tree.ancestors(current).find_map(decisive) {
            return skip;
        }

        // Suites stay enabled so their children are filtered one by one;
        // cases are skipped only when an allow-list is in effect.
        tree.node(current).is_test_case() && self.filter.has_inclusion_rules()
    }

    fn start(&mut self, leaf_count: u64) -> Result<()> {
        let title = format!("Running tests in {}", self.ctx.file_name());
        self.ctx.progress.begin_task(&title, leaf_count);
        self.publish_model();

        let tree = self.builder.tree();
        let root = tree.root();
        let step = TestStep::new(root, tree.node(root), None);
        self.frames.push(ExecutionFrame::suite(step.clone()));
        self.builder.set_current(root, root);

        debug!(leaf_count, "run started");
        self.ctx.sink.publish(ModelMessage::StepStarted { step });
        Ok(())
    }

    fn unit_start(&mut self, name: &str, is_suite: bool) -> Result<()> {
        self.ctx.progress.set_status(&format!("Running {name}"));
        self.publish_model();

        let tree = self.builder.tree();
        let id = tree.child_id(self.builder.current_suite(), name);
        let index = tree
            .find(&id)
            .ok_or_else(|| BridgeError::UnknownTest { id: id.clone() })?;

        let parent = self.frames.last().map(|f| f.step.id);
        let step = TestStep::new(index, tree.node(index), parent);
        if is_suite {
            self.frames.push(ExecutionFrame::suite(step.clone()));
            self.builder.set_current(index, index);
        } else {
            self.frames.push(ExecutionFrame::case(step.clone()));
            let suite = self.builder.current_suite();
            self.builder.set_current(suite, index);
        }

        self.ctx.sink.publish(ModelMessage::StepStarted { step });
        Ok(())
    }

    fn unit_finish(&mut self, name: &str, is_suite: bool, elapsed_micros: u64) -> Result<()> {
        let frame = self.frames.pop().ok_or_else(|| {
            BridgeError::Protocol(format!("finish of {name} without a running test unit"))
        })?;
        let is_case = frame.leaf_count.is_none();
        if is_case == is_suite {
            warn!(unit = name, is_suite, "finish event disagrees with the running unit kind");
        }

        let mut result = frame.result;
        result.duration += Duration::from_micros(elapsed_micros);

        let tree = self.builder.tree();
        match frame.leaf_count {
            Some(leaves) => {
                if leaves == 0 && tree.node(frame.step.node).has_children() {
                    result.outcome = Outcome::Skipped;
                }
                if let Some(top) = self.frames.last_mut() {
                    top.add_leaves(leaves);
                }
                let parent = tree.parent(frame.step.node).unwrap_or(tree.root());
                self.builder.set_current(parent, parent);
            }
            None => {
                if result.outcome != Outcome::Skipped {
                    if let Some(top) = self.frames.last_mut() {
                        top.add_leaves(1);
                    }
                }
                let suite = self.builder.current_suite();
                self.builder.set_current(suite, suite);
                self.ctx.progress.worked(1);
            }
        }

        self.ctx.sink.publish(ModelMessage::StepFinished {
            step_id: frame.step.id,
            result: result.clone(),
        });

        if let Some(top) = self.frames.last_mut() {
            top.result.absorb(&result);
        }
        Ok(())
    }

    fn run_finish(&mut self) -> Result<()> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| BridgeError::Protocol("run finished before it started".into()))?;
        let tree = self.builder.tree();
        if frame.step.node != tree.root() {
            warn!(step = %frame.step.name, "run finished while a test unit was still open");
        }

        let mut result = frame.result;
        if frame.leaf_count == Some(0) && tree.node(frame.step.node).has_children() {
            result.outcome = Outcome::Skipped;
        }

        debug!(outcome = %result.outcome, "run finished");
        self.root_result = Some(result.clone());
        self.ctx.sink.publish(ModelMessage::StepFinished {
            step_id: frame.step.id,
            result,
        });
        Ok(())
    }
}

impl Boundary for Runner<'_> {
    fn progress(&mut self) -> &mut dyn ProgressMonitor {
        &mut *self.ctx.progress
    }
}

impl TreeVisitor for Runner<'_> {
    fn begin_suite(&mut self, name: &str) -> bool {
        guard(self, "begin_suite", |s| s.builder.begin_suite(name))
    }

    fn visit_case(&mut self, name: &str) -> bool {
        guard(self, "visit_case", |s| s.builder.visit_case(name))
    }

    fn end_suite(&mut self, name: &str) -> bool {
        guard(self, "end_suite", |s| s.builder.end_suite(name))
    }
}

impl ExecutionListener for Runner<'_> {
    fn should_skip(&mut self, name: &str) -> bool {
        // Stays true unless the query succeeds; a failure never enables a test.
        let mut skip = true;
        guard(self, "should_skip", |s| {
            skip = s.resolve_skip();
            if skip {
                debug!(unit = name, "disabled by filter");
            }
            Ok(())
        });
        skip
    }

    fn test_start(&mut self, leaf_count: u64) -> bool {
        guard(self, "test_start", |s| s.start(leaf_count))
    }

    fn test_finish(&mut self) -> bool {
        guard(self, "test_finish", |s| s.run_finish())
    }

    fn test_aborted(&mut self) -> bool {
        guard(self, "test_aborted", |s| {
            let root = s
                .frames
                .first_mut()
                .ok_or_else(|| BridgeError::Protocol("run aborted before it started".into()))?;
            root.result.outcome = Outcome::Failed;
            Ok(())
        })
    }

    fn test_unit_start(&mut self, name: &str, is_suite: bool) -> bool {
        guard(self, "test_unit_start", |s| s.unit_start(name, is_suite))
    }

    fn test_unit_finish(&mut self, name: &str, is_suite: bool, elapsed_micros: u64) -> bool {
        guard(self, "test_unit_finish", |s| {
            s.unit_finish(name, is_suite, elapsed_micros)
        })
    }

    fn test_unit_skipped(&mut self, name: &str, is_suite: bool) -> bool {
        guard(self, "test_unit_skipped", |s| {
            s.top_frame()?.result.outcome = Outcome::Skipped;
            s.unit_finish(name, is_suite, 0)
        })
    }

    fn test_unit_aborted(&mut self, name: &str, _is_suite: bool) -> bool {
        guard(self, "test_unit_aborted", |s| {
            debug!(unit = name, "aborted");
            s.top_frame()?.result.outcome = Outcome::Failed;
            Ok(())
        })
    }

    fn assertion_result(&mut self, passed: bool) -> bool {
        guard(self, "assertion_result", |s| {
            let result = &mut s.top_frame()?.result;
            result.assert_count += 1;
            if !passed {
                result.outcome = Outcome::Error;
            }
            Ok(())
        })
    }

    fn exception_caught(&mut self, text: &str) -> bool {
        guard(self, "exception_caught", |s| {
            s.top_frame()?.result.outcome = Outcome::Error;
            error!("Unexpected exception in test case: {text}");
            Ok(())
        })
    }
}
