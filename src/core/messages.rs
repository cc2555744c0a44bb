//! Collaborators receiving the outcome of a session: the model publisher
//! and the progress monitor.

use serde::Serialize;
use tracing::debug;

use crate::core::step::{StepId, TestResult, TestStep};
use crate::core::test_tree::TestTree;

/// Message published to the test model
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelMessage {
    /// Full discovered tree; published once, before any step message
    TestModel { tree: TestTree },
    StepStarted { step: TestStep },
    StepFinished { step_id: StepId, result: TestResult },
}

/// Receiver of model messages
pub trait MessageSink {
    fn publish(&mut self, message: ModelMessage);
}

impl MessageSink for Vec<ModelMessage> {
    fn publish(&mut self, message: ModelMessage) {
        self.push(message);
    }
}

/// Progress reporting and cooperative cancellation
pub trait ProgressMonitor {
    fn begin_task(&mut self, name: &str, total_work: u64);
    fn worked(&mut self, units: u64);
    fn set_status(&mut self, status: &str);
    fn is_canceled(&self) -> bool;
    fn cancel(&mut self);
}

/// Progress monitor that records work and logs status changes.
#[derive(Debug, Default, Clone)]
pub struct TracingProgress {
    pub task: Option<String>,
    pub total_work: u64,
    pub completed: u64,
    pub status: String,
    canceled: bool,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressMonitor for TracingProgress {
    fn begin_task(&mut self, name: &str, total_work: u64) {
        debug!(task = name, total_work, "task started");
        self.task = Some(name.to_string());
        self.total_work = total_work;
        self.completed = 0;
    }

    fn worked(&mut self, units: u64) {
        self.completed += units;
    }

    fn set_status(&mut self, status: &str) {
        debug!(status, "progress");
        self.status = status.to_string();
    }

    fn is_canceled(&self) -> bool {
        self.canceled
    }

    fn cancel(&mut self) {
        self.canceled = true;
    }
}

/// Monitor for one file of a multi-file task.
///
/// Status and cancellation go straight to the parent. The session's own task
/// and ticks stay local, and the parent is credited one unit when this is
/// dropped.
pub struct SubProgress<'p> {
    parent: &'p mut dyn ProgressMonitor,
    pub task: Option<String>,
    pub total_work: u64,
    pub completed: u64,
}

impl<'p> SubProgress<'p> {
    pub fn new(parent: &'p mut dyn ProgressMonitor) -> Self {
        Self {
            parent,
            task: None,
            total_work: 0,
            completed: 0,
        }
    }
}

impl ProgressMonitor for SubProgress<'_> {
    fn begin_task(&mut self, name: &str, total_work: u64) {
        debug!(task = name, total_work, "subtask started");
        self.task = Some(name.to_string());
        self.total_work = total_work;
        self.completed = 0;
    }

    fn worked(&mut self, units: u64) {
        self.completed += units;
    }

    fn set_status(&mut self, status: &str) {
        self.parent.set_status(status);
    }

    fn is_canceled(&self) -> bool {
        self.parent.is_canceled()
    }

    fn cancel(&mut self) {
        self.parent.cancel();
    }
}

impl Drop for SubProgress<'_> {
    fn drop(&mut self) {
        self.parent.worked(1);
    }
}
