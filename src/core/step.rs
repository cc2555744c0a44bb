//! Test steps, their results and the frames tracking open steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::core::outcome::Outcome;
use crate::core::test_tree::{NodeIndex, TestNode};

/// Identifier of one step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One execution of a test node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestStep {
    pub id: StepId,
    pub parent: Option<StepId>,
    pub node: NodeIndex,
    pub test_id: String,
    pub name: String,
    pub is_test_case: bool,
    pub started_at: DateTime<Utc>,
}

impl TestStep {
    pub fn new(node_index: NodeIndex, node: &TestNode, parent: Option<StepId>) -> Self {
        Self {
            id: StepId::new(),
            parent,
            node: node_index,
            test_id: node.id.clone(),
            name: node.display_name.clone(),
            is_test_case: node.is_test_case(),
            started_at: Utc::now(),
        }
    }
}

/// Aggregated result of a step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestResult {
    pub outcome: Outcome,
    pub assert_count: u32,
    pub duration: Duration,
}

impl TestResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    /// Fold a finished child's result into this one.
    pub fn absorb(&mut self, child: &TestResult) {
        self.outcome = self.outcome.combine(child.outcome);
        self.assert_count += child.assert_count;
        self.duration += child.duration;
    }
}

/// State of one open suite or case during a run
#[derive(Debug, Clone)]
pub struct ExecutionFrame {
    pub step: TestStep,
    pub result: TestResult,
    /// Cases that actually ran below this frame; `None` for cases
    pub leaf_count: Option<u64>,
}

impl ExecutionFrame {
    pub fn suite(step: TestStep) -> Self {
        Self {
            step,
            result: TestResult::new(Outcome::Passed),
            leaf_count: Some(0),
        }
    }

    pub fn case(step: TestStep) -> Self {
        Self {
            step,
            result: TestResult::new(Outcome::Passed),
            leaf_count: None,
        }
    }

    pub fn add_leaves(&mut self, count: u64) {
        if let Some(leaves) = self.leaf_count.as_mut() {
            *leaves += count;
        }
    }
}
