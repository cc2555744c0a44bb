//! Discovery: builds the test tree from the engine's registry walk.

use tracing::{debug, warn};

use crate::core::messages::{ModelMessage, ProgressMonitor};
use crate::core::test_tree::{
    NodeIndex, NodeKind, TestTree, METADATA_CONFIGURATION, METADATA_FILE,
};
use crate::error::Result;
use crate::session::callbacks::TreeVisitor;
use crate::session::context::{guard, Boundary, SessionContext};
use crate::triage::classify::TestabilityVerdict;

/// Discovery state machine.
///
/// Tracks the suite currently open and the node visited last; the latter is
/// what skip decisions are asked about.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    tree: TestTree,
    file: String,
    label: String,
    current_suite: NodeIndex,
    current_test: NodeIndex,
}

impl TreeBuilder {
    pub fn new(file: impl Into<String>, verdict: &TestabilityVerdict) -> Self {
        let file = file.into();
        let tree = TestTree::new(file.clone());
        let root = tree.root();
        Self {
            tree,
            file,
            label: verdict.label(),
            current_suite: root,
            current_test: root,
        }
    }

    pub fn tree(&self) -> &TestTree {
        &self.tree
    }

    pub fn into_tree(self) -> TestTree {
        self.tree
    }

    pub fn current_suite(&self) -> NodeIndex {
        self.current_suite
    }

    pub fn current_test(&self) -> NodeIndex {
        self.current_test
    }

    pub(crate) fn set_current(&mut self, suite: NodeIndex, test: NodeIndex) {
        self.current_suite = suite;
        self.current_test = test;
    }

    pub fn begin_suite(&mut self, name: &str) -> Result<()> {
        let parent = self.current_suite;
        let top_level = parent == self.tree.root();
        let kind = if top_level {
            NodeKind::RootSuite
        } else {
            NodeKind::Suite
        };

        let suite = self.tree.add_child(parent, name, kind);
        if top_level {
            let node = self.tree.node_mut(suite);
            node.display_name = format!("{name} - {}", self.label);
            node.metadata
                .insert(METADATA_FILE.to_string(), self.file.clone());
            node.metadata
                .insert(METADATA_CONFIGURATION.to_string(), self.label.clone());
        }

        debug!(suite = name, "begin suite");
        self.current_suite = suite;
        self.current_test = suite;
        Ok(())
    }

    pub fn visit_case(&mut self, name: &str) -> Result<()> {
        let case = self.tree.add_child(self.current_suite, name, NodeKind::Case);
        self.current_test = case;
        Ok(())
    }

    /// Close the current suite. Unmatched calls are logged and ignored.
    pub fn end_suite(&mut self, name: &str) -> Result<()> {
        let Some(parent) = self.tree.parent(self.current_suite) else {
            warn!(suite = name, "end of suite without an open suite");
            return Ok(());
        };

        let open = &self.tree.node(self.current_suite).name;
        if open != name {
            warn!(expected = %open, got = name, "end of suite name mismatch");
        }

        self.current_suite = parent;
        self.current_test = parent;
        Ok(())
    }
}

/// Exploration session: discovery only, tree published when the engine returns.
pub struct Explorer<'a> {
    builder: TreeBuilder,
    ctx: SessionContext<'a>,
}

impl<'a> Explorer<'a> {
    pub fn new(ctx: SessionContext<'a>) -> Self {
        Self {
            builder: TreeBuilder::new(ctx.file.clone(), &ctx.verdict),
            ctx,
        }
    }

    pub fn tree(&self) -> &TestTree {
        self.builder.tree()
    }

    /// Publish the discovered tree and hand it back.
    pub fn finish(self) -> TestTree {
        let Explorer { builder, mut ctx } = self;
        let tree = builder.into_tree();
        ctx.sink.publish(ModelMessage::TestModel { tree: tree.clone() });
        tree
    }
}

impl Boundary for Explorer<'_> {
    fn progress(&mut self) -> &mut dyn ProgressMonitor {
        &mut *self.ctx.progress
    }
}

impl TreeVisitor for Explorer<'_> {
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
