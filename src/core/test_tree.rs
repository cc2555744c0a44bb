//! Hierarchical test model built during discovery.
//!
//! Nodes live in an arena and refer to each other by [`NodeIndex`]; the
//! parent link is only used for walking toward the root. Ids are resolved
//! through an index computed as nodes are inserted, so the execution phase
//! never scans the tree.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Metadata key holding the tested file
pub const METADATA_FILE: &str = "File";
/// Metadata key holding the `arch (configuration)` label
pub const METADATA_CONFIGURATION: &str = "Configuration";

/// Position of a node in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Role of a node in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// Synthetic model root owning everything discovered in one file
    Root,
    /// Top-level suite of a test image, decorated with build information
    RootSuite,
    Suite,
    Case,
}

/// One suite or case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestNode {
    pub id: String,
    /// Name reported by the engine
    pub name: String,
    /// Name shown to users; differs from `name` only for the root suite
    pub display_name: String,
    /// Slash-joined engine names from the root, empty for the root itself
    pub full_name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    pub metadata: BTreeMap<String, String>,
}

impl TestNode {
    pub fn is_test_case(&self) -> bool {
        self.kind == NodeKind::Case
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Test tree for one file
#[derive(Debug, Clone, Serialize)]
pub struct TestTree {
    file: String,
    nodes: Vec<TestNode>,
    #[serde(skip)]
    index: HashMap<String, NodeIndex>,
}

impl TestTree {
    pub fn new(file: impl Into<String>) -> Self {
        let file = file.into();
        let root = TestNode {
            id: file.clone(),
            name: "Root".to_string(),
            display_name: "Root".to_string(),
            full_name: String::new(),
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
            metadata: BTreeMap::new(),
        };
        let mut index = HashMap::new();
        index.insert(root.id.clone(), NodeIndex(0));

        Self {
            file,
            nodes: vec![root],
            index,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, index: NodeIndex) -> &TestNode {
        &self.nodes[index.0]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TestNode {
        &mut self.nodes[index.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &TestNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    /// Deterministic id of the child `name` under `parent`.
    pub fn child_id(&self, parent: NodeIndex, name: &str) -> String {
        format!("{}: {}/{}", self.file, self.node(parent).full_name, name)
    }

    /// Append a child node, keeping discovery order.
    ///
    /// A duplicate id leaves the index pointing at the first node.
    pub fn add_child(&mut self, parent: NodeIndex, name: &str, kind: NodeKind) -> NodeIndex {
        let id = self.child_id(parent, name);
        let parent_full = &self.node(parent).full_name;
        let full_name = if parent_full.is_empty() {
            name.to_string()
        } else {
            format!("{parent_full}/{name}")
        };

        let index = NodeIndex(self.nodes.len());
        if self.index.contains_key(&id) {
            warn!(%id, "duplicate test id; keeping the first node");
        } else {
            self.index.insert(id.clone(), index);
        }

        self.nodes.push(TestNode {
            id,
            name: name.to_string(),
            display_name: name.to_string(),
            full_name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            metadata: BTreeMap::new(),
        });
        self.nodes[parent.0].children.push(index);
        index
    }

    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.node(index).parent
    }

    /// Ancestors from the direct parent up to the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        std::iter::successors(self.parent(index), move |&i| self.parent(i))
    }

    /// Number of cases below `index`
    pub fn leaf_count(&self, index: NodeIndex) -> usize {
        let node = self.node(index);
        if node.is_test_case() {
            return 1;
        }
        node.children.iter().map(|&c| self.leaf_count(c)).sum()
    }
}
