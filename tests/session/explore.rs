//! Discovery sessions fed by scripted registry walks.

use boostlink::core::{ModelMessage, NodeKind, ProgressMonitor, TracingProgress};
use boostlink::session::{Explorer, SessionContext, TreeVisitor};

use crate::common::{debug_x86, Transcript};

fn walk(explorer: &mut Explorer<'_>) {
    assert!(explorer.begin_suite("Master"));
    assert!(explorer.visit_case("t1"));
    assert!(explorer.begin_suite("Inner"));
    assert!(explorer.visit_case("t2"));
    assert!(explorer.end_suite("Inner"));
    assert!(explorer.end_suite("Master"));
}

#[test]
fn test_tree_published_once_after_walk() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let ctx = SessionContext::new("c:/tests/a.dll", debug_x86(), &mut sink, &mut progress);
    let mut explorer = Explorer::new(ctx);
    walk(&mut explorer);
    let tree = explorer.finish();

    let transcript = Transcript::new(&sink);
    assert_eq!(transcript.order, vec!["model"]);
    assert_eq!(transcript.models[0].len(), tree.len());
    assert_eq!(tree.len(), 5);
    assert_eq!(tree.leaf_count(tree.root()), 2);

    let t2 = tree.find("c:/tests/a.dll: Master/Inner/t2").unwrap();
    let inner = tree.parent(t2).unwrap();
    assert_eq!(tree.node(inner).kind, NodeKind::Suite);
    assert_eq!(tree.node(t2).full_name, "Master/Inner/t2");
}

#[test]
fn test_root_suite_carries_configuration() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let ctx = SessionContext::new("c:/tests/a.dll", debug_x86(), &mut sink, &mut progress);
    let mut explorer = Explorer::new(ctx);
    walk(&mut explorer);
    let tree = explorer.finish();

    let master = tree.find("c:/tests/a.dll: /Master").unwrap();
    let node = tree.node(master);
    assert_eq!(node.kind, NodeKind::RootSuite);
    assert_eq!(node.display_name, "Master - x86 (Debug)");
    assert_eq!(node.metadata["Configuration"], "x86 (Debug)");
    assert_eq!(node.metadata["File"], "c:/tests/a.dll");
}

#[test]
fn test_unbalanced_walk_keeps_going() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let ctx = SessionContext::new("a.dll", debug_x86(), &mut sink, &mut progress);
    let mut explorer = Explorer::new(ctx);

    assert!(explorer.end_suite("ghost"));
    assert!(explorer.begin_suite("Master"));
    assert!(explorer.visit_case("t1"));
    assert!(explorer.end_suite("Master"));
    assert!(explorer.end_suite("Master"));
    let tree = explorer.finish();

    assert_eq!(tree.leaf_count(tree.root()), 1);
    assert!(!progress.is_canceled());
}
