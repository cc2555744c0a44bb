//! Sessions driven across the C callback tables.

use std::path::Path;

use boostlink::bridge::ffi::ForeignEntry;
use boostlink::bridge::{EntryPoint, SessionCallbacks};
use boostlink::core::{EmptyFilterSet, ModelMessage, Outcome, RuleFilterSet, TracingProgress};
use boostlink::session::{Explorer, Runner, SessionContext};

use crate::common::engine::{explore_a, run_a, run_a_then_crash};
use crate::common::{debug_x86, Transcript};

const FILE: &str = "c:/tests/a.dll";

#[test]
fn test_foreign_explore_builds_tree() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let ctx = SessionContext::new(FILE, debug_x86(), &mut sink, &mut progress);
    let mut explorer = Explorer::new(ctx);

    ForeignEntry::Explore(explore_a)
        .call(Path::new(FILE), SessionCallbacks::Explore(&mut explorer))
        .unwrap();
    let tree = explorer.finish();

    assert!(tree.find("c:/tests/a.dll: A/t1").is_some());
    assert!(tree.find("c:/tests/a.dll: A/t2").is_some());
    assert_eq!(Transcript::new(&sink).models.len(), 1);
}

#[test]
fn test_foreign_run_reports_results() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let filter = EmptyFilterSet;
    let ctx = SessionContext::new(FILE, debug_x86(), &mut sink, &mut progress);
    let mut runner = Runner::new(ctx, &filter);

    ForeignEntry::Run(run_a)
        .call(Path::new(FILE), SessionCallbacks::Run(&mut runner))
        .unwrap();
    let summary = runner.finish();

    let transcript = Transcript::new(&sink);
    assert_eq!(transcript.outcome_of("A/t1"), Some(Outcome::Passed));
    assert_eq!(transcript.outcome_of("A/t2"), Some(Outcome::Error));
    assert_eq!(transcript.outcome_of("/A"), Some(Outcome::Error));
    assert_eq!(summary.root.unwrap().outcome, Outcome::Error);
    assert_eq!(summary.canceled_steps, 0);
    assert_eq!(progress.completed, 2);
}

#[test]
fn test_foreign_run_honours_skip_answers() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let filter = RuleFilterSet::new().exclude("t2$").unwrap();
    let ctx = SessionContext::new(FILE, debug_x86(), &mut sink, &mut progress);
    let mut runner = Runner::new(ctx, &filter);

    ForeignEntry::Run(run_a)
        .call(Path::new(FILE), SessionCallbacks::Run(&mut runner))
        .unwrap();
    let summary = runner.finish();

    let transcript = Transcript::new(&sink);
    assert_eq!(transcript.outcome_of("A/t1"), Some(Outcome::Passed));
    assert_eq!(transcript.outcome_of("A/t2"), Some(Outcome::Skipped));
    assert_eq!(summary.root.unwrap().outcome, Outcome::Skipped);
    assert_eq!(progress.total_work, 1);
}

#[test]
fn test_foreign_crash_is_cleaned_up() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let filter = EmptyFilterSet;
    let ctx = SessionContext::new(FILE, debug_x86(), &mut sink, &mut progress);
    let mut runner = Runner::new(ctx, &filter);

    ForeignEntry::Run(run_a_then_crash)
        .call(Path::new(FILE), SessionCallbacks::Run(&mut runner))
        .unwrap();
    let summary = runner.finish();

    assert_eq!(summary.canceled_steps, 3);
    let ids: Vec<_> = Transcript::new(&sink)
        .finished_ids()
        .into_iter()
        .map(|(id, outcome)| {
            assert_eq!(outcome, Outcome::Canceled);
            id
        })
        .collect();
    assert_eq!(
        ids,
        vec!["c:/tests/a.dll: A/t1", "c:/tests/a.dll: /A", "c:/tests/a.dll"]
    );
}

#[test]
fn test_mismatched_entry_kind_is_an_error() {
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let ctx = SessionContext::new(FILE, debug_x86(), &mut sink, &mut progress);
    let mut explorer = Explorer::new(ctx);

    let result = ForeignEntry::Run(run_a)
        .call(Path::new(FILE), SessionCallbacks::Explore(&mut explorer));
    assert!(result.is_err());
    assert!(explorer.tree().len() == 1);
}
