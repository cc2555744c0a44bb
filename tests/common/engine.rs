//! Native-style engines that drive the C callback tables.
//!
//! The registry holds suite "A" with cases "t1" and "t2"; "t2" throws.

use boostlink::bridge::ffi::{from_wide, to_wide, ExploreCallbacks, RunCallbacks, WideStr};

const CASES: [&str; 2] = ["t1", "t2"];

/// Walk the registry through the exploration table.
///
/// # Safety
/// `callbacks` must point to a live table.
pub unsafe extern "C" fn explore_a(_file: WideStr, callbacks: *const ExploreCallbacks) {
    let cb = &*callbacks;
    let suite = to_wide("A");
    if !(cb.begin_visit_test_suite)(cb.ctx, suite.as_ptr()) {
        return;
    }
    for case in CASES {
        let case = to_wide(case);
        if !(cb.visit_test_case)(cb.ctx, case.as_ptr()) {
            return;
        }
    }
    (cb.end_visit_test_suite)(cb.ctx, suite.as_ptr());
}

/// Re-walk with skip queries, then run every enabled case.
///
/// # Safety
/// `callbacks` must point to a live table.
pub unsafe extern "C" fn run_a(file: WideStr, callbacks: *const RunCallbacks) {
    let cb = &*callbacks;
    if from_wide(file).is_empty() {
        let text = to_wide("no file given");
        (cb.error_reporter)(cb.ctx, text.as_ptr());
        return;
    }

    let suite = to_wide("A");
    let cases: Vec<Vec<u16>> = CASES.iter().map(|c| to_wide(c)).collect();

    if !(cb.begin_visit_test_suite)(cb.ctx, suite.as_ptr()) {
        return;
    }
    let suite_skipped = (cb.should_skip)(cb.ctx, suite.as_ptr());
    let mut enabled = Vec::new();
    for case in &cases {
        if !(cb.visit_test_case)(cb.ctx, case.as_ptr()) {
            return;
        }
        enabled.push(!suite_skipped && !(cb.should_skip)(cb.ctx, case.as_ptr()));
    }
    (cb.end_visit_test_suite)(cb.ctx, suite.as_ptr());

    let count = enabled.iter().filter(|e| **e).count() as u64;
    if !(cb.test_start)(cb.ctx, count) {
        return;
    }
    if !(cb.test_unit_start)(cb.ctx, suite.as_ptr(), true) {
        return;
    }
    for (index, case) in cases.iter().enumerate() {
        if !(cb.test_unit_start)(cb.ctx, case.as_ptr(), false) {
            return;
        }
        if !enabled[index] {
            if !(cb.test_unit_skipped)(cb.ctx, case.as_ptr(), false) {
                return;
            }
            continue;
        }
        if index == 1 {
            let what = to_wide("std::runtime_error: boom");
            (cb.exception_caught)(cb.ctx, what.as_ptr());
        } else {
            (cb.assertion_result)(cb.ctx, true);
            (cb.assertion_result)(cb.ctx, true);
        }
        if !(cb.test_unit_finish)(cb.ctx, case.as_ptr(), false, 100) {
            return;
        }
    }
    if !(cb.test_unit_finish)(cb.ctx, suite.as_ptr(), true, 300) {
        return;
    }
    (cb.test_finish)(cb.ctx);
}

/// Starts "A" and "t1", then dies.
///
/// # Safety
/// `callbacks` must point to a live table.
pub unsafe extern "C" fn run_a_then_crash(_file: WideStr, callbacks: *const RunCallbacks) {
    let cb = &*callbacks;
    let suite = to_wide("A");
    let t1 = to_wide("t1");
    (cb.begin_visit_test_suite)(cb.ctx, suite.as_ptr());
    (cb.visit_test_case)(cb.ctx, t1.as_ptr());
    (cb.end_visit_test_suite)(cb.ctx, suite.as_ptr());
    (cb.test_start)(cb.ctx, 1);
    (cb.test_unit_start)(cb.ctx, suite.as_ptr(), true);
    (cb.test_unit_start)(cb.ctx, t1.as_ptr(), false);
}
