#![no_main]
use libfuzzer_sys::fuzz_target;

use boostlink::core::{EmptyFilterSet, ModelMessage, TracingProgress};
use boostlink::formats::pe::Architecture;
use boostlink::session::{ExecutionListener, Runner, SessionContext, TreeVisitor};
use boostlink::triage::{BuildConfiguration, TestabilityVerdict};

const NAMES: [&str; 4] = ["A", "B", "t1", "t2"];

// Arbitrary event orders must never panic and must close every step.
fuzz_target!(|data: &[u8]| {
    let verdict = TestabilityVerdict {
        architecture: Architecture::X86,
        configuration: BuildConfiguration::Debug,
        framework_module: "boost_unit_test_framework.dll".to_string(),
    };
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let filter = EmptyFilterSet;
    let ctx = SessionContext::new("fuzz.dll", verdict, &mut sink, &mut progress);
    let mut runner = Runner::new(ctx, &filter);

    for pair in data.chunks(2) {
        let op = pair[0] % 14;
        let name = NAMES[pair.get(1).copied().unwrap_or(0) as usize % NAMES.len()];
        let suite = name.len() == 1;
        let _ = match op {
            0 => runner.begin_suite(name),
            1 => runner.visit_case(name),
            2 => runner.end_suite(name),
            3 => runner.should_skip(name),
            4 => runner.test_start(2),
            5 => runner.test_finish(),
            6 => runner.test_aborted(),
            7 => runner.test_unit_start(name, suite),
            8 => runner.test_unit_finish(name, suite, 1),
            9 => runner.test_unit_skipped(name, suite),
            10 => runner.test_unit_aborted(name, suite),
            11 => runner.assertion_result(pair.len() == 2),
            12 => runner.exception_caught(name),
            _ => {
                runner.report_error(name);
                true
            }
        };
    }
    let _ = runner.finish();
});
