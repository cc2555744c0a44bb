//! The driver over on-disk images and statically linked engines.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use boostlink::bridge::ffi::{StaticLibrary, StaticLoader};
use boostlink::bridge::{BridgeLibrary, BridgeLoader, EntryPoint};
use boostlink::core::{ModelMessage, Outcome, ProgressMonitor, RuleFilterSet, TracingProgress};
use boostlink::formats::pe::{IMAGE_FILE_MACHINE_AMD64, IMAGE_FILE_MACHINE_I386};
use boostlink::triage::AdapterConfig;
use boostlink::{BridgeError, ExecutionOptions, TestDriver};

use crate::common::engine::{explore_a, run_a};
use crate::common::test_utils::create_image;
use crate::common::{Transcript, FRAMEWORK_DEBUG, FRAMEWORK_RELEASE};

fn engines() -> StaticLibrary {
    StaticLibrary::new()
        .with_explore("BoostTestExplore", explore_a)
        .with_run("BoostTestRun", run_a)
}

type Loaded = Rc<RefCell<Vec<String>>>;

/// Records which libraries were loaded and how often they were released.
struct Tracking {
    inner: StaticLibrary,
    loaded: Loaded,
    releases: Rc<Cell<u32>>,
}

struct TrackedLibrary {
    inner: StaticLibrary,
    releases: Rc<Cell<u32>>,
}

impl BridgeLibrary for TrackedLibrary {
    fn resolve(&mut self, name: &str) -> Option<Box<dyn EntryPoint + '_>> {
        self.inner.resolve(name)
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

impl BridgeLoader for Tracking {
    fn load(&self, path: &Path) -> boostlink::Result<Box<dyn BridgeLibrary>> {
        self.loaded
            .borrow_mut()
            .push(path.to_string_lossy().replace('\\', "/"));
        Ok(Box::new(TrackedLibrary {
            inner: self.inner.clone(),
            releases: Rc::clone(&self.releases),
        }))
    }
}

fn tracking(inner: StaticLibrary) -> (Tracking, Loaded, Rc<Cell<u32>>) {
    let loaded = Rc::new(RefCell::new(Vec::new()));
    let releases = Rc::new(Cell::new(0));
    let loader = Tracking {
        inner,
        loaded: Rc::clone(&loaded),
        releases: Rc::clone(&releases),
    };
    (loader, loaded, releases)
}

#[test]
fn test_explore_publishes_one_tree_per_testable_file() {
    let testable = create_image(IMAGE_FILE_MACHINE_I386, &["KERNEL32.dll", FRAMEWORK_DEBUG]);
    let plain = create_image(IMAGE_FILE_MACHINE_I386, &["KERNEL32.dll"]);
    let driver = TestDriver::new(AdapterConfig::default(), StaticLoader::new(engines())).unwrap();

    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let trees = driver.explore(&[testable.path(), plain.path()], &mut sink, &mut progress);

    assert_eq!(trees.len(), 1);
    assert_eq!(Transcript::new(&sink).models.len(), 1);
    assert_eq!(trees[0].leaf_count(trees[0].root()), 2);
}

#[test]
fn test_run_loads_bridge_for_architecture_and_configuration() {
    let debug = create_image(IMAGE_FILE_MACHINE_I386, &[FRAMEWORK_DEBUG]);
    let release = create_image(IMAGE_FILE_MACHINE_AMD64, &[FRAMEWORK_RELEASE]);
    let (loader, loaded, releases) = tracking(engines());
    let mut config = AdapterConfig::default();
    config.bridge.directory = "bridges".into();
    let driver = TestDriver::new(config, loader).unwrap();

    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let runs = driver.run(
        &[debug.path(), release.path()],
        &ExecutionOptions::default(),
        &mut sink,
        &mut progress,
    );

    assert_eq!(runs.len(), 2);
    assert_eq!(
        *loaded.borrow(),
        vec![
            "bridges/x86/Debug/BoostTestBridge.dll",
            "bridges/amd64/Release/BoostTestBridge.dll",
        ]
    );
    assert_eq!(releases.get(), 2);
    assert_eq!(progress.task.as_deref(), Some("Running tests."));
    assert_eq!(progress.total_work, 2);
    assert_eq!(progress.completed, 2);
    for run in &runs {
        assert_eq!(run.summary.root.as_ref().unwrap().outcome, Outcome::Error);
    }
}

#[test]
fn test_library_released_when_entry_point_missing() {
    let image = create_image(IMAGE_FILE_MACHINE_I386, &[FRAMEWORK_DEBUG]);
    let (loader, loaded, releases) = tracking(StaticLibrary::new());
    let driver = TestDriver::new(AdapterConfig::default(), loader).unwrap();

    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let runs = driver.run(&[image.path()], &ExecutionOptions::default(), &mut sink, &mut progress);

    assert!(runs.is_empty());
    assert!(sink.is_empty());
    assert_eq!(loaded.borrow().len(), 1);
    assert_eq!(releases.get(), 1);
}

#[test]
fn test_failed_load_skips_file() {
    struct Refusing;
    impl BridgeLoader for Refusing {
        fn load(&self, path: &Path) -> boostlink::Result<Box<dyn BridgeLibrary>> {
            Err(BridgeError::Bridge(format!("cannot load {}", path.display())))
        }
    }

    let image = create_image(IMAGE_FILE_MACHINE_I386, &[FRAMEWORK_DEBUG]);
    let driver = TestDriver::new(AdapterConfig::default(), Refusing).unwrap();
    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    assert!(driver.explore(&[image.path()], &mut sink, &mut progress).is_empty());
    assert!(!progress.is_canceled());
}

#[test]
fn test_filter_flows_into_run() {
    let image = create_image(IMAGE_FILE_MACHINE_I386, &[FRAMEWORK_DEBUG]);
    let driver = TestDriver::new(AdapterConfig::default(), StaticLoader::new(engines())).unwrap();
    let filter = RuleFilterSet::new().include("t1$").unwrap();
    let options = ExecutionOptions {
        filter: &filter,
        skip_test_execution: false,
    };

    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    let runs = driver.run(&[image.path()], &options, &mut sink, &mut progress);

    assert_eq!(runs.len(), 1);
    let transcript = Transcript::new(&sink);
    assert_eq!(transcript.outcome_of("/t2"), Some(Outcome::Skipped));
    assert_eq!(transcript.outcome_of("/t1"), Some(Outcome::Passed));
}

#[test]
fn test_canceled_progress_stops_before_next_file() {
    let image = create_image(IMAGE_FILE_MACHINE_I386, &[FRAMEWORK_DEBUG]);
    let (loader, loaded, _) = tracking(engines());
    let driver = TestDriver::new(AdapterConfig::default(), loader).unwrap();

    let mut sink: Vec<ModelMessage> = Vec::new();
    let mut progress = TracingProgress::new();
    progress.cancel();
    let runs = driver.run(&[image.path()], &ExecutionOptions::default(), &mut sink, &mut progress);

    assert!(runs.is_empty());
    assert!(loaded.borrow().is_empty());
}
