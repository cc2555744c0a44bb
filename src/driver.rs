//! Per-file orchestration: inspect, classify, load the bridge, run a session.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::bridge::{BridgeHandle, BridgeLoader, SessionCallbacks};
use crate::core::filter::{EmptyFilterSet, FilterSet};
use crate::core::messages::{MessageSink, ProgressMonitor, SubProgress};
use crate::core::test_tree::TestTree;
use crate::error::Result;
use crate::formats::pe;
use crate::session::{Explorer, RunSummary, Runner, SessionContext};
use crate::triage::{classify, AdapterConfig, TestabilityVerdict};
use crate::{log_error, span_trace};

/// Options for a run
#[derive(Clone, Copy)]
pub struct ExecutionOptions<'a> {
    pub filter: &'a dyn FilterSet,
    /// Publish nothing and leave the engine alone
    pub skip_test_execution: bool,
}

impl Default for ExecutionOptions<'_> {
    fn default() -> Self {
        Self {
            filter: &EmptyFilterSet,
            skip_test_execution: false,
        }
    }
}

/// Result of running one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileRun {
    pub path: PathBuf,
    pub summary: RunSummary,
}

/// Drives the native engine over a set of candidate images.
pub struct TestDriver<L> {
    config: AdapterConfig,
    loader: L,
}

impl<L: BridgeLoader> TestDriver<L> {
    pub fn new(config: AdapterConfig, loader: L) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, loader })
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Inspect and classify one file. Anything that cannot be tested is
    /// logged and answered with `None`.
    pub fn triage(&self, path: &Path) -> Option<TestabilityVerdict> {
        let info = match pe::inspect_path(path, &self.config.io) {
            Ok(info) => info,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "cannot inspect file, skipping it");
                return None;
            }
        };

        let verdict = classify(&info, &self.config.classify);
        if verdict.is_none() {
            warn!(file = %path.display(), "file is not testable, skipping it");
        }
        verdict
    }

    /// Discover the tests of every testable file; one published tree per file.
    pub fn explore<P: AsRef<Path>>(
        &self,
        files: &[P],
        sink: &mut dyn MessageSink,
        progress: &mut dyn ProgressMonitor,
    ) -> Vec<TestTree> {
        progress.begin_task("Exploring tests.", work_units(files));
        let mut trees = Vec::new();
        for file in files {
            if progress.is_canceled() {
                info!("exploration canceled");
                break;
            }

            let path = file.as_ref();
            let _span = span_trace!("explore_file", file = %path.display()).entered();
            let Some(verdict) = self.triage(path) else {
                progress.worked(1);
                continue;
            };

            let mut file_progress = SubProgress::new(&mut *progress);
            match self.explore_file(path, verdict, &mut *sink, &mut file_progress) {
                Ok(tree) => trees.push(tree),
                Err(err) => {
                    log_error!(err, "exploring tests");
                }
            }
        }
        trees
    }

    /// Run the tests of every testable file.
    pub fn run<P: AsRef<Path>>(
        &self,
        files: &[P],
        options: &ExecutionOptions<'_>,
        sink: &mut dyn MessageSink,
        progress: &mut dyn ProgressMonitor,
    ) -> Vec<FileRun> {
        if options.skip_test_execution {
            info!("test execution skipped by request");
            return Vec::new();
        }

        progress.begin_task("Running tests.", work_units(files));
        let mut runs = Vec::new();
        for file in files {
            if progress.is_canceled() {
                info!("run canceled");
                break;
            }

            let path = file.as_ref();
            let _span = span_trace!("run_file", file = %path.display()).entered();
            let Some(verdict) = self.triage(path) else {
                progress.worked(1);
                continue;
            };

            let mut file_progress = SubProgress::new(&mut *progress);
            let filter = options.filter;
            match self.run_file(path, verdict, filter, &mut *sink, &mut file_progress) {
                Ok(summary) => runs.push(FileRun {
                    path: path.to_path_buf(),
                    summary,
                }),
                Err(err) => {
                    log_error!(err, "running tests");
                }
            }
        }
        runs
    }

    fn explore_file(
        &self,
        path: &Path,
        verdict: TestabilityVerdict,
        sink: &mut dyn MessageSink,
        progress: &mut dyn ProgressMonitor,
    ) -> Result<TestTree> {
        let bridge = &self.config.bridge;
        let library = bridge.library_path(verdict.architecture, verdict.configuration);
        let mut handle = BridgeHandle::acquire(&self.loader, &library)?;
        let mut entry = handle.entry(&bridge.explore_entry)?;

        let ctx = SessionContext::new(path.display().to_string(), verdict, sink, progress);
        let mut explorer = Explorer::new(ctx);
        entry.call(path, SessionCallbacks::Explore(&mut explorer))?;

        let tree = explorer.finish();
        debug!(nodes = tree.len(), "exploration finished");
        Ok(tree)
    }

    fn run_file(
        &self,
        path: &Path,
        verdict: TestabilityVerdict,
        filter: &dyn FilterSet,
        sink: &mut dyn MessageSink,
        progress: &mut dyn ProgressMonitor,
    ) -> Result<RunSummary> {
        let bridge = &self.config.bridge;
        let library = bridge.library_path(verdict.architecture, verdict.configuration);
        let mut handle = BridgeHandle::acquire(&self.loader, &library)?;
        let mut entry = handle.entry(&bridge.run_entry)?;

        let ctx = SessionContext::new(path.display().to_string(), verdict, sink, progress);
        let mut runner = Runner::new(ctx, filter);
        let called = entry.call(path, SessionCallbacks::Run(&mut runner));

        // Open steps are closed even when the engine could not be driven.
        let summary = runner.finish();
        called?;
        debug!(canceled = summary.canceled_steps, "run finished");
        Ok(summary)
    }
}

/// One unit per file, and never an empty task
fn work_units<P>(files: &[P]) -> u64 {
    files.len().max(1) as u64
}
