//! C ABI for native engines.
//!
//! An engine entry point receives the image path and a callback table. Each
//! table carries an opaque `ctx` that must be passed back unchanged as the
//! first argument of every callback. Strings cross the boundary as
//! NUL-terminated UTF-16.
//!
//! Callbacks never unwind into the engine: the trampolines catch panics and
//! answer "stop".

use std::collections::HashMap;
use std::ffi::c_void;
use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::slice;

use tracing::{debug, error};

use super::{BridgeLibrary, BridgeLoader, EntryPoint, SessionCallbacks};
use crate::error::{BridgeError, Result};
use crate::session::callbacks::{ExecutionListener, TreeVisitor};

/// NUL-terminated UTF-16 string owned by the caller
pub type WideStr = *const u16;

pub type NameFn = extern "C" fn(ctx: *mut c_void, name: WideStr) -> bool;
pub type UnitFn = extern "C" fn(ctx: *mut c_void, name: WideStr, is_suite: bool) -> bool;
pub type UnitFinishFn =
    extern "C" fn(ctx: *mut c_void, name: WideStr, is_suite: bool, elapsed_micros: u64) -> bool;
pub type CountFn = extern "C" fn(ctx: *mut c_void, leaf_count: u64) -> bool;
pub type EventFn = extern "C" fn(ctx: *mut c_void) -> bool;
pub type AssertionFn = extern "C" fn(ctx: *mut c_void, passed: bool) -> bool;
pub type ReportFn = extern "C" fn(ctx: *mut c_void, text: WideStr);

/// Discovery callbacks
#[repr(C)]
pub struct ExploreCallbacks {
    pub ctx: *mut c_void,
    pub visit_test_case: NameFn,
    pub begin_visit_test_suite: NameFn,
    pub end_visit_test_suite: NameFn,
    pub error_reporter: ReportFn,
}

/// Execution callbacks, including the re-walk and skip query
#[repr(C)]
pub struct RunCallbacks {
    pub ctx: *mut c_void,
    pub visit_test_case: NameFn,
    pub begin_visit_test_suite: NameFn,
    pub end_visit_test_suite: NameFn,
    pub should_skip: NameFn,
    pub test_start: CountFn,
    pub test_finish: EventFn,
    pub test_aborted: EventFn,
    pub test_unit_start: UnitFn,
    pub test_unit_finish: UnitFinishFn,
    pub test_unit_skipped: UnitFn,
    pub test_unit_aborted: UnitFn,
    pub assertion_result: AssertionFn,
    pub exception_caught: NameFn,
    pub error_reporter: ReportFn,
}

/// `BoostTestExplore`-style entry point
pub type ExploreEntryFn = unsafe extern "C" fn(file: WideStr, callbacks: *const ExploreCallbacks);
/// `BoostTestRun`-style entry point
pub type RunEntryFn = unsafe extern "C" fn(file: WideStr, callbacks: *const RunCallbacks);

/// Encode for the engine, NUL included.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(iter::once(0)).collect()
}

/// Decode a string received from the engine. Null reads as empty.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated UTF-16 buffer.
pub unsafe fn from_wide(ptr: WideStr) -> String {
    if ptr.is_null() {
        return String::new();
    }
    let mut len = 0;
    while *ptr.add(len) != 0 {
        len += 1;
    }
    String::from_utf16_lossy(slice::from_raw_parts(ptr, len))
}

fn shield<R>(event: &'static str, stop: R, body: impl FnOnce() -> R) -> R {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|_| {
        error!(event, "panic escaped a callback");
        stop
    })
}

unsafe fn visitor<'a>(ctx: *mut c_void) -> &'a mut dyn TreeVisitor {
    &mut **(ctx as *mut &mut dyn TreeVisitor)
}

unsafe fn listener<'a>(ctx: *mut c_void) -> &'a mut dyn ExecutionListener {
    &mut **(ctx as *mut &mut dyn ExecutionListener)
}

extern "C" fn explore_visit_case(ctx: *mut c_void, name: WideStr) -> bool {
    shield("visit_test_case", false, || unsafe {
        visitor(ctx).visit_case(&from_wide(name))
    })
}

extern "C" fn explore_begin_suite(ctx: *mut c_void, name: WideStr) -> bool {
    shield("begin_visit_test_suite", false, || unsafe {
        visitor(ctx).begin_suite(&from_wide(name))
    })
}

extern "C" fn explore_end_suite(ctx: *mut c_void, name: WideStr) -> bool {
    shield("end_visit_test_suite", false, || unsafe {
        visitor(ctx).end_suite(&from_wide(name))
    })
}

extern "C" fn explore_report(ctx: *mut c_void, text: WideStr) {
    shield("error_reporter", (), || unsafe {
        visitor(ctx).report_error(&from_wide(text))
    })
}

extern "C" fn run_visit_case(ctx: *mut c_void, name: WideStr) -> bool {
    shield("visit_test_case", false, || unsafe {
        listener(ctx).visit_case(&from_wide(name))
    })
}

extern "C" fn run_begin_suite(ctx: *mut c_void, name: WideStr) -> bool {
    shield("begin_visit_test_suite", false, || unsafe {
        listener(ctx).begin_suite(&from_wide(name))
    })
}

extern "C" fn run_end_suite(ctx: *mut c_void, name: WideStr) -> bool {
    shield("end_visit_test_suite", false, || unsafe {
        listener(ctx).end_suite(&from_wide(name))
    })
}

// A panic here must not enable a test, so it answers "skip".
extern "C" fn run_should_skip(ctx: *mut c_void, name: WideStr) -> bool {
    shield("should_skip", true, || unsafe {
        listener(ctx).should_skip(&from_wide(name))
    })
}

extern "C" fn run_test_start(ctx: *mut c_void, leaf_count: u64) -> bool {
    shield("test_start", false, || unsafe { listener(ctx).test_start(leaf_count) })
}

extern "C" fn run_test_finish(ctx: *mut c_void) -> bool {
    shield("test_finish", false, || unsafe { listener(ctx).test_finish() })
}

extern "C" fn run_test_aborted(ctx: *mut c_void) -> bool {
    shield("test_aborted", false, || unsafe { listener(ctx).test_aborted() })
}

extern "C" fn run_unit_start(ctx: *mut c_void, name: WideStr, is_suite: bool) -> bool {
    shield("test_unit_start", false, || unsafe {
        listener(ctx).test_unit_start(&from_wide(name), is_suite)
    })
}

extern "C" fn run_unit_finish(
    ctx: *mut c_void,
    name: WideStr,
    is_suite: bool,
    elapsed_micros: u64,
) -> bool {
    shield("test_unit_finish", false, || unsafe {
        listener(ctx).test_unit_finish(&from_wide(name), is_suite, elapsed_micros)
    })
}

extern "C" fn run_unit_skipped(ctx: *mut c_void, name: WideStr, is_suite: bool) -> bool {
    shield("test_unit_skipped", false, || unsafe {
        listener(ctx).test_unit_skipped(&from_wide(name), is_suite)
    })
}

extern "C" fn run_unit_aborted(ctx: *mut c_void, name: WideStr, is_suite: bool) -> bool {
    shield("test_unit_aborted", false, || unsafe {
        listener(ctx).test_unit_aborted(&from_wide(name), is_suite)
    })
}

extern "C" fn run_assertion(ctx: *mut c_void, passed: bool) -> bool {
    shield("assertion_result", false, || unsafe {
        listener(ctx).assertion_result(passed)
    })
}

extern "C" fn run_exception(ctx: *mut c_void, text: WideStr) -> bool {
    shield("exception_caught", false, || unsafe {
        listener(ctx).exception_caught(&from_wide(text))
    })
}

extern "C" fn run_report(ctx: *mut c_void, text: WideStr) {
    shield("error_reporter", (), || unsafe {
        listener(ctx).report_error(&from_wide(text))
    })
}

impl ExploreCallbacks {
    /// Table over `visitor`; valid as long as the borrow is.
    pub fn new(visitor: &mut &mut dyn TreeVisitor) -> Self {
        Self {
            ctx: visitor as *mut &mut dyn TreeVisitor as *mut c_void,
            visit_test_case: explore_visit_case,
            begin_visit_test_suite: explore_begin_suite,
            end_visit_test_suite: explore_end_suite,
            error_reporter: explore_report,
        }
    }
}

impl RunCallbacks {
    /// Table over `listener`; valid as long as the borrow is.
    pub fn new(listener: &mut &mut dyn ExecutionListener) -> Self {
        Self {
            ctx: listener as *mut &mut dyn ExecutionListener as *mut c_void,
            visit_test_case: run_visit_case,
            begin_visit_test_suite: run_begin_suite,
            end_visit_test_suite: run_end_suite,
            should_skip: run_should_skip,
            test_start: run_test_start,
            test_finish: run_test_finish,
            test_aborted: run_test_aborted,
            test_unit_start: run_unit_start,
            test_unit_finish: run_unit_finish,
            test_unit_skipped: run_unit_skipped,
            test_unit_aborted: run_unit_aborted,
            assertion_result: run_assertion,
            exception_caught: run_exception,
            error_reporter: run_report,
        }
    }
}

/// An exported engine function.
#[derive(Debug, Clone, Copy)]
pub enum ForeignEntry {
    Explore(ExploreEntryFn),
    Run(RunEntryFn),
}

impl EntryPoint for ForeignEntry {
    fn call(&mut self, file: &Path, callbacks: SessionCallbacks<'_>) -> Result<()> {
        let path = to_wide(&file.to_string_lossy());
        match (*self, callbacks) {
            (ForeignEntry::Explore(entry), SessionCallbacks::Explore(mut visitor)) => {
                let table = ExploreCallbacks::new(&mut visitor);
                unsafe { entry(path.as_ptr(), &table) };
                Ok(())
            }
            (ForeignEntry::Run(entry), SessionCallbacks::Run(mut listener)) => {
                let table = RunCallbacks::new(&mut listener);
                unsafe { entry(path.as_ptr(), &table) };
                Ok(())
            }
            (_, callbacks) => Err(BridgeError::Bridge(format!(
                "entry point cannot drive a {} session",
                callbacks.kind()
            ))),
        }
    }
}

/// Engine entry points linked into the host process, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct StaticLibrary {
    entries: HashMap<String, ForeignEntry>,
}

impl StaticLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explore(mut self, name: &str, entry: ExploreEntryFn) -> Self {
        self.entries.insert(name.to_string(), ForeignEntry::Explore(entry));
        self
    }

    pub fn with_run(mut self, name: &str, entry: RunEntryFn) -> Self {
        self.entries.insert(name.to_string(), ForeignEntry::Run(entry));
        self
    }
}

impl BridgeLibrary for StaticLibrary {
    fn resolve(&mut self, name: &str) -> Option<Box<dyn EntryPoint + '_>> {
        self.entries
            .get(name)
            .map(|entry| Box::new(*entry) as Box<dyn EntryPoint>)
    }

    fn release(&mut self) {
        debug!(entries = self.entries.len(), "static bridge released");
    }
}

/// Hands out the same [`StaticLibrary`] whatever path is asked for.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    library: StaticLibrary,
}

impl StaticLoader {
    pub fn new(library: StaticLibrary) -> Self {
        Self { library }
    }
}

impl BridgeLoader for StaticLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn BridgeLibrary>> {
        debug!(library = %path.display(), "resolving statically linked bridge");
        Ok(Box::new(self.library.clone()))
    }
}
