//! Per-run context shared by the discovery and execution sessions, and the
//! failure boundary every callback body runs behind.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::error;

use crate::core::messages::{MessageSink, ProgressMonitor};
use crate::error::Result;
use crate::log_error;
use crate::triage::classify::TestabilityVerdict;

/// Image under test and the collaborators receiving session output
pub struct SessionContext<'a> {
    pub file: String,
    pub verdict: TestabilityVerdict,
    pub sink: &'a mut dyn MessageSink,
    pub progress: &'a mut dyn ProgressMonitor,
}

impl<'a> SessionContext<'a> {
    pub fn new(
        file: impl Into<String>,
        verdict: TestabilityVerdict,
        sink: &'a mut dyn MessageSink,
        progress: &'a mut dyn ProgressMonitor,
    ) -> Self {
        Self {
            file: file.into(),
            verdict,
            sink,
            progress,
        }
    }

    /// File name without directories, for status text
    pub fn file_name(&self) -> String {
        Path::new(&self.file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.clone())
    }
}

/// Session state reachable from the boundary
pub(crate) trait Boundary {
    fn progress(&mut self) -> &mut dyn ProgressMonitor;
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one callback body; errors and panics are logged and cancel the run.
///
/// Returns the continue signal: `false` once the run is canceled.
pub(crate) fn guard<S, F>(session: &mut S, event: &'static str, body: F) -> bool
where
    S: Boundary + ?Sized,
    F: FnOnce(&mut S) -> Result<()>,
{
    let failed = match panic::catch_unwind(AssertUnwindSafe(|| body(session))) {
        Ok(Ok(())) => false,
        Ok(Err(err)) => {
            log_error!(err, event);
            true
        }
        Err(payload) => {
            error!(
                event,
                panic = %panic_message(payload.as_ref()),
                "Unexpected panic while running tests"
            );
            true
        }
    };

    let progress = session.progress();
    if failed {
        progress.cancel();
    }
    !progress.is_canceled()
}
