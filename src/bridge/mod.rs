//! Native engine entry points and the library that exports them.
//!
//! A bridge library is loaded per image (its location depends on the image's
//! architecture and build configuration), asked for one named entry point,
//! and released again on every exit path through [`BridgeHandle`].

pub mod ffi;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::session::callbacks::{ExecutionListener, TreeVisitor};

/// Callback set handed to an entry point.
pub enum SessionCallbacks<'a> {
    /// Registry walk only
    Explore(&'a mut dyn TreeVisitor),
    /// Registry re-walk with skip queries, then execution events
    Run(&'a mut dyn ExecutionListener),
}

impl SessionCallbacks<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionCallbacks::Explore(_) => "explore",
            SessionCallbacks::Run(_) => "run",
        }
    }
}

impl fmt::Debug for SessionCallbacks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionCallbacks").field(&self.kind()).finish()
    }
}

/// One entry point of the native engine.
///
/// The call returns once the engine is done with the file, whether it
/// finished, was asked to stop, or gave up half way.
pub trait EntryPoint {
    fn call(&mut self, file: &Path, callbacks: SessionCallbacks<'_>) -> Result<()>;
}

/// A loaded bridge library.
pub trait BridgeLibrary {
    /// Look up an exported entry point by name
    fn resolve(&mut self, name: &str) -> Option<Box<dyn EntryPoint + '_>>;
    /// Unload; called exactly once by [`BridgeHandle`]
    fn release(&mut self);
}

/// Loads bridge libraries from disk (or wherever the host keeps them).
pub trait BridgeLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn BridgeLibrary>>;
}

/// Scoped ownership of a loaded library; released when dropped.
pub struct BridgeHandle {
    library: Box<dyn BridgeLibrary>,
    path: PathBuf,
}

impl BridgeHandle {
    pub fn acquire(loader: &dyn BridgeLoader, path: &Path) -> Result<Self> {
        let library = loader.load(path)?;
        debug!(library = %path.display(), "bridge library loaded");
        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&mut self, name: &str) -> Result<Box<dyn EntryPoint + '_>> {
        let path = self.path.display().to_string();
        self.library.resolve(name).ok_or_else(|| {
            BridgeError::Bridge(format!("entry point {name} not found in {path}"))
        })
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.library.release();
        debug!(library = %self.path.display(), "bridge library released");
    }
}

impl fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeHandle").field("path", &self.path).finish()
    }
}
