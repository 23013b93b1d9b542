//! Scoped platform session

use super::{AudioBackend, SessionInit};
use crate::error::Result;
use tracing::{debug, warn};

/// Holds a per-thread audio session for the duration of one operation.
///
/// Teardown happens on drop and only when this guard performed the
/// initialization. Teardown failures are logged and never replace the
/// operation's own result.
pub struct SessionGuard<'a> {
    backend: &'a dyn AudioBackend,
    init: SessionInit,
}

impl<'a> SessionGuard<'a> {
    /// Initialize the session on the current thread
    pub fn enter(backend: &'a dyn AudioBackend) -> Result<Self> {
        let init = backend.init_session()?;
        debug!("{} audio session entered ({:?})", backend.name(), init);
        Ok(Self { backend, init })
    }

    /// Whether this guard owns the initialization
    pub fn owns_session(&self) -> bool {
        self.init == SessionInit::Initialized
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if !self.owns_session() {
            return;
        }

        if let Err(e) = self.backend.uninit_session() {
            warn!("Error during audio session teardown: {}", e);
        }
    }
}
