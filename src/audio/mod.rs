//! System audio mute control
//!
//! Every operation follows the same lifecycle on the calling thread:
//! initialize the platform session (unless an ambient caller already did),
//! acquire the default output endpoint, perform exactly one read or write of
//! the mute flag, then release the endpoint and finally the session. Nothing
//! is cached between calls.
//!
//! Platform specifics live behind [`AudioBackend`]; see
//! [`crate::platform`] for the implementations.

mod session;

pub use session::SessionGuard;

use crate::error::{AgentError, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of the per-thread session initialization step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInit {
    /// This call initialized the session and must tear it down
    Initialized,
    /// The session was already set up by someone else; leave it alone
    Ambient,
}

/// Platform audio API
#[cfg_attr(test, mockall::automock)]
pub trait AudioBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Initialize the calling thread's audio session
    fn init_session(&self) -> Result<SessionInit>;

    /// Undo a session initialization performed by `init_session`
    fn uninit_session(&self) -> Result<()>;

    /// Acquire the default output endpoint's volume control
    fn default_endpoint(&self) -> Result<Box<dyn EndpointVolume>>;
}

/// An acquired endpoint volume control. Dropping it releases the handle.
#[cfg_attr(test, mockall::automock)]
pub trait EndpointVolume {
    /// Read the mute flag
    fn mute(&self) -> Result<bool>;

    /// Write the mute flag
    fn set_mute(&self, muted: bool) -> Result<()>;
}

/// Audio support detected once at startup
#[derive(Clone)]
pub enum AudioSubsystem {
    /// No usable audio API; every operation short-circuits
    Unavailable {
        /// Why the subsystem is unavailable
        reason: String,
    },
    /// A backend able to hand out endpoint handles
    Available(Arc<dyn AudioBackend>),
}

impl AudioSubsystem {
    /// Unavailable subsystem with the given reason
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether audio operations can be attempted
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Backend name or the unavailability reason, for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Self::Available(backend) => format!("available ({})", backend.name()),
            Self::Unavailable { reason } => format!("unavailable ({})", reason),
        }
    }
}

impl std::fmt::Debug for AudioSubsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AudioSubsystem::{}", self.describe())
    }
}

/// Mute operations on the default output device
#[derive(Debug, Clone)]
pub struct AudioGateway {
    subsystem: AudioSubsystem,
}

impl AudioGateway {
    /// Create a gateway over a detected subsystem
    pub fn new(subsystem: AudioSubsystem) -> Self {
        Self { subsystem }
    }

    /// Whether the subsystem was loaded
    pub fn is_available(&self) -> bool {
        self.subsystem.is_available()
    }

    /// Underlying subsystem
    pub fn subsystem(&self) -> &AudioSubsystem {
        &self.subsystem
    }

    /// Set the mute flag
    pub fn set_mute(&self, muted: bool) -> Result<()> {
        self.with_endpoint(|endpoint| endpoint.set_mute(muted))?;
        info!("System mute state set to: {}", muted);
        Ok(())
    }

    /// Read the mute flag
    pub fn mute_status(&self) -> Result<bool> {
        let muted = self.with_endpoint(|endpoint| endpoint.mute())?;
        debug!("Current system mute status: {}", muted);
        Ok(muted)
    }

    /// Invert the mute flag and return the new state.
    ///
    /// The read and the write each run their own acquire/release cycle. A
    /// failed read aborts before any write is attempted.
    pub fn toggle_mute(&self) -> Result<bool> {
        let current = self.mute_status()?;
        let next = !current;
        self.set_mute(next)?;
        Ok(next)
    }

    fn with_endpoint<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn EndpointVolume) -> Result<T>,
    {
        let backend = match &self.subsystem {
            AudioSubsystem::Available(backend) => backend.as_ref(),
            AudioSubsystem::Unavailable { reason } => {
                return Err(AgentError::AudioUnavailable(reason.clone()));
            }
        };

        // The guard is declared first so the endpoint is released before the
        // session is torn down.
        let _session = SessionGuard::enter(backend)?;
        let endpoint = backend.default_endpoint()?;
        op(endpoint.as_ref())
    }
}
