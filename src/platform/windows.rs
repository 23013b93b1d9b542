//! Windows audio backend
//!
//! Uses the Core Audio COM interfaces: the default render endpoint is
//! looked up through `IMMDeviceEnumerator` and its `IAudioEndpointVolume`
//! is activated for the mute flag. COM is initialized apartment-threaded on
//! the calling thread for the duration of one operation.

use crate::audio::{AudioBackend, EndpointVolume, SessionInit};
use crate::error::{AgentError, Result};
use tracing::{debug, warn};
use windows::core::{IUnknown, Interface};
use windows::Win32::Foundation::{BOOL, RPC_E_CHANGED_MODE};
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::Media::Audio::{
    eConsole, eRender, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
};

/// Core Audio backend
#[derive(Debug, Default)]
pub struct CoreAudioBackend;

impl CoreAudioBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for CoreAudioBackend {
    fn name(&self) -> &'static str {
        "core-audio"
    }

    fn init_session(&self) -> Result<SessionInit> {
        // SAFETY: no reserved pointer; paired with CoUninitialize in
        // uninit_session when this call reports Initialized.
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };

        if hr.is_ok() {
            // S_OK and S_FALSE both take a reference that must be released.
            return Ok(SessionInit::Initialized);
        }

        if hr == RPC_E_CHANGED_MODE {
            debug!("COM already initialized with a different threading model");
            return Ok(SessionInit::Ambient);
        }

        Err(AgentError::Audio(format!(
            "COM initialization failed: {}",
            windows::core::Error::from(hr)
        )))
    }

    fn uninit_session(&self) -> Result<()> {
        // SAFETY: only called after a successful CoInitializeEx on this thread.
        unsafe { CoUninitialize() };
        Ok(())
    }

    fn default_endpoint(&self) -> Result<Box<dyn EndpointVolume>> {
        // SAFETY: COM is initialized on this thread by the session guard.
        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }.map_err(|e| {
                AgentError::InterfaceUnavailable(format!("device enumerator: {}", e))
            })?;

        let device = unsafe { enumerator.GetDefaultAudioEndpoint(eRender, eConsole) }
            .map_err(|e| AgentError::NoDefaultDevice(e.to_string()))?;

        let volume = activate_endpoint_volume(&device)?;
        Ok(Box::new(CoreEndpoint { volume }))
    }
}

/// Activate the volume interface, falling back to activating `IUnknown` and
/// querying for the capability when the direct activation fails.
fn activate_endpoint_volume(device: &IMMDevice) -> Result<IAudioEndpointVolume> {
    // SAFETY: `device` is a live interface obtained on this thread.
    match unsafe { device.Activate::<IAudioEndpointVolume>(CLSCTX_ALL, None) } {
        Ok(volume) => Ok(volume),
        Err(direct) => {
            warn!(
                "Direct IAudioEndpointVolume activation failed ({}), querying interface",
                direct
            );
            let unknown = unsafe { device.Activate::<IUnknown>(CLSCTX_ALL, None) }
                .map_err(|e| AgentError::InterfaceUnavailable(e.to_string()))?;
            unknown
                .cast::<IAudioEndpointVolume>()
                .map_err(|e| AgentError::InterfaceUnavailable(e.to_string()))
        }
    }
}

/// Activated endpoint volume; the COM reference is released on drop
struct CoreEndpoint {
    volume: IAudioEndpointVolume,
}

impl EndpointVolume for CoreEndpoint {
    fn mute(&self) -> Result<bool> {
        // SAFETY: interface is live for the lifetime of self.
        unsafe { self.volume.GetMute() }
            .map(|muted| muted.as_bool())
            .map_err(|e| AgentError::Audio(format!("Error getting mute state: {}", e)))
    }

    fn set_mute(&self, muted: bool) -> Result<()> {
        // SAFETY: interface is live; a null event context is permitted.
        unsafe { self.volume.SetMute(BOOL::from(muted), std::ptr::null()) }
            .map_err(|e| AgentError::Audio(format!("Error setting mute state: {}", e)))
    }
}
