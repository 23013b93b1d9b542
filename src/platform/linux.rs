//! Linux audio backend
//!
//! Drives PulseAudio (or PipeWire's Pulse server) through the `pactl`
//! command-line client. There is no per-thread session to set up, so the
//! session step is always ambient.

use crate::audio::{AudioBackend, EndpointVolume, SessionInit};
use crate::error::{AgentError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// `pactl`-based backend
#[derive(Debug, Clone)]
pub struct PulseAudioBackend {
    pactl: PathBuf,
}

impl PulseAudioBackend {
    /// Use a specific `pactl` binary
    pub fn new(pactl: impl Into<PathBuf>) -> Self {
        Self {
            pactl: pactl.into(),
        }
    }

    /// Find `pactl` on the search path
    pub fn detect() -> Option<Self> {
        which::which("pactl").ok().map(Self::new)
    }
}

impl AudioBackend for PulseAudioBackend {
    fn name(&self) -> &'static str {
        "pulseaudio"
    }

    fn init_session(&self) -> Result<SessionInit> {
        Ok(SessionInit::Ambient)
    }

    fn uninit_session(&self) -> Result<()> {
        Ok(())
    }

    fn default_endpoint(&self) -> Result<Box<dyn EndpointVolume>> {
        let sink = run_pactl(&self.pactl, &["get-default-sink"])
            .map_err(|e| AgentError::NoDefaultDevice(e.to_string()))?;
        let sink = sink.trim();

        if sink.is_empty() {
            return Err(AgentError::NoDefaultDevice(
                "pactl reported no default sink".to_string(),
            ));
        }

        debug!("Default sink: {}", sink);
        Ok(Box::new(PulseSink {
            pactl: self.pactl.clone(),
            sink: sink.to_string(),
        }))
    }
}

/// One sink resolved for the duration of an operation
struct PulseSink {
    pactl: PathBuf,
    sink: String,
}

impl EndpointVolume for PulseSink {
    fn mute(&self) -> Result<bool> {
        let output = run_pactl(&self.pactl, &["get-sink-mute", &self.sink])?;
        parse_mute(&output)
    }

    fn set_mute(&self, muted: bool) -> Result<()> {
        let flag = if muted { "1" } else { "0" };
        run_pactl(&self.pactl, &["set-sink-mute", &self.sink, flag])?;
        Ok(())
    }
}

/// Execute `pactl` and return stdout
fn run_pactl(pactl: &Path, args: &[&str]) -> Result<String> {
    debug!("Executing command: {:?} {:?}", pactl, args);

    let output = Command::new(pactl).args(args).output().map_err(|e| {
        AgentError::Audio(format!("Failed to execute pactl {}: {}", args.join(" "), e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AgentError::Audio(format!(
            "pactl {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse `Mute: yes` / `Mute: no`
fn parse_mute(output: &str) -> Result<bool> {
    let value = output
        .trim()
        .strip_prefix("Mute:")
        .map(str::trim)
        .ok_or_else(|| AgentError::Audio(format!("Unexpected pactl output: {}", output.trim())))?;

    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(AgentError::Audio(format!("Unexpected mute value: {}", other))),
    }
}
