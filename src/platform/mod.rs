//! Platform-specific audio backends
//!
//! Detection runs once at startup and produces the [`AudioSubsystem`]
//! variant handed to the audio gateway.

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod windows;

use crate::audio::AudioSubsystem;
use crate::config::AudioConfig;
use tracing::{info, warn};

/// Detect the audio backend for the current platform
pub fn detect_audio(config: &AudioConfig) -> AudioSubsystem {
    if !config.enabled {
        info!("Audio control disabled by configuration");
        return AudioSubsystem::unavailable("disabled by configuration");
    }

    let subsystem = detect_platform_audio();
    if !subsystem.is_available() {
        warn!("Audio control will be unavailable: {}", subsystem.describe());
    }
    subsystem
}

#[cfg(windows)]
fn detect_platform_audio() -> AudioSubsystem {
    use std::sync::Arc;

    AudioSubsystem::Available(Arc::new(self::windows::CoreAudioBackend::new()))
}

#[cfg(target_os = "linux")]
fn detect_platform_audio() -> AudioSubsystem {
    use std::sync::Arc;

    match self::linux::PulseAudioBackend::detect() {
        Some(backend) => AudioSubsystem::Available(Arc::new(backend)),
        None => AudioSubsystem::unavailable("pactl not found on PATH"),
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
fn detect_platform_audio() -> AudioSubsystem {
    AudioSubsystem::unavailable(format!(
        "no audio backend for {}",
        std::env::consts::OS
    ))
}
