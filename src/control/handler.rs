//! Command handler for the HTTP API
//!
//! Maps each request onto the command builder and process executor, or onto
//! the audio gateway, and shapes the result into a response envelope.

use crate::audio::AudioGateway;
use crate::config::{AuthConfig, Config};
use crate::control::{ApiError, ApiReply, ApiResponse};
use crate::error::{AgentError, Result};
use crate::executor::ProcessExecutor;
use crate::monitor::{self, MonitorTool, PowerState};
use crate::platform;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Audio action names reported in responses
const ACTION_MUTE: &str = "MUTE";
const ACTION_UNMUTE: &str = "UNMUTE";
const ACTION_TOGGLE: &str = "TOGGLE_MUTE";

/// Health endpoint body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    /// Always "success" when the server answers
    pub status: String,
    /// Whether the monitor tool currently resolves
    pub monitor_tool_found: bool,
    /// Whether audio control was loaded
    pub audio_available: bool,
}

/// Everything a request needs; read-only after startup
pub struct CommandHandler {
    auth: Arc<AuthConfig>,
    monitor: MonitorTool,
    executor: ProcessExecutor,
    audio: Arc<AudioGateway>,
}

impl CommandHandler {
    /// Create a handler from its parts
    pub fn new(
        auth: AuthConfig,
        monitor: MonitorTool,
        executor: ProcessExecutor,
        audio: AudioGateway,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            monitor,
            executor,
            audio: Arc::new(audio),
        }
    }

    /// Build the handler from configuration, locating the monitor tool and
    /// detecting the audio backend
    pub fn from_config(config: &Config) -> Self {
        let monitor = monitor::locate(config.monitor.executable_path.as_deref());
        let audio = AudioGateway::new(platform::detect_audio(&config.audio));

        info!(
            "Monitor tool: {:?} (found: {})",
            monitor.executable(),
            monitor.is_available()
        );
        info!("Audio control: {}", audio.subsystem().describe());

        Self::new(
            config.auth.clone(),
            monitor,
            ProcessExecutor::new(config.monitor.timeout()),
            audio,
        )
    }

    /// Authentication settings
    pub fn auth(&self) -> &Arc<AuthConfig> {
        &self.auth
    }

    /// Monitor tool handle
    pub fn monitor_tool(&self) -> &MonitorTool {
        &self.monitor
    }

    /// Audio gateway
    pub fn audio(&self) -> &AudioGateway {
        &self.audio
    }

    /// Turn a monitor on or off
    pub async fn monitor_power(&self, monitor: &str, state: PowerState) -> ApiReply {
        let command = match self.monitor.power_command(monitor, state) {
            Ok(command) => command,
            Err(e) => return build_failure(e),
        };

        let result = self.executor.execute(&command.command).await;
        let (done, failed) = match state {
            PowerState::On => (
                "Monitor turned on via VCP command.",
                "Failed to turn on monitor via VCP command.",
            ),
            PowerState::Off => (
                "Monitor turned off (standby) via VCP command.",
                "Failed to turn off monitor via VCP command.",
            ),
        };

        let (body, code) = if result.succeeded {
            (ApiResponse::success(done), StatusCode::OK)
        } else {
            (ApiResponse::error(failed), StatusCode::INTERNAL_SERVER_ERROR)
        };

        body.monitor(command.monitor)
            .action(state.action())
            .details(result.message)
            .with_code(code)
    }

    /// Set brightness on one monitor or all of them
    pub async fn set_brightness(&self, selector: &str, level: &str) -> ApiReply {
        let command = match self.monitor.brightness_command(selector, level) {
            Ok(command) => command,
            Err(e) => {
                error!(
                    "Brightness command error for monitor '{}', level {}: {}",
                    selector, level, e
                );
                return build_failure(e);
            }
        };

        let target = command.target.describe();
        let result = self.executor.execute(&command.command).await;

        let (body, code) = if result.succeeded {
            (
                ApiResponse::success(format!(
                    "{} brightness set to {}%.",
                    target, command.level
                )),
                StatusCode::OK,
            )
        } else {
            (
                ApiResponse::error(format!(
                    "Failed to set {} brightness to {}%.",
                    target, command.level
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        };

        body.brightness(target, command.level)
            .details(result.message)
            .with_code(code)
    }

    /// Mute or unmute the default output device
    pub async fn set_mute(&self, muted: bool) -> ApiReply {
        let action = if muted { ACTION_MUTE } else { ACTION_UNMUTE };

        match self.run_audio(move |audio| audio.set_mute(muted)).await {
            Ok(()) => {
                let (message, details) = if muted {
                    ("System audio muted.", "System master volume mute state set to muted.")
                } else {
                    ("System audio unmuted.", "System master volume mute state set to unmuted.")
                };
                ApiResponse::success(message)
                    .action(action)
                    .muted(muted)
                    .details(details)
                    .ok()
            }
            Err(e) => {
                let message = if muted {
                    "Failed to mute system audio."
                } else {
                    "Failed to unmute system audio."
                };
                audio_failure(e, Some(action), message)
            }
        }
    }

    /// Invert the mute flag
    pub async fn toggle_mute(&self) -> ApiReply {
        match self.run_audio(|audio| audio.toggle_mute()).await {
            Ok(muted) => ApiResponse::success(format!(
                "System audio mute toggled to: {}",
                if muted { "muted" } else { "unmuted" }
            ))
            .action(ACTION_TOGGLE)
            .muted(muted)
            .details(if muted {
                "System master volume mute state set to muted."
            } else {
                "System master volume mute state set to unmuted."
            })
            .ok(),
            Err(e) => audio_failure(e, Some(ACTION_TOGGLE), "Failed to toggle system audio mute."),
        }
    }

    /// Report the mute flag
    pub async fn audio_status(&self) -> ApiReply {
        match self.run_audio(|audio| audio.mute_status()).await {
            Ok(muted) => ApiResponse::success("Audio status retrieved.")
                .muted(muted)
                .details("Mute state read successfully.")
                .ok(),
            Err(e) => audio_failure(e, None, "Failed to get audio status."),
        }
    }

    /// Fixed informational stub for a monitor
    pub fn status_placeholder(&self, monitor: &str) -> ApiReply {
        match monitor::parse_monitor_number(monitor) {
            Ok(monitor) => ApiResponse::info("This endpoint is a placeholder for monitor status.")
                .monitor(monitor)
                .ok(),
            Err(e) => ApiError::from(e).into_reply(),
        }
    }

    /// Liveness and collaborator availability
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "success".to_string(),
            monitor_tool_found: self.monitor.is_available(),
            audio_available: self.audio.is_available(),
        }
    }

    /// Run one audio operation on a blocking worker thread so the whole
    /// session lifecycle stays on that thread
    async fn run_audio<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&AudioGateway) -> Result<T> + Send + 'static,
    {
        let audio = self.audio.clone();
        tokio::task::spawn_blocking(move || op(&audio))
            .await
            .map_err(|e| AgentError::Unexpected(format!("audio task failed: {}", e)))?
    }
}

/// Envelope for a command-builder failure
fn build_failure(err: AgentError) -> ApiReply {
    debug!("Command build rejected: {}", err);
    ApiError::from(err).into_reply()
}

/// Envelope for an audio failure: unavailable subsystem is 503, anything
/// else is a 500 carrying the underlying error as details
fn audio_failure(err: AgentError, action: Option<&str>, message: &str) -> ApiReply {
    let (body, code) = match err {
        AgentError::AudioUnavailable(_) => (
            ApiResponse::error(err.to_string()),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        _ => {
            error!("{} {}", message, err);
            (
                ApiResponse::error(message).details(err.to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    };

    match action {
        Some(action) => body.action(action).with_code(code),
        None => body.with_code(code),
    }
}
