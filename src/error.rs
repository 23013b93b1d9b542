//! Error types for winiot-agent
//!
//! This module defines the error types used throughout the application.
//! We use `thiserror` for ergonomic error definitions and `anyhow` for
//! error propagation in application code.

use thiserror::Error;

/// Main error type for winiot-agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Monitor selector is not a valid target for the requested action
    #[error("{0}")]
    InvalidTarget(String),

    /// Brightness level outside 0..=100 or not an integer
    #[error("{0}")]
    InvalidLevel(String),

    /// The external monitor tool could not be located
    #[error("Executable '{0}' not found")]
    ExecutableNotFound(String),

    /// External command exceeded its wall-clock budget
    #[error("Command timed out: {0}")]
    Timeout(String),

    /// External command exited with a non-zero status
    #[error("Command failed: {0}")]
    Process(String),

    /// Audio subsystem was not loaded at startup
    #[error("Audio control is unavailable: {0}")]
    AudioUnavailable(String),

    /// No default audio output endpoint exists
    #[error("No default audio output device: {0}")]
    NoDefaultDevice(String),

    /// Endpoint volume interface could not be activated
    #[error("Audio volume interface unavailable: {0}")]
    InterfaceUnavailable(String),

    /// Session initialization or mute read/write failure
    #[error("Audio error: {0}")]
    Audio(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AgentError {
    /// Whether this error was caused by bad caller input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidTarget(_) | Self::InvalidLevel(_))
    }
}

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;
