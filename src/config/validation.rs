//! Configuration validation functions
//!
//! This module provides validation for the listener address, the command
//! timeout, the monitor tool path and the API key.

use crate::error::{AgentError, Result};
use std::net::IpAddr;
use std::path::Path;

/// Longest accepted command timeout, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Validate bind host is an IP address
pub fn validate_host(host: &str) -> Result<()> {
    host.parse::<IpAddr>()
        .map_err(|_| AgentError::Config(format!("Invalid bind address: {}", host)))?;
    Ok(())
}

/// Validate port is non-zero
pub fn validate_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(AgentError::Config("Port number cannot be 0".to_string()));
    }
    Ok(())
}

/// Validate command timeout (1-300 seconds)
pub fn validate_timeout(secs: u64) -> Result<()> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(AgentError::Config(format!(
            "Command timeout {} is out of valid range (1-{} seconds)",
            secs, MAX_TIMEOUT_SECS
        )));
    }
    Ok(())
}

/// Validate a configured executable path is syntactically usable.
///
/// Existence is checked later during resolution, where a missing file falls
/// back to the well-known install locations.
pub fn validate_executable_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(AgentError::Config(
            "Executable path cannot be empty".to_string(),
        ));
    }

    if path.to_str().is_none() {
        return Err(AgentError::Config(format!(
            "Invalid executable path: {:?}",
            path
        )));
    }

    Ok(())
}

/// Validate the API key when auth is enabled
pub fn validate_api_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(AgentError::Config(
            "API key cannot be empty when auth is enabled".to_string(),
        ));
    }

    if key.chars().any(|c| c.is_control()) {
        return Err(AgentError::Config(
            "API key contains control characters and cannot be sent as a header".to_string(),
        ));
    }

    Ok(())
}
