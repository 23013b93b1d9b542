//! Environment variable overrides
//!
//! Values set in the process environment take precedence over the TOML file.
//! Lookups go through a closure so tests can supply a fixed map.

use crate::config::Config;
use std::path::PathBuf;
use tracing::warn;

/// Bind address override
pub const ENV_HOST: &str = "WINIOT_HOST";
/// Bind port override
pub const ENV_PORT: &str = "WINIOT_PORT";
/// Debug logging override
pub const ENV_DEBUG: &str = "WINIOT_DEBUG";
/// Enables `X-API-Key` checking when "true"
pub const ENV_AUTH_ENABLED: &str = "API_AUTH_ENABLED";
/// Expected API key
pub const ENV_API_KEY: &str = "API_KEY";
/// Monitor tool location
pub const ENV_TOOL_PATH: &str = "TWINKLE_TRAY_PATH";
/// Audio endpoints switch
pub const ENV_AUDIO_ENABLED: &str = "WINIOT_AUDIO_ENABLED";

/// Apply environment overrides to `config`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        config.server.host = host;
    }

    if let Some(port) = lookup(ENV_PORT) {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("Ignoring {}='{}': not a valid port", ENV_PORT, port),
        }
    }

    if let Some(debug) = lookup(ENV_DEBUG) {
        config.server.debug = parse_flag(&debug);
    }

    if let Some(enabled) = lookup(ENV_AUTH_ENABLED) {
        config.auth.enabled = parse_flag(&enabled);
    }

    if let Some(key) = lookup(ENV_API_KEY) {
        config.auth.api_key = key;
    }

    if let Some(path) = lookup(ENV_TOOL_PATH) {
        if !path.trim().is_empty() {
            config.monitor.executable_path = Some(PathBuf::from(path));
        }
    }

    if let Some(enabled) = lookup(ENV_AUDIO_ENABLED) {
        config.audio.enabled = parse_flag(&enabled);
    }
}

/// Only a case-insensitive "true" counts as set
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
