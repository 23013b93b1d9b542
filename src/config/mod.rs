//! Configuration management
//!
//! Configuration is assembled once at startup from built-in defaults, an
//! optional TOML file and environment variable overrides. The result is
//! immutable and shared with every request through the server state.

mod env;
mod validation;

pub use env::apply_env_overrides;

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder secret used when auth is enabled without a configured key
pub const DEFAULT_API_KEY: &str = "you_should_really_set_a_key_if_auth_is_enabled";

/// Top-level agent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Shared-secret authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// External monitor-control tool
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// System audio control
    #[serde(default)]
    pub audio: AudioConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Verbose logging
    #[serde(default)]
    pub debug: bool,
}

/// API key authentication settings
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// Require `X-API-Key` on every API request
    #[serde(default)]
    pub enabled: bool,

    /// Expected value of the `X-API-Key` header
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

/// Monitor tool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// Explicit path to the monitor-control executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable_path: Option<PathBuf>,

    /// Wall-clock budget for one invocation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Set to false to disable audio endpoints regardless of platform support
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml)
            .map_err(|e| AgentError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::parse(&contents)
    }

    /// Load configuration for startup.
    ///
    /// An explicitly requested file must exist. The implicit default path is
    /// optional and falls back to built-in defaults when absent. Environment
    /// overrides are applied on top, then the result is validated.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        let mut config = if explicit || path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_host(&self.server.host)?;
        validation::validate_port(self.server.port)?;
        validation::validate_timeout(self.monitor.timeout_secs)?;

        if let Some(path) = &self.monitor.executable_path {
            validation::validate_executable_path(path)?;
        }

        if self.auth.enabled {
            validation::validate_api_key(&self.auth.api_key)?;
        }

        Ok(())
    }

    /// Auth is on but still using the built-in placeholder key
    pub fn uses_placeholder_key(&self) -> bool {
        self.auth.enabled && self.auth.api_key == DEFAULT_API_KEY
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl MonitorConfig {
    /// Timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AuthConfig {
    /// Auth switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_key: default_api_key(),
        }
    }

    /// Auth switched on with the given secret
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            api_key: api_key.into(),
        }
    }
}

// Keep the secret out of debug output.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("api_key_len", &self.api_key.len())
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_true() -> bool {
    true
}
