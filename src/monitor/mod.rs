//! Monitor command construction
//!
//! Turns a logical monitor action into the argument list understood by the
//! external monitor-control tool. Every builder checks that the tool can be
//! resolved before looking at its parameters, so a missing tool is reported
//! the same way whatever the request contained.

mod locate;

pub use locate::{locate, locate_in, DEFAULT_EXECUTABLE};

use crate::error::{AgentError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Highest accepted brightness percentage
pub const MAX_BRIGHTNESS: u8 = 100;

/// A fully resolved external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Program to spawn
    pub program: PathBuf,
    /// Arguments passed verbatim
    pub args: Vec<String>,
}

impl CommandLine {
    /// Create a command line
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// VCP power state written to register 0xD6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Display on
    On,
    /// Display off / standby
    Off,
}

impl PowerState {
    /// VCP code and value passed to the tool
    pub fn vcp_code(self) -> &'static str {
        match self {
            Self::On => "0xD6:1",
            Self::Off => "0xD6:5",
        }
    }

    /// Action name reported back to clients
    pub fn action(self) -> &'static str {
        match self {
            Self::On => "MONITOR_ON_VCP",
            Self::Off => "MONITOR_OFF_VCP",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

/// Which monitors a brightness change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSelector {
    /// One monitor, 1-based
    Monitor(u32),
    /// Every connected monitor
    All,
}

impl TargetSelector {
    /// Parse a brightness selector.
    ///
    /// Positive integers select one monitor. `0` and a case-insensitive
    /// `all` select every monitor. Anything else is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().parse::<i64>() {
            Ok(0) => Ok(Self::All),
            Ok(n) if n > 0 => u32::try_from(n)
                .map(Self::Monitor)
                .map_err(|_| AgentError::InvalidTarget(format!("Monitor number {} is too large.", n))),
            Ok(_) => Err(AgentError::InvalidTarget(
                "Monitor number cannot be negative.".to_string(),
            )),
            Err(_) if raw.trim().eq_ignore_ascii_case("all") => Ok(Self::All),
            Err(_) => Err(AgentError::InvalidTarget(format!(
                "Invalid monitor number: '{}'. Expected a positive integer, 0, or 'all'.",
                raw
            ))),
        }
    }

    /// Human-readable target for responses
    pub fn describe(&self) -> String {
        match self {
            Self::Monitor(n) => format!("Monitor {}", n),
            Self::All => "All monitors".to_string(),
        }
    }
}

/// A validated power command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerCommand {
    /// Target monitor
    pub monitor: u32,
    /// Requested power state
    pub state: PowerState,
    /// Command to run
    pub command: CommandLine,
}

/// A validated brightness command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightnessCommand {
    /// Target monitor(s)
    pub target: TargetSelector,
    /// Brightness percentage
    pub level: u8,
    /// Command to run
    pub command: CommandLine,
}

/// Handle on the external monitor-control executable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTool {
    executable: PathBuf,
    verified: bool,
}

impl MonitorTool {
    /// Create a tool handle. `verified` marks a path already known to exist.
    pub fn new(executable: impl Into<PathBuf>, verified: bool) -> Self {
        Self {
            executable: executable.into(),
            verified,
        }
    }

    /// Configured or discovered executable
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Whether the executable was found at startup
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Resolve the program to spawn.
    ///
    /// A verified path is used as is; otherwise the executable is looked up
    /// on the search path now.
    pub fn resolve(&self) -> Result<PathBuf> {
        if self.verified {
            return Ok(self.executable.clone());
        }

        which::which(&self.executable).map_err(|_| {
            warn!("Monitor tool {:?} not found", self.executable);
            AgentError::ExecutableNotFound(self.executable.display().to_string())
        })
    }

    /// Whether `resolve` would currently succeed
    pub fn is_available(&self) -> bool {
        self.resolve().is_ok()
    }

    /// Build a power command for one monitor
    pub fn power_command(&self, monitor: &str, state: PowerState) -> Result<PowerCommand> {
        let program = self.resolve()?;
        let monitor = parse_monitor_number(monitor)?;

        Ok(PowerCommand {
            monitor,
            state,
            command: CommandLine::new(
                program,
                vec![
                    format!("--MonitorNum={}", monitor),
                    format!("--VCP={}", state.vcp_code()),
                ],
            ),
        })
    }

    /// Build a brightness command for one monitor or all of them
    pub fn brightness_command(&self, selector: &str, level: &str) -> Result<BrightnessCommand> {
        let program = self.resolve()?;
        let level = parse_level(level)?;
        let target = TargetSelector::parse(selector)?;

        let target_arg = match target {
            TargetSelector::All => "--AllMonitors".to_string(),
            TargetSelector::Monitor(n) => format!("--MonitorNum={}", n),
        };

        Ok(BrightnessCommand {
            target,
            level,
            command: CommandLine::new(program, vec![target_arg, format!("--Set={}", level)]),
        })
    }
}

/// Parse a power-action monitor number; must be a positive integer
pub fn parse_monitor_number(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AgentError::InvalidTarget(
            "Monitor number must be a positive integer.".to_string(),
        )),
    }
}

/// Parse a brightness percentage in 0..=100
pub fn parse_level(raw: &str) -> Result<u8> {
    match raw.trim().parse::<i64>() {
        Ok(level) if (0..=i64::from(MAX_BRIGHTNESS)).contains(&level) => Ok(level as u8),
        _ => Err(AgentError::InvalidLevel(
            "Brightness must be an integer between 0 and 100.".to_string(),
        )),
    }
}
