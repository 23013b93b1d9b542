//! winiot-agent: local HTTP control surface for monitors and system audio
//!
//! This library exposes monitor power/brightness and audio mute control as
//! REST endpoints. Monitor control is delegated to an external
//! monitor-control executable run as a subprocess; audio control goes
//! through the platform's audio API.
//!
//! # Architecture
//!
//! A request passes the API key guard, then the handler either builds a
//! command line and runs it with a bounded timeout, or performs one mute
//! operation through the audio gateway. Every outcome is folded into a
//! uniform JSON envelope.
//!
//! # Modules
//!
//! - `config`: Configuration loading and validation
//! - `monitor`: Monitor tool discovery and command construction
//! - `executor`: Bounded subprocess execution
//! - `audio`: Mute control lifecycle over a platform backend
//! - `platform`: Platform audio backends (Windows, Linux)
//! - `control`: HTTP API, auth guard and server
//! - `error`: Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod executor;
pub mod monitor;
pub mod platform;

// Re-export commonly used types
pub use error::{AgentError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
