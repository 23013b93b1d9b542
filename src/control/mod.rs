//! HTTP control API
//!
//! This module exposes monitor and audio control as REST endpoints. All
//! endpoints except `/healthz` pass through the API key guard first.

mod api;
pub mod auth;
mod handler;
mod server;

pub use api::{ApiError, ApiReply, ApiResponse, ResponseStatus};
pub use auth::API_KEY_HEADER;
pub use handler::{CommandHandler, HealthReport};
pub use server::{build_router, ControlServer};
