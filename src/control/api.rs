//! HTTP response envelope and error types
//!
//! Every endpoint answers with the same JSON shape:
//! `{status, ...action-specific fields, message, details}`.

use crate::error::AgentError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Operation performed
    Success,
    /// Operation rejected or failed
    Error,
    /// Informational, no side effect
    Info,
}

/// JSON response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Outcome
    pub status: ResponseStatus,

    /// Action name (e.g. `MONITOR_ON_VCP`, `MUTE`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Monitor number for single-monitor actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_num: Option<u32>,

    /// Brightness target description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Requested brightness percentage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness_level: Option<u8>,

    /// Mute flag after the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_muted: Option<bool>,

    /// Human-readable summary
    pub message: String,

    /// Underlying tool or platform message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiResponse {
    fn with_status(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            action: None,
            monitor_num: None,
            target: None,
            brightness_level: None,
            audio_muted: None,
            message: message.into(),
            details: None,
        }
    }

    /// Successful response
    pub fn success(message: impl Into<String>) -> Self {
        Self::with_status(ResponseStatus::Success, message)
    }

    /// Error response
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_status(ResponseStatus::Error, message)
    }

    /// Informational response
    pub fn info(message: impl Into<String>) -> Self {
        Self::with_status(ResponseStatus::Info, message)
    }

    /// Set the action name
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Set the monitor number
    pub fn monitor(mut self, monitor: u32) -> Self {
        self.monitor_num = Some(monitor);
        self
    }

    /// Set the brightness target and level
    pub fn brightness(mut self, target: impl Into<String>, level: u8) -> Self {
        self.target = Some(target.into());
        self.brightness_level = Some(level);
        self
    }

    /// Set the resulting mute flag
    pub fn muted(mut self, muted: bool) -> Self {
        self.audio_muted = Some(muted);
        self
    }

    /// Attach details
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Pair with an HTTP status code
    pub fn with_code(self, code: StatusCode) -> ApiReply {
        ApiReply { code, body: self }
    }

    /// Pair with 200 OK
    pub fn ok(self) -> ApiReply {
        self.with_code(StatusCode::OK)
    }
}

/// Status code plus envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    /// HTTP status code
    pub code: StatusCode,
    /// JSON body
    pub body: ApiResponse,
}

impl IntoResponse for ApiReply {
    fn into_response(self) -> Response {
        (self.code, Json(self.body)).into_response()
    }
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Bad input
    #[error("{0}")]
    Validation(String),

    /// No `X-API-Key` header
    #[error("API key required. Please provide it in the 'X-API-Key' header.")]
    KeyRequired,

    /// `X-API-Key` did not match
    #[error("Invalid API key.")]
    InvalidKey,

    /// Unknown route
    #[error("{0}")]
    NotFound(String),

    /// Route exists but not for this method
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Subsystem not loaded
    #[error("{0}")]
    Unavailable(String),

    /// Execution or runtime failure
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::KeyRequired => StatusCode::UNAUTHORIZED,
            Self::InvalidKey => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error envelope carrying this error's message
    pub fn into_reply(self) -> ApiReply {
        let code = self.status_code();
        ApiResponse::error(self.to_string()).with_code(code)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_reply().into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        if err.is_validation() {
            return ApiError::Validation(err.to_string());
        }

        match err {
            AgentError::AudioUnavailable(_) => ApiError::Unavailable(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
