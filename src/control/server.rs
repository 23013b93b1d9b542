//! HTTP control server
//!
//! Builds the axum router, layers authentication and panic containment on
//! top, and serves it on a TCP listener until the shutdown future resolves.
//! Unknown routes, disallowed methods and undecodable path segments all
//! answer with the JSON error envelope.

use crate::control::auth::require_api_key;
use crate::control::{ApiError, CommandHandler};
use crate::error::{AgentError, Result};
use crate::monitor::PowerState;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Request, State};
use axum::handler::Handler;
use axum::http::{Method, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tracing::{debug, error, info};

type Shared = State<Arc<CommandHandler>>;
type Routes = MethodRouter<Arc<CommandHandler>>;
type PathParams<T> = std::result::Result<Path<T>, PathRejection>;

/// Build the router with all API routes installed
pub fn build_router(handler: Arc<CommandHandler>) -> Router {
    let api = Router::new()
        .route("/api/monitor/:monitor/on", get_or_post(monitor_on))
        .route("/api/monitor/:monitor/off", get_or_post(monitor_off))
        .route(
            "/api/monitor/:monitor/brightness/:level",
            get_or_post(set_brightness),
        )
        .route(
            "/api/monitor/:monitor/status-placeholder",
            get_only(status_placeholder),
        )
        .route("/api/audio/mute", get_or_post(audio_mute))
        .route("/api/audio/unmute", get_or_post(audio_unmute))
        .route("/api/audio/mute/toggle", get_or_post(audio_toggle))
        .route("/api/audio/status", get_only(audio_status))
        .route_layer(middleware::from_fn_with_state(
            handler.auth().clone(),
            require_api_key,
        ));

    Router::new()
        .merge(api)
        .route("/healthz", get_only(healthz))
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(middleware::from_fn(catch_panic)))
        .with_state(handler)
}

/// Route answering GET and POST identically
fn get_or_post<H, T>(handler: H) -> Routes
where
    H: Handler<T, Arc<CommandHandler>>,
    T: 'static,
{
    get(handler.clone())
        .post(handler)
        .fallback(method_not_allowed)
}

/// Read-only route
fn get_only<H, T>(handler: H) -> Routes
where
    H: Handler<T, Arc<CommandHandler>>,
    T: 'static,
{
    get(handler).fallback(method_not_allowed)
}

/// Control server bound to a TCP address
pub struct ControlServer {
    bind_address: String,
    handler: Arc<CommandHandler>,
}

impl ControlServer {
    /// Create a new control server
    pub fn new(bind_address: impl Into<String>, handler: Arc<CommandHandler>) -> Self {
        Self {
            bind_address: bind_address.into(),
            handler,
        }
    }

    /// Configured bind address
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.bind_address).await.map_err(|e| {
            AgentError::Config(format!("Failed to bind {}: {}", self.bind_address, e))
        })?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, build_router(self.handler.clone()))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Unwrap path parameters, turning axum's plain-text rejection into a 400
/// envelope
fn path_params<T>(path: PathParams<T>) -> std::result::Result<T, ApiError> {
    path.map(|Path(params)| params).map_err(|rejection| {
        debug!("Rejected path parameters: {}", rejection.body_text());
        ApiError::Validation(rejection.body_text())
    })
}

async fn monitor_on(State(handler): Shared, path: PathParams<String>) -> Response {
    match path_params(path) {
        Ok(monitor) => handler
            .monitor_power(&monitor, PowerState::On)
            .await
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn monitor_off(State(handler): Shared, path: PathParams<String>) -> Response {
    match path_params(path) {
        Ok(monitor) => handler
            .monitor_power(&monitor, PowerState::Off)
            .await
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn set_brightness(
    State(handler): Shared,
    path: PathParams<(String, String)>,
) -> Response {
    match path_params(path) {
        Ok((monitor, level)) => handler
            .set_brightness(&monitor, &level)
            .await
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn status_placeholder(State(handler): Shared, path: PathParams<String>) -> Response {
    match path_params(path) {
        Ok(monitor) => handler.status_placeholder(&monitor).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn audio_mute(State(handler): Shared) -> Response {
    handler.set_mute(true).await.into_response()
}

async fn audio_unmute(State(handler): Shared) -> Response {
    handler.set_mute(false).await.into_response()
}

async fn audio_toggle(State(handler): Shared) -> Response {
    handler.toggle_mute().await.into_response()
}

async fn audio_status(State(handler): Shared) -> Response {
    handler.audio_status().await.into_response()
}

/// Health check endpoint
async fn healthz(State(handler): Shared) -> Response {
    Json(handler.health()).into_response()
}

async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    ApiError::MethodNotAllowed(format!("Method {} is not allowed for {}", method, uri.path()))
        .into_response()
}

async fn not_found(request: Request) -> Response {
    ApiError::NotFound(format!("No route for {}", request.uri().path())).into_response()
}

/// Turn a panic anywhere below this layer into a 500 envelope
async fn catch_panic(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(_) => {
            error!("Handler for {} panicked", path);
            ApiError::Internal("Unexpected internal error.".to_string()).into_response()
        }
    }
}
