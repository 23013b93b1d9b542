//! Integration tests for the HTTP control API
//!
//! These tests drive the router in-process with `tower::ServiceExt::oneshot`.
//! Monitor tests use a small shell script standing in for the monitor tool,
//! and audio tests use an in-memory backend.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use winiot_agent::audio::{
    AudioBackend, AudioGateway, AudioSubsystem, EndpointVolume, SessionInit,
};
use winiot_agent::config::AuthConfig;
use winiot_agent::control::{build_router, CommandHandler};
use winiot_agent::executor::ProcessExecutor;
use winiot_agent::monitor::MonitorTool;
use winiot_agent::Result;

/// Audio backend keeping the mute flag in memory and counting sessions
#[derive(Default)]
struct MemoryAudio {
    muted: Arc<Mutex<bool>>,
    sessions: AtomicUsize,
    releases: AtomicUsize,
}

struct MemoryEndpoint(Arc<Mutex<bool>>);

impl EndpointVolume for MemoryEndpoint {
    fn mute(&self) -> Result<bool> {
        Ok(*self.0.lock().unwrap())
    }

    fn set_mute(&self, muted: bool) -> Result<()> {
        *self.0.lock().unwrap() = muted;
        Ok(())
    }
}

impl AudioBackend for MemoryAudio {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn init_session(&self) -> Result<SessionInit> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(SessionInit::Initialized)
    }

    fn uninit_session(&self) -> Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn default_endpoint(&self) -> Result<Box<dyn EndpointVolume>> {
        Ok(Box::new(MemoryEndpoint(self.muted.clone())))
    }
}

fn missing_tool() -> MonitorTool {
    MonitorTool::new("definitely-not-a-real-monitor-tool-7f3a", false)
}

fn router(auth: AuthConfig, tool: MonitorTool, audio: AudioSubsystem) -> Router {
    build_router(Arc::new(CommandHandler::new(
        auth,
        tool,
        ProcessExecutor::default(),
        AudioGateway::new(audio),
    )))
}

async fn send(app: &Router, method: Method, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(content_type, "application/json", "{uri} answered without an envelope");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).expect("Response is not valid JSON");
    (status, body)
}

#[cfg(unix)]
mod fake_tool {
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use winiot_agent::monitor::MonitorTool;

    /// Write an executable shell script acting as the monitor tool
    pub fn script(dir: &TempDir, body: &str) -> MonitorTool {
        let path: PathBuf = dir.path().join("monitor-tool");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        MonitorTool::new(path, true)
    }

    /// Tool that echoes its arguments and succeeds
    pub fn echo(dir: &TempDir) -> MonitorTool {
        script(dir, r#"echo "$@""#)
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_monitor_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(
        AuthConfig::disabled(),
        fake_tool::echo(&dir),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(&app, Method::POST, "/api/monitor/2/on", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["monitor_num"], 2);
    assert_eq!(body["action"], "MONITOR_ON_VCP");
    assert_eq!(body["details"], "--MonitorNum=2 --VCP=0xD6:1");
}

#[cfg(unix)]
#[tokio::test]
async fn test_monitor_off_accepts_get() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(
        AuthConfig::disabled(),
        fake_tool::echo(&dir),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(&app, Method::GET, "/api/monitor/1/off", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "MONITOR_OFF_VCP");
    assert_eq!(body["details"], "--MonitorNum=1 --VCP=0xD6:5");
}

#[cfg(unix)]
#[tokio::test]
async fn test_monitor_tool_failure_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let tool = fake_tool::script(&dir, "echo 'DDC/CI not supported' >&2\nexit 2");
    let app = router(AuthConfig::disabled(), tool, AudioSubsystem::unavailable("test"));

    let (status, body) = send(&app, Method::POST, "/api/monitor/3/on", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["monitor_num"], 3);
    assert_eq!(body["details"], "Command failed: DDC/CI not supported");
}

#[cfg(unix)]
#[tokio::test]
async fn test_brightness_broadcast() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(
        AuthConfig::disabled(),
        fake_tool::echo(&dir),
        AudioSubsystem::unavailable("test"),
    );

    for selector in ["all", "0"] {
        let uri = format!("/api/monitor/{}/brightness/50", selector);
        let (status, body) = send(&app, Method::POST, &uri, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["brightness_level"], 50);
        assert_eq!(body["target"], "All monitors");
        assert_eq!(body["details"], "--AllMonitors --Set=50");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_brightness_single_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(
        AuthConfig::disabled(),
        fake_tool::echo(&dir),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(&app, Method::GET, "/api/monitor/2/brightness/75", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"], "Monitor 2");
    assert_eq!(body["message"], "Monitor 2 brightness set to 75%.");
    assert_eq!(body["details"], "--MonitorNum=2 --Set=75");
}

#[cfg(unix)]
#[tokio::test]
async fn test_brightness_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(
        AuthConfig::disabled(),
        fake_tool::echo(&dir),
        AudioSubsystem::unavailable("test"),
    );

    for uri in [
        "/api/monitor/1/brightness/101",
        "/api/monitor/1/brightness/-5",
        "/api/monitor/1/brightness/bright",
        "/api/monitor/-1/brightness/50",
        "/api/monitor/left/brightness/50",
    ] {
        let (status, body) = send(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["status"], "error");
        assert!(body.get("details").is_none());
        assert!(body.get("brightness_level").is_none());
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_power_rejects_non_positive_monitor() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(
        AuthConfig::disabled(),
        fake_tool::echo(&dir),
        AudioSubsystem::unavailable("test"),
    );

    for uri in ["/api/monitor/0/on", "/api/monitor/all/off", "/api/monitor/-3/on"] {
        let (status, body) = send(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "Monitor number must be a positive integer.");
    }
}

#[tokio::test]
async fn test_missing_tool_reported_before_validation() {
    let app = router(
        AuthConfig::disabled(),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(&app, Method::POST, "/api/monitor/x/brightness/500", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_auth_missing_key() {
    let app = router(
        AuthConfig::with_key("s3cret"),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(&app, Method::POST, "/api/monitor/1/on", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "API key required. Please provide it in the 'X-API-Key' header."
    );
}

#[tokio::test]
async fn test_auth_wrong_key() {
    let app = router(
        AuthConfig::with_key("s3cret"),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(&app, Method::GET, "/api/audio/status", Some("S3CRET")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid API key.");
}

#[tokio::test]
async fn test_auth_checked_before_validation() {
    let app = router(
        AuthConfig::with_key("s3cret"),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    let (status, _) = send(&app, Method::POST, "/api/monitor/1/brightness/999", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_correct_key_reaches_handler() {
    let app = router(
        AuthConfig::with_key("s3cret"),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/monitor/4/status-placeholder",
        Some("s3cret"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "info");
    assert_eq!(body["monitor_num"], 4);
}

#[tokio::test]
async fn test_audio_status_unavailable() {
    let app = router(
        AuthConfig::disabled(),
        missing_tool(),
        AudioSubsystem::unavailable("no audio backend"),
    );

    let (status, body) = send(&app, Method::GET, "/api/audio/status", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Audio control is unavailable: no audio backend"
    );
}

#[tokio::test]
async fn test_audio_mute_unmute_and_status() {
    let backend = Arc::new(MemoryAudio::default());
    let app = router(
        AuthConfig::disabled(),
        missing_tool(),
        AudioSubsystem::Available(backend.clone()),
    );

    let (status, body) = send(&app, Method::POST, "/api/audio/mute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "MUTE");
    assert_eq!(body["audio_muted"], true);

    let (_, body) = send(&app, Method::GET, "/api/audio/status", None).await;
    assert_eq!(body["audio_muted"], true);

    let (status, body) = send(&app, Method::GET, "/api/audio/unmute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "UNMUTE");
    assert_eq!(body["audio_muted"], false);

    // Every operation pairs its session init with a release.
    let sessions = backend.sessions.load(Ordering::SeqCst);
    assert_eq!(sessions, 3);
    assert_eq!(backend.releases.load(Ordering::SeqCst), sessions);
}

#[tokio::test]
async fn test_audio_toggle_twice_restores_state() {
    let backend = Arc::new(MemoryAudio::default());
    *backend.muted.lock().unwrap() = true;
    let app = router(
        AuthConfig::disabled(),
        missing_tool(),
        AudioSubsystem::Available(backend.clone()),
    );

    let (status, body) = send(&app, Method::POST, "/api/audio/mute/toggle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "TOGGLE_MUTE");
    assert_eq!(body["audio_muted"], false);

    let (_, body) = send(&app, Method::POST, "/api/audio/mute/toggle", None).await;
    assert_eq!(body["audio_muted"], true);
    assert!(*backend.muted.lock().unwrap());
}

#[tokio::test]
async fn test_disallowed_methods_are_enveloped() {
    let app = router(
        AuthConfig::disabled(),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    for (method, uri) in [
        (Method::POST, "/api/audio/status"),
        (Method::POST, "/api/monitor/1/status-placeholder"),
        (Method::DELETE, "/api/monitor/1/on"),
        (Method::PUT, "/api/audio/mute"),
        (Method::POST, "/healthz"),
    ] {
        let (status, body) = send(&app, method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body["status"], "error", "{method} {uri}");
        assert!(body["message"].as_str().unwrap().contains(method.as_str()));
    }
}

#[tokio::test]
async fn test_undecodable_path_segment_is_enveloped_400() {
    let app = router(
        AuthConfig::disabled(),
        missing_tool(),
        AudioSubsystem::unavailable("test"),
    );

    for uri in [
        "/api/monitor/%FF/on",
        "/api/monitor/%FF/off",
        "/api/monitor/1/brightness/%FF",
        "/api/monitor/%FF/brightness/50",
        "/api/monitor/%FF/status-placeholder",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["status"], "error", "{uri}");
        assert!(body["message"].as_str().unwrap().contains("UTF-8"), "{uri}");
    }
}

#[tokio::test]
async fn test_healthz() {
    let backend = Arc::new(MemoryAudio::default());
    let app = router(
        AuthConfig::with_key("s3cret"),
        missing_tool(),
        AudioSubsystem::Available(backend),
    );

    let (status, body) = send(&app, Method::GET, "/healthz", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["monitor_tool_found"], false);
    assert_eq!(body["audio_available"], true);
}
