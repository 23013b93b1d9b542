//! Self-contained integration tests for the control server
//!
//! These tests start their own instance of the control server on an
//! ephemeral loopback port, so they don't require a separately running server.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use winiot_agent::audio::{AudioGateway, AudioSubsystem};
use winiot_agent::config::AuthConfig;
use winiot_agent::control::{CommandHandler, ControlServer};
use winiot_agent::executor::ProcessExecutor;
use winiot_agent::monitor::MonitorTool;

fn handler(auth: AuthConfig) -> Arc<CommandHandler> {
    Arc::new(CommandHandler::new(
        auth,
        MonitorTool::new("definitely-not-a-real-monitor-tool-7f3a", false),
        ProcessExecutor::default(),
        AudioGateway::new(AudioSubsystem::unavailable("test")),
    ))
}

/// Send one raw HTTP/1.1 request and return the full response text
async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr)
        .await
        .expect("Failed to connect to control server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("Failed to write request");

    let mut response = String::new();
    timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
        .await
        .expect("Timed out reading response")
        .expect("Failed to read response");
    response
}

/// Start the server, query it, and shut it down gracefully
#[tokio::test]
async fn test_control_server_lifecycle() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    let server = ControlServer::new(addr.to_string(), handler(AuthConfig::disabled()));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server_task = tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let response = raw_request(
        addr,
        "GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("\"monitor_tool_found\":false"));
    assert!(response.contains("\"audio_available\":false"));

    stop_tx.send(()).expect("Server already stopped");
    let result = timeout(Duration::from_secs(5), server_task)
        .await
        .expect("Server did not stop after shutdown signal")
        .expect("Server task panicked");
    assert!(result.is_ok());
}

/// Auth errors are returned over the wire with the JSON envelope
#[tokio::test]
async fn test_control_server_rejects_missing_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = ControlServer::new(addr.to_string(), handler(AuthConfig::with_key("s3cret")));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let response = raw_request(
        addr,
        "POST /api/audio/mute HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 401"), "{response}");
    assert!(response.contains("application/json"));
    assert!(response.contains("\"status\":\"error\""));

    let response = raw_request(
        addr,
        "GET /api/audio/status HTTP/1.1\r\nHost: localhost\r\nX-API-Key: s3cret\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 503"), "{response}");

    let _ = stop_tx.send(());
    let _ = timeout(Duration::from_secs(5), server_task).await;
}

/// Binding an address already in use is reported as an error
#[tokio::test]
async fn test_control_server_bind_conflict() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = occupied.local_addr().unwrap();

    let server = ControlServer::new(addr.to_string(), handler(AuthConfig::disabled()));
    let result = timeout(Duration::from_secs(5), server.run(std::future::pending()))
        .await
        .expect("Server bound an occupied address");

    assert!(result.is_err());
    drop(occupied);
}
