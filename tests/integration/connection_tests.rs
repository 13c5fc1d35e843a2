//! Connection handler state machine over in-memory streams.

use std::sync::Arc;
use std::time::Duration;

use opsmith::models::{BatchResponse, ErrorFrame, STATUS_ERROR, STATUS_OK};
use opsmith::server::{handle_connection, process_frame, ConnectionLimits};
use opsmith::{AppError, Registry};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn registry() -> Arc<Registry> {
    Arc::new(Registry::builtin("/bin/sh"))
}

fn limits() -> ConnectionLimits {
    ConnectionLimits {
        max_frame_bytes: 1024,
        read_timeout: Duration::from_secs(5),
    }
}

#[test]
fn process_frame_runs_valid_batch() {
    let response = process_frame(&Registry::builtin("/bin/sh"), r#"{"commands":[{"name":"Foo","args":[]}]}"#)
        .expect("valid frame");
    assert_eq!(response.status, STATUS_ERROR);
    assert_eq!(response.results[0].error, "primitive Foo is not implemented");
}

#[test]
fn process_frame_rejects_malformed_json() {
    assert!(matches!(
        process_frame(&Registry::builtin("/bin/sh"), "{\"commands\":["),
        Err(AppError::Protocol(_))
    ));
}

#[tokio::test]
async fn valid_request_gets_one_response_then_close() {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(handle_connection(server, registry(), limits()));

    client
        .write_all(b"{\"commands\":[{\"name\":\"Foo\",\"args\":[]}]}\n")
        .await
        .expect("write request");

    let mut raw = String::new();
    client.read_to_string(&mut raw).await.expect("read until close");
    assert!(raw.ends_with('\n'));

    let response: BatchResponse = serde_json::from_str(raw.trim_end()).expect("batch response");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.status, STATUS_ERROR);

    task.await.expect("task joins").expect("handled");
}

#[tokio::test]
async fn request_terminated_by_eof_is_served() {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(handle_connection(server, registry(), limits()));

    client
        .write_all(b"{\"commands\":[]}")
        .await
        .expect("write request");
    client.shutdown().await.expect("half close");

    let mut raw = String::new();
    client.read_to_string(&mut raw).await.expect("read until close");
    let response: BatchResponse = serde_json::from_str(raw.trim_end()).expect("batch response");
    assert!(response.results.is_empty());
    assert_eq!(response.status, STATUS_OK);

    task.await.expect("task joins").expect("handled");
}

#[tokio::test]
async fn malformed_json_closes_without_response() {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(handle_connection(server, registry(), limits()));

    client.write_all(b"not json at all\n").await.expect("write");

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.expect("read until close");
    assert!(raw.is_empty(), "no frame may be sent for malformed input");

    let outcome = task.await.expect("task joins");
    assert!(matches!(outcome, Err(AppError::Protocol(_))));
}

#[tokio::test]
async fn missing_required_field_closes_without_response() {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(handle_connection(server, registry(), limits()));

    client
        .write_all(b"{\"commands\":[{\"args\":[\"/tmp/x\"]}]}\n")
        .await
        .expect("write");

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.expect("read until close");
    assert!(raw.is_empty());
    assert!(task.await.expect("task joins").is_err());
}

#[tokio::test]
async fn oversized_request_gets_error_frame() {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let task = tokio::spawn(handle_connection(server, registry(), limits()));

    let padding = "x".repeat(4096);
    let request = format!("{{\"commands\":[{{\"name\":\"ReadFile\",\"args\":[\"{padding}\"]}}]}}\n");
    client.write_all(request.as_bytes()).await.expect("write");

    let mut raw = String::new();
    client.read_to_string(&mut raw).await.expect("read until close");
    let frame: ErrorFrame = serde_json::from_str(raw.trim_end()).expect("error frame");
    assert_eq!(frame.status, STATUS_ERROR);
    assert!(frame.error.contains("payload too large"), "got: {}", frame.error);

    let outcome = task.await.expect("task joins");
    assert!(matches!(outcome, Err(AppError::Protocol(_))));
}

#[tokio::test]
async fn silent_peer_times_out() {
    let (_client, server) = tokio::io::duplex(1024);
    let limits = ConnectionLimits {
        max_frame_bytes: 1024,
        read_timeout: Duration::from_millis(50),
    };

    let outcome = handle_connection(server, registry(), limits).await;
    match outcome {
        Err(AppError::Transport(msg)) => assert!(msg.contains("no request")),
        other => panic!("expected Transport timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn peer_closing_before_request_is_protocol_error() {
    let (client, server) = tokio::io::duplex(1024);
    drop(client);

    let outcome = handle_connection(server, registry(), limits()).await;
    assert!(matches!(outcome, Err(AppError::Protocol(_))));
}

#[test]
fn limits_follow_config() {
    let config = opsmith::GlobalConfig {
        max_frame_bytes: 2048,
        read_timeout_seconds: 7,
        ..opsmith::GlobalConfig::default()
    };
    let limits = ConnectionLimits::from_config(&config);
    assert_eq!(limits.max_frame_bytes, 2048);
    assert_eq!(limits.read_timeout, Duration::from_secs(7));
}
