//! End-to-end: master client against a live slave on loopback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opsmith::client::send_batch;
use opsmith::models::{Batch, Command, STATUS_ERROR, STATUS_OK};
use opsmith::primitives::Primitive;
use opsmith::{GlobalConfig, Registry, Result};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::test_helpers::{path_str, spawn_slave, spawn_slave_with, test_config};

#[tokio::test]
async fn create_write_read_over_tcp() {
    let slave = spawn_slave(test_config()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = path_str(&dir.path().join("t1.txt"));

    let batch = Batch::new(vec![
        Command::new("CreateFile", [path.as_str()]),
        Command::new("WriteFile", [path.as_str(), "hi"]),
        Command::new("ReadFile", [path.as_str()]),
    ]);
    let response = send_batch(&slave.addr, &batch)
        .await
        .expect("response");

    assert_eq!(response.status, STATUS_OK);
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[2].data, "hi");
    slave.ct.cancel();
}

#[tokio::test]
async fn mixed_batch_reports_every_result_in_order() {
    let slave = spawn_slave(test_config()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let a = path_str(&dir.path().join("a.txt"));
    let b = path_str(&dir.path().join("b.txt"));

    let batch = Batch::new(vec![
        Command::new("CreateFile", [a.as_str()]),
        Command::new("Foo", Vec::<String>::new()),
        Command::new("CreateFile", [b.as_str()]),
    ]);
    let response = send_batch(&slave.addr, &batch)
        .await
        .expect("response");

    assert_eq!(response.status, STATUS_ERROR);
    let statuses: Vec<i32> = response.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![STATUS_OK, STATUS_ERROR, STATUS_OK]);
    assert_eq!(response.results[1].error, "primitive Foo is not implemented");
    slave.ct.cancel();
}

#[cfg(unix)]
#[tokio::test]
async fn command_exec_over_tcp() {
    let slave = spawn_slave(test_config()).await;
    let batch = Batch::new(vec![Command::new("CommandExec", ["echo remote"])]);

    let response = send_batch(&slave.addr, &batch)
        .await
        .expect("response");
    assert_eq!(response.results[0].data, "remote\n");
    slave.ct.cancel();
}

#[tokio::test]
async fn server_survives_bad_connections() {
    let slave = spawn_slave(test_config()).await;

    // Garbage, then an immediate hang-up.
    let mut garbage = TcpStream::connect(&slave.addr).await.expect("connect");
    garbage.write_all(b"{{{{\n").await.expect("write");
    drop(garbage);
    drop(TcpStream::connect(&slave.addr).await.expect("connect"));

    let batch = Batch::new(vec![Command::new("Foo", Vec::<String>::new())]);
    let response = send_batch(&slave.addr, &batch)
        .await
        .expect("still serving");
    assert_eq!(response.results.len(), 1);
    slave.ct.cancel();
}

#[tokio::test]
async fn oversized_request_is_reported_to_master() {
    let config = GlobalConfig {
        max_frame_bytes: 256,
        ..test_config()
    };
    let slave = spawn_slave(config).await;

    let batch = Batch::new(vec![Command::new("ReadFile", ["y".repeat(1024)])]);
    let err = send_batch(&slave.addr, &batch)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("payload too large"), "got: {err}");
    slave.ct.cancel();
}

#[tokio::test]
async fn response_larger_than_request_limit_reaches_master() {
    let slave = spawn_slave(test_config()).await;
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("big.txt");
    let contents = "a".repeat(2 * slave_frame_limit());
    std::fs::write(&path, &contents).expect("write big file");

    let batch = Batch::new(vec![Command::new("ReadFile", [path_str(&path)])]);
    let response = send_batch(&slave.addr, &batch)
        .await
        .expect("large response");

    assert_eq!(response.status, STATUS_OK);
    assert_eq!(response.results[0].data.len(), contents.len());
    slave.ct.cancel();
}

fn slave_frame_limit() -> usize {
    test_config().max_frame_bytes
}

/// Blocks until released, counting how many calls overlap.
struct Gate {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Primitive for Gate {
    fn name(&self) -> &str {
        "Gate"
    }

    fn execute(&self, _args: &[String]) -> Result<String> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(150));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok("done".into())
    }
}

fn gate_registry() -> (Registry, Arc<AtomicUsize>) {
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = Registry::builder()
        .register(Gate {
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        })
        .build();
    (registry, peak)
}

async fn fire_concurrently(addr: &str, count: usize) {
    let mut tasks = Vec::new();
    for _ in 0..count {
        let addr = addr.to_owned();
        tasks.push(tokio::spawn(async move {
            let batch = Batch::new(vec![Command::new("Gate", Vec::<String>::new())]);
            send_batch(&addr, &batch).await
        }));
    }
    for task in tasks {
        let response = task.await.expect("task joins").expect("response");
        assert_eq!(response.results[0].data, "done");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn connections_are_handled_concurrently() {
    let (registry, peak) = gate_registry();
    let slave = spawn_slave_with(test_config(), registry).await;

    fire_concurrently(&slave.addr, 4).await;

    assert!(peak.load(Ordering::SeqCst) > 1, "expected overlapping handlers");
    slave.ct.cancel();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn admission_limit_caps_concurrent_handlers() {
    let (registry, peak) = gate_registry();
    let config = GlobalConfig {
        max_connections: 1,
        ..test_config()
    };
    let slave = spawn_slave_with(config, registry).await;

    fire_concurrently(&slave.addr, 3).await;

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    slave.ct.cancel();
}

#[tokio::test]
async fn cancellation_stops_the_accept_loop() {
    let slave = spawn_slave(test_config()).await;
    slave.ct.cancel();

    tokio::time::timeout(Duration::from_secs(5), slave.handle)
        .await
        .expect("loop exits after cancel")
        .expect("task joins");
}
