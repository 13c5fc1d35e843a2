#![forbid(unsafe_code)]

//! `opsmith-slave` — worker node.
//!
//! Loads configuration, builds the primitive registry, and serves batch
//! requests on a TCP port until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use opsmith::server::{bind, spawn_server};
use opsmith::telemetry::{init_tracing, LogFormat};
use opsmith::{AppError, GlobalConfig, Registry, Result};

#[derive(Debug, Parser)]
#[command(name = "opsmith-slave", about = "opsmith worker node", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Interface to bind (overrides the config file).
    #[arg(long)]
    bind: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("opsmith-slave bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind_address) = args.bind {
        config.bind_address = bind_address;
    }
    config.validate()?;
    info!(addr = %config.listen_addr(), "configuration loaded");

    // ── Build registry ──────────────────────────────────
    let registry = Arc::new(Registry::builtin(&config.shell));
    info!(primitives = ?registry.names(), "registry ready");

    // ── Serve ───────────────────────────────────────────
    let listener = bind(&config.listen_addr()).await?;
    let ct = CancellationToken::new();
    let server = spawn_server(listener, registry, &config, ct.clone());

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    let _ = server.await;

    info!("opsmith-slave shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}
