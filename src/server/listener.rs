//! TCP accept loop.
//!
//! Each accepted connection runs on its own task. A semaphore caps how many
//! are in flight; once every permit is taken the loop stops accepting and
//! new peers wait in the kernel backlog.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::connection::{handle_connection, ConnectionLimits};
use crate::config::GlobalConfig;
use crate::registry::Registry;
use crate::{AppError, Result};

/// Pause after a failed `accept` so persistent errors such as `EMFILE`
/// do not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind the slave listener.
///
/// # Errors
///
/// Returns `AppError::Transport` if the address cannot be bound.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::Transport(format!("failed to bind {addr}: {err}")))
}

/// Spawn the accept loop on `listener`.
///
/// The loop runs until `ct` is cancelled. Connections already being handled
/// are not awaited; they end when the runtime shuts down.
#[must_use]
pub fn spawn_server(
    listener: TcpListener,
    registry: Arc<Registry>,
    config: &GlobalConfig,
    ct: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let limits = ConnectionLimits::from_config(config);
    let admission = Arc::new(Semaphore::new(config.max_connections));
    let local = listener
        .local_addr()
        .map_or_else(|_| "unknown".to_owned(), |addr| addr.to_string());

    info!(
        addr = %local,
        max_connections = config.max_connections,
        primitives = registry.len(),
        "slave listening"
    );

    tokio::spawn(
        async move {
            loop {
                let permit = tokio::select! {
                    () = ct.cancelled() => break,
                    permit = Arc::clone(&admission).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                tokio::select! {
                    () = ct.cancelled() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            let registry = Arc::clone(&registry);
                            let span = info_span!("conn", conn_id = %Uuid::new_v4(), %peer);
                            tokio::spawn(
                                async move {
                                    match handle_connection(stream, registry, limits).await {
                                        Ok(()) => info!("connection closed"),
                                        Err(err) => warn!(%err, "connection aborted"),
                                    }
                                    drop(permit);
                                }
                                .instrument(span),
                            );
                        }
                        Err(err) => {
                            warn!(%err, "accept failed");
                            drop(permit);
                            tokio::select! {
                                () = ct.cancelled() => break,
                                () = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                            }
                        }
                    },
                }
            }
            info!("slave stopped accepting connections");
        }
        .instrument(info_span!("server", addr = %local)),
    )
}
