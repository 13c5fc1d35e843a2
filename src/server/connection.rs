//! One request, one response, then close.
//!
//! `Accepted → Reading → Parsing → Executing → Writing → Closed`. Read
//! errors, timeouts, and malformed JSON end the connection without a reply.
//! An oversized frame is answered with an [`ErrorFrame`] before closing.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use super::codec::{FrameCodec, FrameError};
use crate::config::GlobalConfig;
use crate::executor::run_batch;
use crate::models::{Batch, BatchResponse, ErrorFrame};
use crate::registry::Registry;
use crate::{AppError, Result};

/// Per-connection bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Largest request frame accepted.
    pub max_frame_bytes: usize,
    /// Time allowed for the request frame to arrive.
    pub read_timeout: Duration,
}

impl ConnectionLimits {
    /// Limits taken from the global configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            max_frame_bytes: config.max_frame_bytes,
            read_timeout: config.read_timeout(),
        }
    }
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default())
    }
}

/// Parse one request frame and run it.
///
/// # Errors
///
/// Returns `AppError::Protocol` if `frame` is not a valid batch.
pub fn process_frame(registry: &Registry, frame: &str) -> Result<BatchResponse> {
    let batch: Batch = serde_json::from_str(frame)?;
    Ok(run_batch(registry, &batch))
}

/// Serve a single request on `stream`.
///
/// Returns `Ok(())` once a response has been written. Any `Err` means the
/// connection was abandoned early; the caller only needs to log it.
///
/// # Errors
///
/// - `AppError::Transport` on read/write failure or read timeout.
/// - `AppError::Protocol` on an oversized frame, malformed JSON, or a peer
///   that closed before sending anything.
pub async fn handle_connection<S>(
    stream: S,
    registry: Arc<Registry>,
    limits: ConnectionLimits,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, FrameCodec::new(limits.max_frame_bytes));

    let frame = match tokio::time::timeout(limits.read_timeout, framed.next()).await {
        Err(_) => {
            return Err(AppError::Transport(format!(
                "no request within {}s",
                limits.read_timeout.as_secs()
            )))
        }
        Ok(None) => {
            return Err(AppError::Protocol(
                "connection closed before a request arrived".into(),
            ))
        }
        Ok(Some(Err(err @ FrameError::TooLarge { .. }))) => {
            warn!(%err, "rejecting oversized request");
            let reply = serde_json::to_string(&ErrorFrame::new(err.to_string()))?;
            if let Err(write_err) = framed.send(reply).await {
                warn!(err = %write_err, "failed to write error frame");
            }
            return Err(err.into());
        }
        Ok(Some(Err(err))) => return Err(err.into()),
        Ok(Some(Ok(frame))) => frame,
    };
    debug!(bytes = frame.len(), payload = %frame, "request received");

    let response = tokio::task::spawn_blocking(move || process_frame(&registry, &frame))
        .await
        .map_err(|err| AppError::Io(format!("batch task failed: {err}")))??;

    info!(
        commands = response.results.len(),
        failed = response.failed_count(),
        status = response.status,
        "batch executed"
    );

    let reply = serde_json::to_string(&response)?;
    let written = framed.send(reply).await.map_err(AppError::from);
    // Dropping `framed` closes the stream whether or not the write landed.
    drop(framed);
    written
}
