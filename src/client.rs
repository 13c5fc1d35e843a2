//! Master side of the wire protocol.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info_span, Instrument};

use crate::models::{Batch, BatchResponse, ErrorFrame};
use crate::server::FrameCodec;
use crate::{AppError, Result};

/// Anything the slave may send back.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply {
    Batch(BatchResponse),
    Refused(ErrorFrame),
}

/// Send `batch` to the slave at `addr` and wait for its response.
///
/// The response frame is read without a length limit: by the time it
/// arrives every command has already run on the slave.
///
/// # Errors
///
/// - `AppError::Transport` if the connection or a write/read fails.
/// - `AppError::Protocol` if the slave closes without replying, refuses the
///   request with an error frame, or replies with something unparseable.
///   This is distinct from a batch whose `status` is `-1`.
pub async fn send_batch(addr: &str, batch: &Batch) -> Result<BatchResponse> {
    let span = info_span!("send_batch", slave = addr, commands = batch.len());
    exchange(addr, batch).instrument(span).await
}

async fn exchange(addr: &str, batch: &Batch) -> Result<BatchResponse> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|err| AppError::Transport(format!("failed to connect to {addr}: {err}")))?;
    let mut framed = Framed::new(stream, FrameCodec::unbounded());

    let request = serde_json::to_string(batch)?;
    debug!(bytes = request.len(), "sending batch");
    framed.send(request).await?;

    let Some(frame) = framed.next().await else {
        return Err(AppError::Protocol(
            "connection closed without a response".into(),
        ));
    };

    match serde_json::from_str::<Reply>(&frame?)? {
        Reply::Batch(response) => Ok(response),
        Reply::Refused(refused) => Err(AppError::Protocol(refused.error)),
    }
}
