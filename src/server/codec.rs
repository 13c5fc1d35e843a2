//! Newline-delimited JSON framing for the master/slave wire protocol.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a maximum frame length so a
//! peer cannot make the slave buffer an unbounded request. Each request and
//! each response is one `\n`-terminated UTF-8 line. `serde_json` never emits
//! a raw newline, so any serialized [`Batch`](crate::models::Batch) fits in
//! one frame.
//!
//! A final frame without a trailing newline is still accepted when the peer
//! half-closes its side, so `printf '{...}' | nc` style clients keep working.

use std::fmt::{Display, Formatter};

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::AppError;

/// Default maximum frame length: 1 MiB.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1_048_576;

/// Framing failure.
#[derive(Debug)]
pub enum FrameError {
    /// The inbound frame exceeded the configured limit.
    TooLarge {
        /// Limit that was exceeded, in bytes.
        limit: usize,
    },
    /// Underlying socket failure.
    Io(std::io::Error),
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLarge { limit } => write!(f, "payload too large: exceeded {limit} bytes"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FrameError> for AppError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::TooLarge { .. } => Self::Protocol(err.to_string()),
            FrameError::Io(io_err) => Self::Transport(io_err.to_string()),
        }
    }
}

/// Line codec with a bounded frame length.
#[derive(Debug)]
pub struct FrameCodec {
    inner: LinesCodec,
    limit: usize,
}

impl FrameCodec {
    /// Codec accepting frames of at most `max_frame_bytes`.
    #[must_use]
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_frame_bytes),
            limit: max_frame_bytes,
        }
    }

    /// Codec with no frame length limit.
    ///
    /// Used by the master to read responses, whose size is set by what the
    /// batch produced rather than by the slave's request limit.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            inner: LinesCodec::new(),
            limit: usize::MAX,
        }
    }

    /// Configured maximum frame length.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limit = self.limit;
        self.inner.decode(src).map_err(|err| map_error(err, limit))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let limit = self.limit;
        self.inner
            .decode_eof(src)
            .map_err(|err| map_error(err, limit))
    }
}

impl Encoder<String> for FrameCodec {
    type Error = FrameError;

    // The limit only guards the decoder; responses are never refused.
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let limit = self.limit;
        self.inner.encode(item, dst).map_err(|err| map_error(err, limit))
    }
}

fn map_error(err: LinesCodecError, limit: usize) -> FrameError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => FrameError::TooLarge { limit },
        LinesCodecError::Io(io_err) => FrameError::Io(io_err),
    }
}
