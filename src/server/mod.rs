//! Slave-side transport: framing, per-connection handling, accept loop.

pub mod codec;
pub mod connection;
pub mod listener;

pub use codec::{FrameCodec, FrameError, DEFAULT_MAX_FRAME_BYTES};
pub use connection::{handle_connection, process_frame, ConnectionLimits};
pub use listener::{bind, spawn_server};
