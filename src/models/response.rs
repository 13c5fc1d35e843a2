//! Outbound result types returned to the master.

use serde::{Deserialize, Serialize};

/// Status value of a successful command or batch.
pub const STATUS_OK: i32 = 0;

/// Status value of a failed command or batch.
pub const STATUS_ERROR: i32 = -1;

/// Result of exactly one command.
///
/// `status == STATUS_ERROR` if and only if `error` is non-empty. Build
/// values through [`Response::ok`] and [`Response::error`] to keep that true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    /// Primitive output on success, empty on failure.
    pub data: String,
    /// Failure description, empty on success.
    pub error: String,
    /// [`STATUS_OK`] or [`STATUS_ERROR`].
    pub status: i32,
}

impl Response {
    /// Successful result carrying `data`.
    #[must_use]
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            error: String::new(),
            status: STATUS_OK,
        }
    }

    /// Failed result carrying `message`.
    ///
    /// An empty message is replaced so the status/error pairing still holds.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        let mut error = message.into();
        if error.is_empty() {
            error = "unknown error".to_owned();
        }
        Self {
            data: String::new(),
            error,
            status: STATUS_ERROR,
        }
    }

    /// Whether this result represents a success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Aggregate result of a batch, index-aligned with its commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchResponse {
    /// One entry per command, in command order.
    pub results: Vec<Response>,
    /// [`STATUS_ERROR`] when any entry failed, else [`STATUS_OK`].
    pub status: i32,
}

impl BatchResponse {
    /// Aggregate per-command results into a batch response.
    #[must_use]
    pub fn from_results(results: Vec<Response>) -> Self {
        let status = if results.iter().all(Response::is_ok) {
            STATUS_OK
        } else {
            STATUS_ERROR
        };
        Self { results, status }
    }

    /// Number of results that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_ok()).count()
    }
}

/// Frame sent instead of a [`BatchResponse`] when the request itself could
/// not be accepted (currently only an oversized payload).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorFrame {
    /// Reason the request was refused.
    pub error: String,
    /// Always [`STATUS_ERROR`].
    pub status: i32,
}

impl ErrorFrame {
    /// Build an error frame with the given reason.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            status: STATUS_ERROR,
        }
    }
}
