//! Ordered, non-short-circuiting batch execution.

use tracing::{debug, info_span};

use super::dispatch;
use crate::models::{Batch, BatchResponse};
use crate::registry::Registry;

/// Run every command of `batch` in order and aggregate the results.
///
/// A failing command does not stop later ones. `results[i]` always belongs
/// to `batch.commands[i]`.
#[must_use]
pub fn run_batch(registry: &Registry, batch: &Batch) -> BatchResponse {
    let span = info_span!("run_batch", commands = batch.len());
    let _guard = span.enter();

    let results = batch
        .commands
        .iter()
        .enumerate()
        .map(|(index, command)| {
            debug!(index, command = %command.name, "dispatching");
            dispatch(registry, command)
        })
        .collect();

    let response = BatchResponse::from_results(results);
    debug!(
        status = response.status,
        failed = response.failed_count(),
        "batch finished"
    );
    response
}
