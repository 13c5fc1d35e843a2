//! Resolve one command against the registry and run it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::models::{Command, Response};
use crate::registry::Registry;

/// Execute a single command and convert the outcome into a [`Response`].
#[must_use]
pub fn dispatch(registry: &Registry, command: &Command) -> Response {
    if command.name.is_empty() {
        warn!("rejected command with empty name");
        return Response::error("command name cannot be empty");
    }

    let Some(primitive) = registry.lookup(&command.name) else {
        warn!(command = %command.name, "unknown primitive");
        return Response::error(format!("primitive {} is not implemented", command.name));
    };

    // A panicking primitive must not take the whole batch down with it.
    let result = match panic::catch_unwind(AssertUnwindSafe(|| primitive.execute(&command.args))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!(command = %command.name, %reason, "primitive panicked");
            return Response::error(format!(
                "error running primitive {}: panicked: {reason}",
                command.name
            ));
        }
    };

    match result {
        Ok(data) => {
            debug!(command = %command.name, bytes = data.len(), "primitive succeeded");
            Response::ok(data)
        }
        Err(err) => {
            warn!(command = %command.name, %err, "primitive failed");
            Response::error(format!("error running primitive {}: {err}", command.name))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_owned()
    }
}
