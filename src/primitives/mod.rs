//! Built-in primitives and the capability trait they implement.
//!
//! Every primitive validates its own arity and required arguments before
//! touching the filesystem or spawning anything, so an argument error never
//! leaves a side effect behind.

pub mod exec;
pub mod file;

use std::path::PathBuf;

use crate::{AppError, Result};

pub use exec::CommandExec;
pub use file::{AppendFile, CreateFile, DeleteFile, ReadFile, WriteFile};

/// A named, fixed-arity operation exposed to remote invocation.
///
/// Implementations hold no per-call state; one instance serves every
/// connection concurrently. A panic inside `execute` is reported as that
/// command's error and does not abort the batch.
pub trait Primitive: Send + Sync {
    /// Registry name, matched exactly and case-sensitively.
    fn name(&self) -> &str;

    /// Run the primitive with positional `args`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Argument` for arity or empty-argument problems and
    /// `AppError::Resource` for filesystem or process failures.
    fn execute(&self, args: &[String]) -> Result<String>;
}

/// Fail unless exactly `expected` arguments were supplied.
///
/// `usage` names the arguments for the error message, e.g. `"file path"`.
pub(crate) fn expect_args(name: &str, args: &[String], expected: usize, usage: &str) -> Result<()> {
    if args.len() == expected {
        return Ok(());
    }
    let count = match expected {
        1 => "one argument",
        2 => "two arguments",
        _ => "arguments",
    };
    Err(AppError::Argument(format!(
        "{name} requires exactly {count} ({usage}), got {}",
        args.len()
    )))
}

/// Fail when a required argument is the empty string.
pub(crate) fn require_non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    if value.is_empty() {
        Err(AppError::Argument(format!("{what} cannot be empty")))
    } else {
        Ok(value)
    }
}

/// Apply the `~/` expansion rule using the current user's home directory.
///
/// Only active on Unix; elsewhere the path is returned unchanged.
///
/// # Errors
///
/// Returns `AppError::Argument` when the path needs expanding but the home
/// directory is unknown.
pub fn expand_path(path: &str) -> Result<PathBuf> {
    if cfg!(unix) {
        expand_path_with(path, std::env::var("HOME").ok().as_deref())
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Expand a leading `~/` against `home`; any other path passes through.
///
/// # Errors
///
/// Returns `AppError::Argument` when `path` starts with `~/` and `home` is
/// `None` or empty.
pub fn expand_path_with(path: &str, home: Option<&str>) -> Result<PathBuf> {
    let Some(rest) = path.strip_prefix("~/") else {
        return Ok(PathBuf::from(path));
    };
    match home {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(format!("{home}/{rest}"))),
        _ => Err(AppError::Argument(format!(
            "could not expand file path {path}: home directory is not set"
        ))),
    }
}
