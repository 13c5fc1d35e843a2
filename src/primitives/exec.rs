//! Shell execution primitive.
//!
//! **Unsandboxed.** `CommandExec` hands its argument to a shell running
//! with the slave's own privileges. Any allow-list or isolation belongs in a
//! separate policy layer in front of the registry, not in here.

use std::process::{Command, Stdio};

use tracing::debug;

use super::{expect_args, require_non_empty, Primitive};
use crate::{AppError, Result};

/// Default interpreter used on Unix.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Run one shell line and capture its output.
#[derive(Debug, Clone)]
pub struct CommandExec {
    shell: String,
}

impl CommandExec {
    /// Use `shell` (invoked as `<shell> -c <line>`) on Unix.
    ///
    /// On other platforms `cmd /C <line>` is always used.
    #[must_use]
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    fn build(&self, line: &str) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new(&self.shell);
            cmd.arg("-c");
            cmd
        };
        cmd.arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for CommandExec {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl Primitive for CommandExec {
    fn name(&self) -> &str {
        "CommandExec"
    }

    fn execute(&self, args: &[String]) -> Result<String> {
        expect_args(self.name(), args, 1, "command to execute")?;
        let line = require_non_empty(&args[0], "command")?;

        debug!(shell = %self.shell, command = line, "spawning shell");
        let output = self.build(line).output().map_err(|err| {
            AppError::Resource(format!("could not execute command {line}: {err}"))
        })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        let text = String::from_utf8_lossy(&combined).into_owned();

        if !output.status.success() {
            let detail = text.trim();
            return Err(AppError::Resource(if detail.is_empty() {
                format!("could not execute command {line}: {}", output.status)
            } else {
                format!("could not execute command {line}: {}: {detail}", output.status)
            }));
        }

        if text.is_empty() {
            return Err(AppError::Resource(format!(
                "command {line} returned no output"
            )));
        }

        Ok(text)
    }
}
