//! Inbound request types: a single command and an ordered batch of them.

use serde::{Deserialize, Serialize};

/// One primitive invocation: a registry name plus positional arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    /// Exact, case-sensitive primitive name.
    pub name: String,
    /// Positional string arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Command {
    /// Build a command from a name and any iterable of arguments.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered list of commands submitted together in one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Batch {
    /// Commands, executed in this order.
    pub commands: Vec<Command>,
}

impl Batch {
    /// Wrap an ordered list of commands.
    #[must_use]
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Number of commands in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch carries no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
