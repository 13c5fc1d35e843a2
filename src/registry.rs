//! Name → primitive lookup table.
//!
//! A [`RegistryBuilder`] collects primitives during startup and is consumed
//! by [`RegistryBuilder::build`]. The resulting [`Registry`] has no mutating
//! methods, so sharing it as `Arc<Registry>` across connections needs no lock.

use std::collections::HashMap;
use std::sync::Arc;

use crate::primitives::{
    AppendFile, CommandExec, CreateFile, DeleteFile, Primitive, ReadFile, WriteFile,
};

/// Frozen primitive table.
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Arc<dyn Primitive>>,
}

impl Registry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registry holding the six built-in primitives.
    ///
    /// `shell` is the interpreter `CommandExec` uses on Unix.
    #[must_use]
    pub fn builtin(shell: &str) -> Self {
        Self::builder()
            .register(ReadFile)
            .register(CreateFile)
            .register(WriteFile)
            .register(AppendFile)
            .register(DeleteFile)
            .register(CommandExec::new(shell))
            .build()
    }

    /// Find a primitive by exact name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn Primitive> {
        self.entries.get(name).map(Arc::as_ref)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered primitives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("primitives", &self.names())
            .finish()
    }
}

/// Mutable staging area for a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<String, Arc<dyn Primitive>>,
}

impl RegistryBuilder {
    /// Insert `primitive` under its own name, replacing any earlier entry.
    #[must_use]
    pub fn register(mut self, primitive: impl Primitive + 'static) -> Self {
        self.entries
            .insert(primitive.name().to_owned(), Arc::new(primitive));
        self
    }

    /// Insert `primitive` under an explicit `name`.
    #[must_use]
    pub fn register_as(mut self, name: impl Into<String>, primitive: Arc<dyn Primitive>) -> Self {
        self.entries.insert(name.into(), primitive);
        self
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}
