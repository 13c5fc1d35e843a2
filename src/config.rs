//! Global configuration parsing and validation.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration and the slave can run without a config file at all.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::llm::Model;
use crate::primitives::exec::DEFAULT_SHELL;
use crate::{AppError, Result};

/// Settings for the upstream model backends used by the master.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Model used when the caller does not choose one.
    #[serde(default)]
    pub default_model: Model,
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    /// Base URL of the `OpenAI`-compatible API.
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
    /// Whole-request HTTP timeout.
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
    /// API key for the `OpenAI` backend (populated at runtime).
    #[serde(skip)]
    pub openai_api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: Model::default(),
            ollama_url: default_ollama_url(),
            openai_url: default_openai_url(),
            timeout_seconds: default_llm_timeout_seconds(),
            openai_api_key: None,
        }
    }
}

impl LlmConfig {
    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_timeout_seconds() -> u64 {
    120
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    7878
}

fn default_max_connections() -> usize {
    64
}

fn default_max_frame_bytes() -> usize {
    1_048_576
}

fn default_read_timeout_seconds() -> u64 {
    30
}

fn default_shell() -> String {
    DEFAULT_SHELL.into()
}

/// Global configuration parsed from `opsmith.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the slave listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port the slave listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connections handled at once; later ones wait in the accept backlog.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Largest request frame accepted, in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Time allowed for a peer to deliver its request frame.
    #[serde(default = "default_read_timeout_seconds")]
    pub read_timeout_seconds: u64,
    /// Interpreter used by `CommandExec` on Unix.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Model backend settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_connections: default_max_connections(),
            max_frame_bytes: default_max_frame_bytes(),
            read_timeout_seconds: default_read_timeout_seconds(),
            shell: default_shell(),
            llm: LlmConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// `bind_address:port` as accepted by `TcpListener::bind`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Read timeout as a [`Duration`].
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(AppError::Config(
                "max_connections must be greater than zero".into(),
            ));
        }

        if self.max_connections > Semaphore::MAX_PERMITS {
            return Err(AppError::Config(format!(
                "max_connections must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }

        if self.max_frame_bytes == 0 {
            return Err(AppError::Config(
                "max_frame_bytes must be greater than zero".into(),
            ));
        }

        if self.read_timeout_seconds == 0 {
            return Err(AppError::Config(
                "read_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.shell.trim().is_empty() {
            return Err(AppError::Config("shell must not be empty".into()));
        }

        Ok(())
    }
}
