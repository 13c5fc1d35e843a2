//! Supported models and the backend that serves each one.

use std::fmt::{Display, Formatter};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// HTTP API family a model is served through.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Backend {
    /// Local Ollama server, `/api/generate`.
    Ollama,
    /// `OpenAI`-compatible `/chat/completions`.
    OpenAi,
}

/// Model selectable with `--model` or `llm.default_model`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
pub enum Model {
    /// Llama 2 via Ollama. Default.
    #[default]
    #[serde(rename = "llama2")]
    #[value(name = "llama2")]
    Llama2,
    /// Llama 3 via Ollama.
    #[serde(rename = "llama3")]
    #[value(name = "llama3")]
    Llama3,
    /// GPT-4o via `OpenAI`.
    #[serde(rename = "gpt-4o")]
    #[value(name = "gpt-4o")]
    Gpt4o,
    /// GPT-3.5 Turbo via `OpenAI`.
    #[serde(rename = "gpt-3.5-turbo")]
    #[value(name = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl Model {
    /// Identifier sent to the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llama2 => "llama2",
            Self::Llama3 => "llama3",
            Self::Gpt4o => "gpt-4o",
            Self::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }

    /// Backend serving this model.
    #[must_use]
    pub fn backend(self) -> Backend {
        match self {
            Self::Llama2 | Self::Llama3 => Backend::Ollama,
            Self::Gpt4o | Self::Gpt35Turbo => Backend::OpenAi,
        }
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
