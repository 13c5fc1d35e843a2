//! HTTP client for the Ollama and `OpenAI` backends.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn, Instrument};

use super::model::{Backend, Model};
use crate::config::LlmConfig;
use crate::{AppError, Result};

/// Keychain service name holding the `OpenAI` key.
const KEYRING_SERVICE: &str = "opsmith";

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ChatError>,
}

/// Client for the configured model backends.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    /// Build a client whose requests time out after `config.timeout()`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Llm` if the HTTP client cannot be constructed.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| AppError::Llm(format!("failed to build http client: {err}")))?;
        Ok(Self { config, http })
    }

    /// Model used by [`LlmClient::generate_default`].
    #[must_use]
    pub fn default_model(&self) -> Model {
        self.config.default_model
    }

    /// Ask `model` to complete `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Llm` on transport failure, a non-success HTTP
    /// status, an error reported by the backend, or an empty answer.
    pub async fn generate(&self, prompt: &str, model: Model) -> Result<String> {
        let span = info_span!("llm_generate", %model);
        async move {
            debug!(prompt_bytes = prompt.len(), "requesting completion");
            match model.backend() {
                Backend::Ollama => self.ollama(prompt, model).await,
                Backend::OpenAi => self.openai(prompt, model).await,
            }
        }
        .instrument(span)
        .await
    }

    /// [`LlmClient::generate`] with the configured default model.
    ///
    /// # Errors
    ///
    /// See [`LlmClient::generate`].
    pub async fn generate_default(&self, prompt: &str) -> Result<String> {
        self.generate(prompt, self.config.default_model).await
    }

    async fn ollama(&self, prompt: &str, model: Model) -> Result<String> {
        let url = format!("{}/api/generate", self.config.ollama_url.trim_end_matches('/'));
        let request = OllamaRequest {
            model: model.as_str(),
            prompt,
            stream: false,
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Llm(format!(
                "ollama API returned status {status}"
            )));
        }

        let body: OllamaResponse = response.json().await?;
        if let Some(error) = body.error.filter(|e| !e.is_empty()) {
            return Err(AppError::Llm(format!("ollama API error: {error}")));
        }
        Ok(body.response)
    }

    async fn openai(&self, prompt: &str, model: Model) -> Result<String> {
        let Some(ref key) = self.config.openai_api_key else {
            return Err(AppError::Llm("openai api key is not configured".into()));
        };

        let url = format!(
            "{}/chat/completions",
            self.config.openai_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![ChatMessage {
                role: "user".to_owned(),
                content: prompt.to_owned(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body: ChatResponse = response.json().await.map_err(|err| {
            AppError::Llm(format!("openai API returned status {status}: {err}"))
        })?;

        if let Some(error) = body.error {
            return Err(AppError::Llm(format!("openai API error: {}", error.message)));
        }
        if !status.is_success() {
            return Err(AppError::Llm(format!(
                "openai API returned status {status}"
            )));
        }

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Llm("openai API returned no choices".into()))
    }
}

/// Load the `OpenAI` key from the OS keychain, falling back to
/// `OPENAI_API_KEY`. Returns `None` when neither is set.
///
/// # Errors
///
/// Returns `AppError::Config` if the keychain lookup task panics.
pub async fn load_openai_key() -> Result<Option<String>> {
    let keychain_result = tokio::task::spawn_blocking(|| {
        keyring::Entry::new(KEYRING_SERVICE, "openai_api_key").and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => warn!("keychain entry is empty, trying env var"),
        Err(err) => debug!(?err, "keychain lookup failed, trying env var"),
    }

    Ok(env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()))
}
