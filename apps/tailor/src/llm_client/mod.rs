/// LLM Client: the single point of entry for all model calls in the tailor.
///
/// ARCHITECTURAL RULE: No other module may call a model API directly.
/// Everything goes through the `TextGenerator` trait, which `LlmClient` implements
/// for a local Ollama server and for OpenAI.
///
/// Calls are never retried: a transport failure or timeout is reported once and
/// the caller falls back to the untailored content.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;

pub mod prompts;
#[cfg(test)]
pub mod scripted;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const OPENAI_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("OPENAI_API_KEY must be set for the OpenAI backend")]
    MissingApiKey,
}

/// An opaque text-completion service: one request, one reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Ollama { host: String },
    OpenAi { api_key: String },
}

// ── Ollama wire types ───────────────────────────────────────────────────────

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
}

// ── OpenAI wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP-backed generator for Ollama or OpenAI.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    backend: Backend,
    model: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(backend: Backend, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Http)?;
        Ok(Self {
            client,
            backend,
            model,
            timeout,
        })
    }

    /// Picks the backend and model from configuration.
    pub fn from_config(config: &Config, use_openai: bool) -> Result<Self, LlmError> {
        let (backend, default_model) = if use_openai {
            let api_key = config.openai_api_key.clone().ok_or(LlmError::MissingApiKey)?;
            (Backend::OpenAi { api_key }, DEFAULT_OPENAI_MODEL)
        } else {
            let host = config.ollama_host.trim_end_matches('/').to_string();
            (Backend::Ollama { host }, DEFAULT_OLLAMA_MODEL)
        };
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| default_model.to_string());
        Self::new(backend, model, config.generation_timeout)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    fn transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Http(error)
        }
    }

    async fn error_for_status(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        LlmError::Api { status, message }
    }

    async fn call_ollama(&self, host: &str, prompt: &str, system: &str) -> Result<String, LlmError> {
        let url = format!("{host}/api/generate");
        // Ollama's generate endpoint takes one prompt; the directive leads it.
        let full_prompt = format!("{system}\n\n{prompt}");
        let body = OllamaRequest {
            model: &self.model,
            prompt: &full_prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: OllamaResponse = serde_json::from_str(&text)?;
        Ok(parsed.response)
    }

    async fn call_openai(&self, api_key: &str, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: OPENAI_TEMPERATURE,
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(response).await);
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let text = match &self.backend {
            Backend::Ollama { host } => {
                info!("Calling Ollama at {} with model {}", host, self.model);
                self.call_ollama(host, prompt, system).await?
            }
            Backend::OpenAi { api_key } => {
                info!("Calling OpenAI with model {}", self.model);
                self.call_openai(api_key, prompt, system).await?
            }
        };

        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        debug!("LLM call succeeded: {} chars returned", text.len());
        Ok(text)
    }
}
