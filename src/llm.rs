//! Chat-completion backends.
//!
//! Implementations of [`ChatModel`] selected by `[llm] provider`:
//! - **[`DisabledChat`]**: returns errors.
//! - **[`OpenAIChat`]**: calls an OpenAI-compatible `/chat/completions` endpoint.
//! - **[`OllamaChat`]**: calls a local Ollama instance's `/api/chat` endpoint.
//!
//! Each [`ChatModel::complete`] call sends one system message and one user
//! message and returns the assistant's reply text.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use doc_summarizer_core::error::GenerationError;
use doc_summarizer_core::pipeline::ChatModel;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::http::{self, HttpFailure};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

impl From<HttpFailure> for GenerationError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Request(msg) => GenerationError::Request(msg),
            HttpFailure::Status { status, body } => GenerationError::Status { status, body },
            HttpFailure::Malformed(msg) => GenerationError::Malformed(msg),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

fn messages(system: &str, user: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        },
        ChatMessage {
            role: "user".to_string(),
            content: user.to_string(),
        },
    ]
}

// ============ Disabled ============

/// A chat model that always fails.
pub struct DisabledChat;

#[async_trait]
impl ChatModel for DisabledChat {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

// ============ OpenAI ============

/// Chat model using the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAIChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    max_retries: u32,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIReply,
}

#[derive(Deserialize)]
struct OpenAIReply {
    content: Option<String>,
}

impl OpenAIChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let base = config.url.as_deref().unwrap_or(OPENAI_BASE_URL);

        Ok(Self {
            client: http::client(config.timeout_secs).map_err(GenerationError::from)?,
            url: http::join_url(base, "chat/completions"),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let body = OpenAIChatRequest {
            model: &self.model,
            messages: messages(system, user),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response: OpenAIChatResponse = http::post_json(
            &self.client,
            &self.url,
            Some(&self.api_key),
            &body,
            self.max_retries,
        )
        .await?;
        first_choice(response)
    }
}

fn first_choice(response: OpenAIChatResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("no choices in response".to_string()))?
        .message
        .content
        .ok_or(GenerationError::EmptyResponse)
}

// ============ Ollama ============

/// Chat model using a local Ollama instance (`POST /api/chat`, non-streaming).
pub struct OllamaChat {
    client: reqwest::Client,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    max_retries: u32,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

impl OllamaChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OLLAMA_BASE_URL);
        Ok(Self {
            client: http::client(config.timeout_secs).map_err(GenerationError::from)?,
            url: http::join_url(base, "api/chat"),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: messages(system, user),
            stream: false,
            options: OllamaOptions {
                num_predict: self.max_tokens,
                temperature: self.temperature,
            },
        };
        let response: OllamaChatResponse =
            http::post_json(&self.client, &self.url, None, &body, self.max_retries)
                .await
                .map_err(|e| match e {
                    HttpFailure::Request(msg) => GenerationError::Request(format!(
                        "Ollama connection error (is Ollama running at {}?): {}",
                        self.url, msg
                    )),
                    other => other.into(),
                })?;
        Ok(response.message.content)
    }
}

/// Create the [`ChatModel`] named by `config.provider`.
pub fn create_chat_model(config: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledChat)),
        "openai" => Ok(Arc::new(OpenAIChat::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
