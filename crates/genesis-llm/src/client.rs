//! LLM backend abstraction with bounded concurrency.
//!
//! Enum dispatch for backends, avoiding the dyn-compatibility issues
//! with async trait methods. Concrete implementations exist for
//! OpenAI-compatible chat APIs and the Anthropic Messages API, plus a
//! scripted backend for tests and offline runs. A semaphore bounds
//! simultaneous calls across the whole process, and every request runs
//! under a caller-configured timeout.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::LlmError;

/// Chat roles understood by all backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The conversational partner's lines.
    User,
    /// The model's own previous lines.
    Assistant,
}

/// One message in a chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl ChatMessage {
    /// A user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant-role message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Which model a request should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// The main model (conversations, god passes).
    Large,
    /// The cheap model (last words, bulk flavor).
    Small,
}

/// Supported backend kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI-compatible chat completions (`OpenAI`, Ollama, ...).
    #[default]
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
    /// Canned responses; no network.
    Scripted,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: BackendKind,
    /// Base API URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API key, empty for local endpoints.
    #[serde(default)]
    pub api_key: String,
    /// Main model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Cheap model name.
    #[serde(default = "default_small_model")]
    pub small_model: String,
    /// Simultaneous in-flight requests.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    String::from("http://localhost:11434/v1")
}

fn default_model() -> String {
    String::from("llama3.1")
}

fn default_small_model() -> String {
    String::from("llama3.2:3b")
}

const fn default_concurrency() -> usize {
    8
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::OpenAi,
            api_url: default_api_url(),
            api_key: String::new(),
            model: default_model(),
            small_model: default_small_model(),
            max_concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// An LLM backend that can process messages and return text.
///
/// Uses enum dispatch instead of trait objects because async methods are
/// not dyn-compatible.
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(HttpBackend),
    /// Anthropic Messages API.
    Anthropic(HttpBackend),
    /// Canned responses for tests and offline runs.
    Scripted(Mutex<VecDeque<String>>),
}

/// Shared state for the HTTP backends.
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    small_model: String,
}

impl HttpBackend {
    fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            small_model: config.small_model.clone(),
        }
    }

    const fn model_for(&self, tier: ModelTier) -> &String {
        match tier {
            ModelTier::Large => &self.model,
            ModelTier::Small => &self.small_model,
        }
    }

    /// OpenAI-compatible chat completion.
    async fn complete_openai(
        &self,
        messages: &[ChatMessage],
        system: &str,
        max_tokens: u32,
        tier: ModelTier,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.api_url);

        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        wire_messages.push(serde_json::json!({"role": "system", "content": system}));
        for message in messages {
            wire_messages.push(serde_json::json!({
                "role": match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": message.content,
            }));
        }

        let body = serde_json::json!({
            "model": self.model_for(tier),
            "messages": wire_messages,
            "temperature": 0.7,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Backend(format!("OpenAI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(LlmError::Backend(format!(
                "OpenAI returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Backend(format!("OpenAI response parse failed: {e}")))?;

        extract_openai_content(&json)
    }

    /// Anthropic Messages API completion.
    async fn complete_anthropic(
        &self,
        messages: &[ChatMessage],
        system: &str,
        max_tokens: u32,
        tier: ModelTier,
    ) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.api_url);

        let wire_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|message| {
                serde_json::json!({
                    "role": match message.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": message.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model_for(tier),
            "max_tokens": max_tokens,
            "system": system,
            "messages": wire_messages,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Backend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(LlmError::Backend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Backend(format!("Anthropic response parse failed: {e}")))?;

        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            LlmError::Backend("OpenAI response missing choices[0].message.content".to_owned())
        })
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| LlmError::Backend("Anthropic response missing content[0].text".to_owned()))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The process-wide LLM client: one backend, one concurrency gate, one
/// timeout.
pub struct LlmClient {
    backend: LlmBackend,
    gate: Semaphore,
    timeout: Duration,
}

impl LlmClient {
    /// Build a client from configuration.
    pub fn new(config: &LlmConfig) -> Self {
        let backend = match config.backend {
            BackendKind::OpenAi => LlmBackend::OpenAi(HttpBackend::new(config)),
            BackendKind::Anthropic => LlmBackend::Anthropic(HttpBackend::new(config)),
            BackendKind::Scripted => LlmBackend::Scripted(Mutex::new(VecDeque::new())),
        };
        Self {
            backend,
            gate: Semaphore::new(config.max_concurrency.max(1)),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    /// A scripted client that answers with the given responses in order
    /// and errors once exhausted. For tests.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            backend: LlmBackend::Scripted(Mutex::new(
                responses.into_iter().map(Into::into).collect(),
            )),
            gate: Semaphore::new(8),
            timeout: Duration::from_secs(5),
        }
    }

    /// Human-readable backend name for logging.
    pub const fn backend_name(&self) -> &'static str {
        match self.backend {
            LlmBackend::OpenAi(_) => "openai-compatible",
            LlmBackend::Anthropic(_) => "anthropic",
            LlmBackend::Scripted(_) => "scripted",
        }
    }

    /// Run a chat completion under the concurrency gate and timeout.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        system: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.chat_with(messages, system, max_tokens, ModelTier::Large)
            .await
    }

    /// [`Self::chat`] with an explicit model tier.
    pub async fn chat_with(
        &self,
        messages: &[ChatMessage],
        system: &str,
        max_tokens: u32,
        tier: ModelTier,
    ) -> Result<String, LlmError> {
        let _permit = self.gate.acquire().await.map_err(|_| LlmError::GateClosed)?;

        match &self.backend {
            LlmBackend::Scripted(queue) => queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .ok_or_else(|| LlmError::Backend("scripted backend exhausted".to_owned())),
            LlmBackend::OpenAi(backend) => {
                tokio::time::timeout(
                    self.timeout,
                    backend.complete_openai(messages, system, max_tokens, tier),
                )
                .await
                .map_err(|_| LlmError::Timeout)?
            }
            LlmBackend::Anthropic(backend) => {
                tokio::time::timeout(
                    self.timeout,
                    backend.complete_anthropic(messages, system, max_tokens, tier),
                )
                .await
                .map_err(|_| LlmError::Timeout)?
            }
        }
    }

    /// Single-prompt generation: one user message, no history.
    pub async fn generate(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
        tier: ModelTier,
    ) -> Result<String, LlmError> {
        self.chat_with(&[ChatMessage::user(prompt)], system, max_tokens, tier)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {"content": "I watch the small ones build."}
            }]
        });
        let result = extract_openai_content(&json);
        assert!(result.is_ok());
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{"type": "text", "text": "Let there be light."}]
        });
        assert!(extract_anthropic_content(&json).is_ok());
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[tokio::test]
    async fn scripted_client_answers_in_order_then_errors() {
        let client = LlmClient::scripted(["first", "second"]);
        assert_eq!(client.backend_name(), "scripted");

        let a = client.chat(&[ChatMessage::user("hi")], "sys", 150).await;
        let b = client.chat(&[ChatMessage::user("hi")], "sys", 150).await;
        let c = client.chat(&[ChatMessage::user("hi")], "sys", 150).await;

        assert_eq!(a.ok().as_deref(), Some("first"));
        assert_eq!(b.ok().as_deref(), Some("second"));
        assert!(c.is_err());
    }

    #[test]
    fn config_defaults_are_sane() {
        let config = LlmConfig::default();
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.backend, BackendKind::OpenAi);
    }
}
