//! Remote completion client abstraction.
//!
//! A [`Conversation`](crate::Conversation) never talks to the network
//! directly; it calls through the [`CompletionClient`] capability, which is
//! constructed once at startup and injected wherever a send can happen.
//! The concrete [`OpenAiClient`] speaks the OpenAI-compatible
//! `/v1/chat/completions` wire format, blocking the calling thread until
//! the server answers (the core has no background scheduling of its own).

use crate::conversation::{Message, Role};
use crate::error::RemoteError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Default endpoint for the OpenAI-compatible completion API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Capability for obtaining the next assistant message.
///
/// Input is the full option map plus the ordered message history; output is
/// a structured result or an error forwarded unchanged. Timeouts and
/// retries, if any, live behind this trait.
pub trait CompletionClient: Send + Sync {
    /// Send one completion request and block until it resolves.
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, RemoteError>;
}

/// One completion request: request parameters plus the message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Request parameters (model, temperature, user tag, ...).
    pub options: Map<String, Value>,
    /// Full conversation history, in order.
    pub messages: Vec<Message>,
}

impl CompletionRequest {
    /// The exact wire body for this request: the option map with an added
    /// `messages` key. This is also what gets archived in the exchange log.
    pub fn to_wire(&self) -> Value {
        let mut body = self.options.clone();
        body.insert(
            "messages".into(),
            serde_json::to_value(&self.messages).unwrap_or(Value::Null),
        );
        Value::Object(body)
    }
}

/// Structured completion result.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The assistant message extracted from the first candidate.
    pub message: Message,
    /// Token accounting reported by the provider.
    pub usage: TokenUsage,
    /// The provider's full response body, archived verbatim into the
    /// exchange log so nothing the provider returned is lost.
    pub raw: Value,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

// ── OpenAI-compatible wire types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
    total_tokens: Option<i64>,
}

/// Blocking client for an OpenAI-compatible chat completion endpoint.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Create a client against the default OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom OpenAI-compatible endpoint.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(120))
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
        }
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, RemoteError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = request.to_wire();
        debug!(url = %url, messages = request.messages.len(), "sending completion request");

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| RemoteError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(RemoteError::status(
                status.as_u16(),
                format!("API error: {error_text}"),
            ));
        }

        let raw: Value = response
            .json()
            .map_err(|e| RemoteError::transport(format!("failed to read response: {e}")))?;

        parse_response(raw)
    }
}

/// Extract the assistant message and usage out of a raw response body.
fn parse_response(raw: Value) -> Result<CompletionResponse, RemoteError> {
    let wire: WireResponse = serde_json::from_value(raw.clone())
        .map_err(|e| RemoteError::transport(format!("failed to parse response: {e}")))?;

    let choice = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RemoteError::transport("response contained no choices"))?;

    let usage = wire.usage.map_or(TokenUsage::default(), |u| TokenUsage {
        prompt_tokens: u.prompt_tokens.unwrap_or(0),
        completion_tokens: u.completion_tokens.unwrap_or(0),
        total_tokens: u.total_tokens.unwrap_or(0),
    });

    Ok(CompletionResponse {
        message: Message::new(Role::Assistant, choice.message.content.unwrap_or_default()),
        usage,
        raw,
    })
}
