//! Conversation model and serialization.
//!
//! A [`Conversation`] owns an ordered message history, a map of default
//! request options, and the exchange log: every request/response pair ever
//! sent for this conversation, archived as independent snapshots so later
//! edits to the history cannot rewrite what was actually on the wire.

use crate::client::{CompletionClient, CompletionResponse};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human input
    User,
    /// Model response
    Assistant,
    /// Steering directives
    System,
}

impl Role {
    /// Wire/storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Parse from a string; accepts the first letter as an abbreviation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" | "u" => Some(Self::User),
            "assistant" | "a" => Some(Self::Assistant),
            "system" | "s" => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Default request options applied to every send unless overridden.
fn default_options() -> Map<String, Value> {
    let mut options = Map::new();
    options.insert("model".into(), Value::String("gpt-4o".into()));
    options
}

/// A multi-turn conversation with a remote completion service.
///
/// The persisted shape is exactly `{options, messages, exchange_log}`;
/// palettes and other render-time configuration are never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Request parameters sent on every completion (model, temperature, ...).
    /// Caller overrides merge into these key by key, never wholesale.
    #[serde(default = "default_options")]
    pub options: Map<String, Value>,
    /// Ordered message history. Insertion order is conversation order.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Audit trail of `[request, response]` pairs, one per completed send.
    /// Each entry is a fully-owned snapshot taken at send time.
    #[serde(default)]
    pub exchange_log: Vec<(Value, Value)>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality is defined by the message sequence alone; differing options or
/// exchange logs do not make two conversations unequal.
impl PartialEq for Conversation {
    fn eq(&self, other: &Self) -> bool {
        self.messages == other.messages
    }
}

impl Conversation {
    /// Create an empty conversation with the built-in default options.
    pub fn new() -> Self {
        Self {
            options: default_options(),
            messages: Vec::new(),
            exchange_log: Vec::new(),
        }
    }

    /// Create a conversation seeded with one user message and immediately
    /// send it, so the returned conversation already holds the first
    /// assistant reply.
    pub fn opening(client: &dyn CompletionClient, content: impl Into<String>) -> Result<Self> {
        let mut conversation = Self::new();
        conversation.add_user(content);
        conversation.send(client, &Map::new())?;
        Ok(conversation)
    }

    /// Number of messages in the conversation.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// A conversation is empty iff it has no messages and no logged
    /// exchanges. Empty conversations are never persisted.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.exchange_log.is_empty()
    }

    /// Append a message. Never touches the network, never fails.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Append a `user` message.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add_message(Role::User, content);
    }

    /// Append a `system` message.
    pub fn add_system(&mut self, content: impl Into<String>) {
        self.add_message(Role::System, content);
    }

    /// Append an `assistant` message.
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add_message(Role::Assistant, content);
    }

    /// Remove and return the last message, if any.
    pub fn pop_message(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    /// Absorb another conversation: messages and exchange log are appended,
    /// the other's options win key by key.
    pub fn extend(&mut self, other: Conversation) {
        for (key, value) in other.options {
            self.options.insert(key, value);
        }
        self.messages.extend(other.messages);
        self.exchange_log.extend(other.exchange_log);
    }

    /// Merge the default options with per-call overrides, override winning
    /// key by key.
    fn merged_options(&self, overrides: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.options.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Send the conversation to the completion service.
    ///
    /// Builds a snapshot request from the merged options and a deep copy of
    /// the current history, then blocks on the client. On success the
    /// assistant message is appended and the `(request, response)` pair is
    /// archived. On failure the error propagates unchanged and the
    /// conversation is left exactly as it was; there is no partial append.
    pub fn send(
        &mut self,
        client: &dyn CompletionClient,
        overrides: &Map<String, Value>,
    ) -> Result<CompletionResponse> {
        let request = crate::client::CompletionRequest {
            options: self.merged_options(overrides),
            messages: self.messages.clone(),
        };
        let request_snapshot = request.to_wire();

        let response = client.complete(&request).map_err(Error::Remote)?;
        debug!(
            messages = self.messages.len(),
            total_tokens = response.usage.total_tokens,
            "completion succeeded"
        );

        self.messages.push(response.message.clone());
        self.exchange_log
            .push((request_snapshot, response.raw.clone()));
        Ok(response)
    }

    /// Append a message of the given role, then send.
    ///
    /// With `rollback_on_failure` set, a failed send removes the
    /// just-appended message before the error propagates, restoring the
    /// pre-call state. On success returns the trimmed assistant text and
    /// the history has grown by exactly two messages.
    pub fn chat_turn(
        &mut self,
        client: &dyn CompletionClient,
        role: Role,
        content: impl Into<String>,
        rollback_on_failure: bool,
    ) -> Result<String> {
        self.add_message(role, content);
        match self.send(client, &Map::new()) {
            Ok(response) => Ok(response.message.content.trim().to_string()),
            Err(e) => {
                if rollback_on_failure {
                    self.messages.pop();
                }
                Err(e)
            }
        }
    }

    /// One-line digest: per-role message and character counts.
    pub fn summary(&self) -> String {
        let mut counts = [0usize; 3];
        let mut chars = [0usize; 3];
        for message in &self.messages {
            let idx = match message.role {
                Role::User => 0,
                Role::Assistant => 1,
                Role::System => 2,
            };
            counts[idx] += 1;
            chars[idx] += message.content.chars().count();
        }
        format!(
            "{} user ({} chars), {} assistant ({} chars), {} system ({} chars), {} exchanges logged",
            counts[0], chars[0], counts[1], chars[1], counts[2], chars[2],
            self.exchange_log.len()
        )
    }

    /// Serialize to the stable persisted encoding.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstruct a conversation from its persisted encoding.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
