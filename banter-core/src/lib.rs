//! banter-core - Conversation model, terminal rendering, and persistence
//! for named AI chat conversations.
//!
//! This crate provides:
//! - The conversation data model and its round-trippable JSON encoding
//! - A synchronous completion-client capability and an OpenAI-compatible
//!   blocking implementation
//! - Role-aware terminal rendering with code-block segmentation, inline
//!   keyword styling, and best-effort syntax highlighting
//! - A SQLite-backed store mapping conversation names to conversations

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod client;
pub mod conversation;
pub mod error;
pub mod render;
pub mod store;

pub use client::{CompletionClient, CompletionRequest, CompletionResponse, OpenAiClient, TokenUsage};
pub use conversation::{Conversation, Message, Role};
pub use error::{Error, RemoteError, Result};
pub use render::{Palette, Segment};
pub use store::ConversationStore;
