//! Claude API integration for blog post generation.
//!
//! A thin non-streaming client for the Anthropic Messages API. Callers send
//! a system prompt and a single user prompt and get the concatenated text
//! of the reply back.

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::ClaudeError;
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, Role, StopReason, Usage};
