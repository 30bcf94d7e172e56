//! Completion service interface.
//!
//! The agent only needs one operation from a language model: turn an ordered
//! list of role-tagged messages into completion text. Tool calls are recovered
//! from that text by [`parser::parse_tool_calls`]; no native function-calling
//! API is assumed.

mod client;
pub mod parser;
mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::OpenAiCompatClient;
pub use parser::{parse_tool_calls, TOOL_CALL_END, TOOL_CALL_START};
pub use types::{ChatMessage, Role, ToolCall};

/// Errors from the completion service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// A completion service.
///
/// Implementations must be immutable after construction so a single handle
/// can be shared across runs.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `messages` and return the completion text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}
