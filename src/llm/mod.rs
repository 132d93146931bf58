//! Model client abstraction and the Gemini implementation.

mod gemini;
mod types;

pub use gemini::GeminiClient;
pub use types::{
    Message, ModelReply, ModelRequest, Part, Role, TokenUsage, ToolDeclaration, ToolInvocation,
    ToolPayload, ToolResult,
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to the model API.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode model response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// A chat model that can be asked for the next message of a conversation.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, LlmError>;
}
