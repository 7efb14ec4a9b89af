use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// One assembled model request: ordered messages plus the output cap.
/// Input is not separately truncated.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub max_output_tokens: u32,
}

/// Text → vector capability. Failure is transient by contract; callers
/// degrade to "no hits".
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Chat completion capability.
///
/// `generate` uses the family's primary request shape. Families that also
/// understand a second, semantically equivalent shape expose it through
/// `generate_alternate`; the default refuses, which terminates the
/// fallback chain immediately.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String>;

    async fn generate_alternate(&self, request: &ModelRequest) -> Result<String> {
        let _ = request;
        Err(crate::error::LlmError::UnsupportedShape(
            "no alternate request shape for this model family".to_string(),
        ))
    }
}
