//! External model capabilities: embeddings and chat completion.
//!
//! The pipeline treats both as black boxes behind traits; the concrete
//! client here speaks the OpenAI wire shapes. Every call carries a bounded
//! timeout, and a timeout is a transient failure, never a crash.

mod client;
mod error;
mod fallback;
mod types;

pub use client::{OpenAiClient, OpenAiConfig};
pub use error::{LlmError, Result};
pub use fallback::{apology_for, FallbackChain};
pub use types::{ChatMessage, ChatModel, Embedder, MessageRole, ModelRequest};
