use crate::error::{LlmError, Result};
use crate::types::{ChatModel, Embedder, ModelRequest};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub request_timeout: Duration,
}

impl OpenAiConfig {
    /// Read from the environment. A missing key is `MissingConfig`; the
    /// caller decides whether that means degraded mode.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::MissingConfig("OPENAI_API_KEY".to_string()))?;
        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            chat_model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            embedding_model: std::env::var("EMBEDDINGS_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            request_timeout: Duration::from_secs(30),
        })
    }
}

/// OpenAI-style HTTP client covering both capabilities.
#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ResponsesApiResponse {
    output_text: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Classify HTTP failures into the error taxonomy. A 4xx complaining
    /// about the request body means the shape is wrong for this family;
    /// everything else (429, 5xx, network, timeout) is transient.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::warn!("Model endpoint returned {status}: {body}");
        if status == reqwest::StatusCode::BAD_REQUEST && body.contains("unsupported") {
            return Err(LlmError::UnsupportedShape(body));
        }
        Err(LlmError::Transient(format!("{status}: {body}")))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.config.embedding_model,
            "input": [text],
        });
        let response: EmbeddingResponse = self.post("/embeddings", body).await?.json().await?;
        response
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| LlmError::Transient("embedding response had no data".to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    /// Primary shape: chat completions.
    async fn generate(&self, request: &ModelRequest) -> Result<String> {
        let body = json!({
            "model": self.config.chat_model,
            "messages": request.messages,
            "max_tokens": request.max_output_tokens,
        });
        let response: ChatResponse = self.post("/chat/completions", body).await?.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| LlmError::Transient("chat response had no choices".to_string()))
    }

    /// Alternate shape for model families that reject `max_tokens` in the
    /// chat-completions body: the responses API with `max_output_tokens`.
    async fn generate_alternate(&self, request: &ModelRequest) -> Result<String> {
        let body = json!({
            "model": self.config.chat_model,
            "input": request.messages,
            "max_output_tokens": request.max_output_tokens,
        });
        let response: ResponsesApiResponse = self.post("/responses", body).await?.json().await?;
        response
            .output_text
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::Transient("responses API had no output_text".to_string()))
    }
}
