//! Model backend: the trait seam and the Anthropic Messages implementation.
//!
//! Handlers only ever see `Arc<dyn ModelBackend>`, so tests inject a
//! scripted backend and the whole HTTP surface runs without a network. The
//! real implementation is a thin single-shot client over the Messages API:
//! one request, one reply, first text block out. No retries, no streaming,
//! no multi-turn — a transient failure surfaces immediately as a 502 and
//! the caller decides whether to try again.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Max tokens for a document-parse completion.
pub const PARSE_MAX_TOKENS: u32 = 2048;
/// Max tokens for a vision transcription; image pages run longer.
pub const VISION_MAX_TOKENS: u32 = 4096;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Single-shot exchange with the external model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send a system instruction plus one user message; return the first
    /// text block of the reply.
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<String, ApiError>;

    /// Transcribe a document image: one user turn carrying the image and
    /// the instruction, raw transcribed text back.
    async fn transcribe_image(
        &self,
        media_type: &str,
        image_b64: &str,
        instruction: &str,
    ) -> Result<String, ApiError>;
}

// ── Anthropic Messages API ───────────────────────────────────────────────

/// Reqwest-backed client for the Anthropic Messages API.
pub struct AnthropicBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn send(&self, request: &MessagesRequest<'_>) -> Result<String, ApiError> {
        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Backend(format!("AI model error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .map(|env| env.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(ApiError::Backend(format!("AI model error: {detail}")));
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Backend(format!("AI model error: {e}")))?;

        reply
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| ApiError::Backend("AI model returned no text content".to_string()))
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
    ) -> Result<String, ApiError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            system: Some(system_prompt),
            messages: vec![Message {
                role: "user",
                content: Content::Text(user_text),
            }],
        };
        self.send(&request).await
    }

    async fn transcribe_image(
        &self,
        media_type: &str,
        image_b64: &str,
        instruction: &str,
    ) -> Result<String, ApiError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: VISION_MAX_TOKENS,
            system: None,
            messages: vec![Message {
                role: "user",
                content: Content::Blocks(vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type,
                            data: image_b64,
                        },
                    },
                    ContentBlock::Text { text: instruction },
                ]),
            }],
        };
        self.send(&request).await
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content<'a> {
    Text(&'a str),
    Blocks(Vec<ContentBlock<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}
