//! `OpenAI` chat completion wire format, also spoken by Perplexity

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

// -- Request types --

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiRequest {
    /// Model identifier
    pub model: String,
    /// Conversation messages
    pub messages: Vec<OpenAiMessage>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Frequency penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Whether to stream the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Message within a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiMessage {
    /// Message role
    pub role: String,
    /// Text content
    pub content: String,
}

impl OpenAiMessage {
    /// Single user turn wrapping the raw message
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.to_owned(),
        }
    }
}

// -- Response types --

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiResponse {
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<OpenAiChoice>,
}

/// Choice within a response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoice {
    /// Generated message
    pub message: OpenAiChoiceMessage,
}

/// Message within a response choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiChoiceMessage {
    /// Text content, null for refusals and tool calls
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAiResponse {
    /// Text of the first choice
    ///
    /// A null content is an empty reply; a reply without choices is malformed.
    pub fn into_text(self) -> Result<String, LlmError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Upstream("response contained no choices".to_owned()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

// -- Streaming types --

/// Streaming chunk
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamChunk {
    /// Delta choices
    #[serde(default)]
    pub choices: Vec<OpenAiStreamChoice>,
    /// Error reported in-band by the upstream
    #[serde(default)]
    pub error: Option<OpenAiErrorDetail>,
}

/// Choice within a streaming chunk
///
/// The final chunk carries an empty delta and a finish reason, which is
/// not needed since the stream ends with `[DONE]`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamChoice {
    /// Incremental delta
    pub delta: OpenAiStreamDelta,
}

/// Delta content within a streaming choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiStreamDelta {
    /// Incremental text content, absent on the role-only first chunk
    #[serde(default)]
    pub content: Option<String>,
}

// -- Error response --

/// Error detail
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiErrorDetail {
    /// Error message
    pub message: String,
}
