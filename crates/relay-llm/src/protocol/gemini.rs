//! Gemini (Google Generative Language API) wire format

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

// -- Request types --

/// `generateContent` / `streamGenerateContent` request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation contents
    pub contents: Vec<GeminiContent>,
    /// System instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    /// Generation configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

/// Content object containing role and parts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Role ("user" or "model")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    /// Single user turn wrapping the raw message
    pub fn user(text: &str) -> Self {
        Self {
            role: Some("user".to_owned()),
            parts: vec![GeminiPart::text(text)],
        }
    }

    /// Role-less content, as used for system instructions
    pub fn instruction(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![GeminiPart::text(text)],
        }
    }

    /// Concatenated text of all parts
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(|part| part.text.as_deref()).collect()
    }
}

/// Individual part within a content object
///
/// Non-text parts (inline data, function calls) deserialize with `text`
/// unset and contribute nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_owned()),
        }
    }
}

/// Generation configuration parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Response MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

// -- Response types --

/// `generateContent` response, also the shape of every streamed chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    /// Generated candidates
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    /// Feedback on the prompt, present when it was blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
}

/// Generated candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    /// Generated content, absent when the candidate was blocked
    #[serde(default)]
    pub content: Option<GeminiContent>,
    /// Finish reason
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Prompt feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPromptFeedback {
    /// Reason the prompt was blocked
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GeminiCandidate {
    /// Concatenated text parts, `None` when the candidate has no text part
    ///
    /// Blocked, recited or truncated-before-output candidates come back with
    /// no content or with no text parts at all.
    pub fn text(&self) -> Option<String> {
        let content = self.content.as_ref()?;
        content
            .parts
            .iter()
            .any(|part| part.text.is_some())
            .then(|| content.text())
    }
}

impl GeminiResponse {
    /// Text of the first candidate, if it carries any text part
    pub fn first_text(&self) -> Option<String> {
        self.candidates.first().and_then(GeminiCandidate::text)
    }

    /// Text of a complete reply
    ///
    /// A reply without candidates, or whose first candidate has no text
    /// part, is an error naming the block or finish reason.
    pub fn into_text(self) -> Result<String, LlmError> {
        let Some(candidate) = self.candidates.first() else {
            let reason = self
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "no candidates".to_owned());
            return Err(LlmError::Upstream(format!("response contained no text: {reason}")));
        };

        candidate.text().ok_or_else(|| {
            let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
            LlmError::Upstream(format!("response contained no text: finish reason {reason}"))
        })
    }
}
