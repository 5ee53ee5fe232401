//! Client-facing request/response shapes and the internal call shape

use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Default generation budget in tokens
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
/// Default nucleus sampling threshold
pub const DEFAULT_TOP_P: f64 = 1.0;

/// Lazily produced, ordered sequence of text fragments
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Upstream providers a client can select with `api_provider`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions
    Openai,
    /// Google Gemini
    Gemini,
    /// Perplexity chat completions
    Perplexity,
}

impl ProviderKind {
    /// Every known provider, in a stable order
    pub const ALL: [Self; 3] = [Self::Openai, Self::Gemini, Self::Perplexity];

    /// Tag used on the wire
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Gemini => "gemini",
            Self::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LlmError::InvalidProvider { provider: s.to_owned() })
    }
}

/// Uniform call shape handed to every provider adapter
///
/// Streaming mode only carries `model` and `temperature`; the remaining
/// tunables are `None` and adapters leave them out of the upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    /// Provider-specific model identifier, passed through verbatim
    pub model: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Nucleus sampling threshold
    pub top_p: Option<f64>,
    /// Frequency penalty
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    pub presence_penalty: Option<f64>,
}

/// Body of `POST /ask`
///
/// Numeric fields accept `null` and fall back to their defaults, which is
/// what browsers send for an unparseable form value.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    /// Raw message value, validated by [`validate_message`]
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub top_p: Option<f64>,
    #[serde(default)]
    pub frequency_penalty: Option<f64>,
    #[serde(default)]
    pub presence_penalty: Option<f64>,
    #[serde(default)]
    pub api_provider: Option<String>,
}

impl AskRequest {
    /// Provider tag, defaulting to `openai`
    pub fn provider_tag(&self) -> &str {
        self.api_provider.as_deref().unwrap_or(ProviderKind::Openai.as_str())
    }

    /// Resolve every tunable, using `default_model` when none was sent
    pub fn params(&self, default_model: &str) -> CompletionParams {
        CompletionParams {
            model: self.model.clone().unwrap_or_else(|| default_model.to_owned()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: Some(self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
            top_p: Some(self.top_p.unwrap_or(DEFAULT_TOP_P)),
            frequency_penalty: Some(self.frequency_penalty.unwrap_or(0.0)),
            presence_penalty: Some(self.presence_penalty.unwrap_or(0.0)),
        }
    }
}

/// Body of `POST /ask_stream`
#[derive(Debug, Default, Deserialize)]
pub struct StreamRequest {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub api_provider: Option<String>,
}

impl StreamRequest {
    /// Provider tag, defaulting to `openai`
    pub fn provider_tag(&self) -> &str {
        self.api_provider.as_deref().unwrap_or(ProviderKind::Openai.as_str())
    }

    /// Resolve the streaming subset of tunables
    pub fn params(&self, default_model: &str) -> CompletionParams {
        CompletionParams {
            model: self.model.clone().unwrap_or_else(|| default_model.to_owned()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
        }
    }
}

/// Successful body of `POST /ask`
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub response: String,
}

/// Error body shared by both endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Extract the user message, rejecting absent, empty and non-string values
///
/// Absence, `null` and `""` are all reported as a missing message; any
/// other non-string JSON value is a type error.
pub fn validate_message(value: Option<&serde_json::Value>) -> Result<&str, LlmError> {
    match value {
        None | Some(serde_json::Value::Null) => Err(LlmError::MissingMessage),
        Some(serde_json::Value::String(text)) if text.is_empty() => Err(LlmError::MissingMessage),
        Some(serde_json::Value::String(text)) => Ok(text),
        Some(_) => Err(LlmError::InvalidMessageType),
    }
}
