//! Gemini (Google Generative Language API) provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use relay_config::ProviderConfig;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChunkOutcome, Provider, ProviderCapabilities};
use crate::error::LlmError;
use crate::protocol::gemini::{GeminiContent, GeminiGenerationConfig, GeminiRequest, GeminiResponse};
use crate::types::{CompletionParams, FragmentStream};

/// Default Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the client does not name one
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Fixed top-k used for buffered generation
const TOP_K: u32 = 64;

/// Plain-text replies only
const RESPONSE_MIME_TYPE: &str = "text/plain";

/// Blank system instruction sent with buffered requests
const SYSTEM_INSTRUCTION: &str = " ";

/// Gemini provider
///
/// Buffered calls open a fresh single-turn chat (blank system instruction,
/// full generation config); streaming calls go straight to
/// `streamGenerateContent` with only a temperature.
pub struct GeminiProvider {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: String,
}

impl GeminiProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: super::http_client(config)?,
            base_url: super::base_url(config, DEFAULT_BASE_URL)?,
            api_key: config.api_key.clone(),
            default_model: config.default_model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
        })
    }

    /// POST to a model method, authenticated with the `key` query parameter
    fn post(&self, model: &str, method: &str, body: &GeminiRequest) -> RequestBuilder {
        let url = super::endpoint(&self.base_url, &format!("models/{model}:{method}"));
        let builder = self.client.post(url).json(body);

        match &self.api_key {
            Some(key) => builder.query(&[("key", key.expose_secret())]),
            None => builder,
        }
    }
}

/// Request for a fresh single-turn chat session
fn chat_request(message: &str, params: &CompletionParams) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent::user(message)],
        system_instruction: Some(GeminiContent::instruction(SYSTEM_INSTRUCTION)),
        generation_config: Some(GeminiGenerationConfig {
            temperature: Some(params.temperature),
            top_p: params.top_p,
            top_k: Some(TOP_K),
            max_output_tokens: params.max_tokens,
            response_mime_type: Some(RESPONSE_MIME_TYPE.to_owned()),
        }),
    }
}

/// Request for direct streamed content generation
fn stream_request(message: &str, params: &CompletionParams) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent::user(message)],
        system_instruction: None,
        generation_config: Some(GeminiGenerationConfig {
            temperature: Some(params.temperature),
            response_mime_type: Some(RESPONSE_MIME_TYPE.to_owned()),
            ..GeminiGenerationConfig::default()
        }),
    }
}

/// Interpret the data of one SSE event from `streamGenerateContent`
pub(crate) fn parse_stream_data(data: &str) -> ChunkOutcome {
    let data = data.trim();
    if data.is_empty() {
        return ChunkOutcome::Skip;
    }

    match serde_json::from_str::<GeminiResponse>(data) {
        Ok(chunk) => match chunk.first_text() {
            Some(text) if !text.is_empty() => ChunkOutcome::Fragment(text),
            _ => ChunkOutcome::Skip,
        },
        Err(e) => {
            tracing::debug!(error = %e, data = %data, "unparseable Gemini SSE chunk");
            ChunkOutcome::Failed(LlmError::Streaming(format!("malformed chunk: {e}")))
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities { streaming: true }
    }

    async fn complete(&self, message: &str, params: &CompletionParams) -> Result<String, LlmError> {
        let request = chat_request(message, params);

        let builder = self.post(&params.model, "generateContent", &request);
        let response = super::send(self.name(), builder).await?;
        let wire_response: GeminiResponse = super::read_json(response).await?;

        wire_response.into_text()
    }

    async fn complete_stream(&self, message: &str, params: &CompletionParams) -> Result<FragmentStream, LlmError> {
        let request = stream_request(message, params);

        let builder = self
            .post(&params.model, "streamGenerateContent", &request)
            .query(&[("alt", "sse")]);
        let response = super::send(self.name(), builder).await?;

        let outcomes = response.bytes_stream().eventsource().map(|result| match result {
            Ok(event) => parse_stream_data(&event.data),
            Err(e) => ChunkOutcome::Failed(LlmError::Streaming(e.to_string())),
        });

        Ok(super::into_fragments(outcomes))
    }
}
