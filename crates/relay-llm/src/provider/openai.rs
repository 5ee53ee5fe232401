//! OpenAI-compatible provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use relay_config::ProviderConfig;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChunkOutcome, Provider, ProviderCapabilities};
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk};
use crate::types::{CompletionParams, FragmentStream};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when the client does not name one
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: String,
}

impl OpenAiProvider {
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

    /// Authenticated POST to the chat completions endpoint
    fn post(&self, body: &OpenAiRequest) -> RequestBuilder {
        let builder = self
            .client
            .post(super::endpoint(&self.base_url, "chat/completions"))
            .json(body);

        match &self.api_key {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }
}

/// Build the wire request from the uniform call shape
///
/// Unset tunables are left out so the upstream applies its own defaults.
fn build_request(message: &str, params: &CompletionParams, stream: bool) -> OpenAiRequest {
    OpenAiRequest {
        model: params.model.clone(),
        messages: vec![OpenAiMessage::user(message)],
        max_tokens: params.max_tokens,
        temperature: Some(params.temperature),
        top_p: params.top_p,
        frequency_penalty: params.frequency_penalty,
        presence_penalty: params.presence_penalty,
        stream: stream.then_some(true),
    }
}

/// Interpret the data of one SSE event from a chat completion stream
pub(crate) fn parse_stream_data(data: &str) -> ChunkOutcome {
    let data = data.trim();
    if data.is_empty() {
        return ChunkOutcome::Skip;
    }
    if data == "[DONE]" {
        return ChunkOutcome::Done;
    }

    match serde_json::from_str::<OpenAiStreamChunk>(data) {
        Ok(OpenAiStreamChunk { error: Some(error), .. }) => ChunkOutcome::Failed(LlmError::Streaming(error.message)),
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .map_or(ChunkOutcome::Skip, ChunkOutcome::Fragment),
        Err(e) => {
            tracing::debug!(error = %e, data = %data, "unparseable SSE chunk");
            ChunkOutcome::Failed(LlmError::Streaming(format!("malformed chunk: {e}")))
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities { streaming: true }
    }

    async fn complete(&self, message: &str, params: &CompletionParams) -> Result<String, LlmError> {
        let request = build_request(message, params, false);

        let response = super::send(self.name(), self.post(&request)).await?;
        let wire_response: OpenAiResponse = super::read_json(response).await?;

        wire_response.into_text()
    }

    async fn complete_stream(&self, message: &str, params: &CompletionParams) -> Result<FragmentStream, LlmError> {
        let request = build_request(message, params, true);

        let response = super::send(self.name(), self.post(&request)).await?;

        let outcomes = response.bytes_stream().eventsource().map(|result| match result {
            Ok(event) => parse_stream_data(&event.data),
            Err(e) => ChunkOutcome::Failed(LlmError::Streaming(e.to_string())),
        });

        Ok(super::into_fragments(outcomes))
    }
}
