//! Perplexity provider implementation (buffered only)

use async_trait::async_trait;
use relay_config::ProviderConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{Provider, ProviderCapabilities};
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiMessage, OpenAiRequest, OpenAiResponse};
use crate::types::{CompletionParams, FragmentStream};

/// Default Perplexity API base URL
const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Model used when the client does not name one
const DEFAULT_MODEL: &str = "sonar";

/// Perplexity provider
///
/// Speaks the chat completions format but only accepts model, messages,
/// `max_tokens`, temperature and `top_p`. There is no streaming variant.
pub struct PerplexityProvider {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    default_model: String,
}

impl PerplexityProvider {
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
}

fn build_request(message: &str, params: &CompletionParams) -> OpenAiRequest {
    OpenAiRequest {
        model: params.model.clone(),
        messages: vec![OpenAiMessage::user(message)],
        max_tokens: params.max_tokens,
        temperature: Some(params.temperature),
        top_p: params.top_p,
        frequency_penalty: None,
        presence_penalty: None,
        stream: None,
    }
}

#[async_trait]
impl Provider for PerplexityProvider {
    fn name(&self) -> &str {
        "perplexity"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities { streaming: false }
    }

    async fn complete(&self, message: &str, params: &CompletionParams) -> Result<String, LlmError> {
        let request = build_request(message, params);

        // The bearer header is always sent, even when empty
        let api_key = self.api_key.as_ref().map_or("", |key| key.expose_secret());
        let builder = self
            .client
            .post(super::endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(api_key)
            .json(&request);

        let response = super::send(self.name(), builder).await?;
        let wire_response: OpenAiResponse = super::read_json(response).await?;

        wire_response.into_text()
    }

    async fn complete_stream(&self, _message: &str, _params: &CompletionParams) -> Result<FragmentStream, LlmError> {
        Err(LlmError::UnsupportedProvider {
            provider: self.name().to_owned(),
        })
    }
}
