//! Provider trait and implementations for the upstream LLM APIs

pub mod gemini;
pub mod openai;
pub mod perplexity;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, future};
use relay_config::{ProviderConfig, ProvidersConfig};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::LlmError;
use crate::types::{CompletionParams, FragmentStream, ProviderKind};

/// Capabilities advertised by a provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderCapabilities {
    /// Whether the provider has a streaming variant
    pub streaming: bool,
}

/// One upstream provider, reachable in buffered and (optionally) streaming mode
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Model used when the client does not name one
    fn default_model(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Generate the complete reply to a single user message
    async fn complete(&self, message: &str, params: &CompletionParams) -> Result<String, LlmError>;

    /// Generate the reply as a stream of text fragments
    async fn complete_stream(&self, message: &str, params: &CompletionParams) -> Result<FragmentStream, LlmError>;
}

/// Immutable mapping from provider tag to adapter, built once at startup
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<ProviderKind, Arc<dyn Provider>>,
}

impl ProviderSet {
    /// Build the adapters for every provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client or a base URL cannot be set up.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, LlmError> {
        Ok(Self::default()
            .with_provider(
                ProviderKind::Openai,
                Arc::new(openai::OpenAiProvider::new(&config.openai)?),
            )
            .with_provider(
                ProviderKind::Gemini,
                Arc::new(gemini::GeminiProvider::new(&config.gemini)?),
            )
            .with_provider(
                ProviderKind::Perplexity,
                Arc::new(perplexity::PerplexityProvider::new(&config.perplexity)?),
            ))
    }

    /// Register (or replace) the adapter for a provider
    #[must_use]
    pub fn with_provider(mut self, kind: ProviderKind, provider: Arc<dyn Provider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    /// Adapter for a provider
    ///
    /// # Errors
    ///
    /// Returns `LlmError::UnsupportedProvider` when no adapter is registered.
    pub fn get(&self, kind: ProviderKind) -> Result<&Arc<dyn Provider>, LlmError> {
        self.providers.get(&kind).ok_or_else(|| LlmError::UnsupportedProvider {
            provider: kind.to_string(),
        })
    }
}

/// Build the HTTP client for one provider, applying configured timeouts
pub(crate) fn http_client(config: &ProviderConfig) -> Result<Client, LlmError> {
    let mut builder = Client::builder();

    if let Some(timeout) = config.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }

    if let Some(timeout) = config.request_timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))
}

/// Configured base URL, or the provider's default
pub(crate) fn base_url(config: &ProviderConfig, default: &str) -> Result<Url, LlmError> {
    match &config.base_url {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default).map_err(|e| LlmError::Internal(anyhow::anyhow!("invalid default URL: {e}"))),
    }
}

/// Join a path onto a base URL without dropping the base's own path
pub(crate) fn endpoint(base_url: &Url, path: &str) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    format!("{base}/{path}")
}

/// Send an upstream request, treating any non-2xx status as a failure
pub(crate) async fn send(provider: &str, builder: RequestBuilder) -> Result<Response, LlmError> {
    let response = builder.send().await.map_err(|e| {
        tracing::error!(provider, error = %e, "upstream request failed");
        LlmError::Upstream(e.to_string())
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider, status = %status, "upstream returned error");
        return Err(LlmError::Upstream(format!("provider returned {status}: {body}")));
    }

    Ok(response)
}

/// Decode a JSON response body
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, LlmError> {
    response
        .json()
        .await
        .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))
}

/// What a single upstream stream chunk contributes to the fragment stream
#[derive(Debug)]
pub(crate) enum ChunkOutcome {
    /// A text fragment to forward
    Fragment(String),
    /// Nothing to forward (role-only delta, empty text, keep-alive)
    Skip,
    /// Upstream signalled the end of the stream
    Done,
    /// The chunk was an error or could not be understood
    Failed(LlmError),
}

/// Turn a stream of chunk outcomes into a fragment stream
///
/// Stops at `Done`; skipped chunks produce nothing.
pub(crate) fn into_fragments<S>(outcomes: S) -> FragmentStream
where
    S: Stream<Item = ChunkOutcome> + Send + 'static,
{
    let fragments = outcomes
        .take_while(|outcome| future::ready(!matches!(outcome, ChunkOutcome::Done)))
        .filter_map(|outcome| {
            future::ready(match outcome {
                ChunkOutcome::Fragment(text) => Some(Ok(text)),
                ChunkOutcome::Failed(error) => Some(Err(error)),
                ChunkOutcome::Skip | ChunkOutcome::Done => None,
            })
        });

    Box::pin(fragments)
}
