use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Environment variable holding the `OpenAI` API key
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the Gemini API key
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable holding the Perplexity API key
pub const PERPLEXITY_API_KEY_VAR: &str = "PERPLEXITY_API_KEY";

/// Per-provider upstream configuration
///
/// All three providers are always available; each table only overrides
/// credentials, endpoints and timeouts.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// OpenAI-compatible chat completions upstream
    #[serde(default)]
    pub openai: ProviderConfig,
    /// Gemini (Google Generative Language) upstream
    #[serde(default)]
    pub gemini: ProviderConfig,
    /// Perplexity chat completions upstream
    #[serde(default)]
    pub perplexity: ProviderConfig,
}

/// Configuration for a single upstream provider
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used when the client does not name one
    #[serde(default)]
    pub default_model: Option<String>,
    /// TCP connect timeout (e.g. "5s"); unbounded when absent
    #[serde(default, deserialize_with = "crate::duration::deserialize_optional")]
    pub connect_timeout: Option<Duration>,
    /// Whole-request timeout, including streamed bodies; unbounded when absent
    #[serde(default, deserialize_with = "crate::duration::deserialize_optional")]
    pub request_timeout: Option<Duration>,
}

impl ProvidersConfig {
    /// Fill missing API keys from the conventional environment variables
    ///
    /// A key that is still missing afterwards is not an error: the upstream
    /// rejects the call at request time.
    pub fn apply_env_keys(&mut self) {
        let slots = [
            ("openai", OPENAI_API_KEY_VAR, &mut self.openai),
            ("gemini", GEMINI_API_KEY_VAR, &mut self.gemini),
            ("perplexity", PERPLEXITY_API_KEY_VAR, &mut self.perplexity),
        ];

        for (provider, var, config) in slots {
            if config.api_key.is_some() {
                continue;
            }

            match std::env::var(var) {
                Ok(key) if !key.is_empty() => config.api_key = Some(SecretString::from(key)),
                _ => tracing::debug!(provider, var, "no API key configured"),
            }
        }
    }
}
