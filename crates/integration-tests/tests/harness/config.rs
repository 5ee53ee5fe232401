//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use relay_config::{Config, CorsConfig, ProviderConfig};
use secrecy::SecretString;

use super::mock_upstream::MockUpstream;

pub const OPENAI_TEST_KEY: &str = "test-openai-key";
pub const GEMINI_TEST_KEY: &str = "test-gemini-key";
pub const PERPLEXITY_TEST_KEY: &str = "test-perplexity-key";

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));

        Self { config }
    }

    /// Point every provider at the mock upstream, each with its own test key
    pub fn with_upstream(mut self, upstream: &MockUpstream) -> Self {
        self.config.providers.openai = provider(&upstream.openai_url(), OPENAI_TEST_KEY);
        self.config.providers.gemini = provider(&upstream.gemini_url(), GEMINI_TEST_KEY);
        self.config.providers.perplexity = provider(&upstream.perplexity_url(), PERPLEXITY_TEST_KEY);
        self
    }

    /// Override the default model of the `OpenAI` provider
    pub fn with_openai_default_model(mut self, model: &str) -> Self {
        self.config.providers.openai.default_model = Some(model.to_owned());
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Disable the landing page
    pub fn without_landing_page(mut self) -> Self {
        self.config.server.landing_page = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

fn provider(base_url: &str, api_key: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: Some(SecretString::from(api_key)),
        base_url: Some(base_url.parse().expect("valid URL")),
        ..ProviderConfig::default()
    }
}
