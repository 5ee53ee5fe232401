use std::path::Path;

use anyhow::Context;

use crate::Config;

/// Paths owned by the relay routes
const RESERVED_PATHS: [&str; 3] = ["/", "/ask", "/ask_stream"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Expands `{{ env.VAR }}` placeholders, deserializes, fills missing API
    /// keys from the environment and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, expansion or parsing
    /// fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Build configuration from the optional config file path
    ///
    /// Without a path the defaults are used, with API keys taken from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Config::load`]
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.providers.apply_env_keys();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Parse configuration from raw TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw).context("config variable expansion failed")?;

        let mut config: Self = toml::from_str(&expanded).context("failed to parse config")?;
        config.providers.apply_env_keys();
        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error on a non-http(s) base URL, a zero timeout, a health
    /// path without a leading slash or an out-of-range sampling rate
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_providers()?;
        self.validate_server()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        let providers = [
            ("openai", &self.providers.openai),
            ("gemini", &self.providers.gemini),
            ("perplexity", &self.providers.perplexity),
        ];

        for (name, provider) in providers {
            if let Some(ref url) = provider.base_url
                && !matches!(url.scheme(), "http" | "https")
            {
                anyhow::bail!("providers.{name}.base_url must use http or https, got '{}'", url.scheme());
            }

            if provider.connect_timeout.is_some_and(|t| t.is_zero()) {
                anyhow::bail!("providers.{name}.connect_timeout must be greater than 0");
            }

            if provider.request_timeout.is_some_and(|t| t.is_zero()) {
                anyhow::bail!("providers.{name}.request_timeout must be greater than 0");
            }

            if provider.default_model.as_deref().is_some_and(str::is_empty) {
                anyhow::bail!("providers.{name}.default_model must not be empty");
            }
        }

        Ok(())
    }

    fn validate_server(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
        }

        if health.enabled && RESERVED_PATHS.contains(&health.path.as_str()) {
            anyhow::bail!("server.health.path '{}' is already routed", health.path);
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        let rate = self.telemetry.sampling_rate;
        if !(0.0..=1.0).contains(&rate) {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0, got {rate}");
        }

        Ok(())
    }
}
