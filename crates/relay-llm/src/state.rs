//! Shared, immutable state for the relay route handlers

use std::sync::Arc;

use relay_config::ProvidersConfig;

use crate::error::LlmError;
use crate::provider::{Provider, ProviderSet};
use crate::types::ProviderKind;

/// Shared state for the relay route handlers
#[derive(Clone)]
pub struct LlmState {
    providers: Arc<ProviderSet>,
}

impl LlmState {
    /// Wrap an already-built provider table
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers: Arc::new(providers),
        }
    }

    /// Build every provider adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any provider fails to initialize.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, LlmError> {
        let providers = ProviderSet::from_config(config)?;

        tracing::debug!(providers = ?ProviderKind::ALL, "provider adapters ready");

        Ok(Self::new(providers))
    }

    /// Adapter for a provider
    pub(crate) fn provider(&self, kind: ProviderKind) -> Result<&Arc<dyn Provider>, LlmError> {
        self.providers.get(kind)
    }
}
