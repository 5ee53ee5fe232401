#![allow(clippy::must_use_candidate)]

pub mod cors;
mod duration;
mod env;
pub mod health;
mod loader;
pub mod providers;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use cors::*;
pub use health::*;
pub use providers::*;
pub use server::*;
pub use telemetry::{ExportProtocol, ExporterConfig, LogFormat, TelemetryConfig};

/// Top-level relay configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Logging and trace export configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
