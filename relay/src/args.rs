use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;

/// Config file picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "relay.toml";

/// Chat relay for OpenAI, Gemini and Perplexity
#[derive(Debug, Parser)]
#[command(name = "relay", about = "Relay chat messages to OpenAI, Gemini and Perplexity")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "RELAY_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directive
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

impl Args {
    /// Config file to load, if any
    ///
    /// An explicit path is always used. Otherwise `relay.toml` is used when
    /// it exists, and the defaults apply when it does not.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.exists().then(|| default.to_path_buf())
        })
    }
}
