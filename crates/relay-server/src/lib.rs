//! HTTP server assembly for the relay

mod cors;
mod pages;

use std::net::SocketAddr;

use axum::{Router, routing};
use relay_config::Config;
use relay_llm::LlmState;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a provider adapter cannot be initialized
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let llm_state = LlmState::from_config(&config.providers)?;

        Ok(Self::with_state(config, llm_state))
    }

    /// Build the server around an already-initialized provider table
    pub fn with_state(config: &Config, llm_state: LlmState) -> Self {
        let mut app = Router::new();

        if config.server.landing_page {
            app = app.route("/", routing::get(pages::landing_handler));
        }

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, routing::get(pages::health_handler));
        }

        app = app.merge(relay_llm::llm_router(llm_state));

        app = app.layer(TraceLayer::new_for_http());
        app = app.layer(cors::cors_layer(config.server.cors.as_ref()));

        Self {
            router: app,
            listen_address: config.server.listen_address(),
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "relay listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
