use std::sync::Arc;

use quire_gate::{spawn_sweeper, AccessGateway, Sweep};
use quire_store::{OpenStatus, PublicationStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::StaticTokenAuth;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::session::SessionRegistry;
use crate::state::AppState;

/// Quire publication server.
pub struct QuireServer {
    config: ServerConfig,
    state: AppState,
}

impl QuireServer {
    /// Validate the config and open the store under `data_dir`.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let token = config
            .api_token
            .clone()
            .ok_or_else(|| ServerError::Config("api_token must be set".into()))?;

        let store = PublicationStore::open(&config.data_dir, config.limits.clone())?;
        if let OpenStatus::Recovered(report) = store.open_status() {
            warn!(
                recovered = report.recovered,
                reason = %report.reason,
                "index was rebuilt from disk; titles and passwords were lost"
            );
        }

        let state = AppState::new(
            Arc::new(store),
            AccessGateway::with_config(&config.throttle),
            Arc::new(SessionRegistry::new(config.session_idle_ttl())),
            Arc::new(StaticTokenAuth::new(token)),
        );
        Ok(Self { config, state })
    }

    /// Assemble a server from prepared parts.
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_request_bytes)
    }

    /// Serve until Ctrl-C. Throttle entries and idle sessions are swept in
    /// the background for as long as the server runs.
    pub async fn serve(self) -> ServerResult<()> {
        let targets: Vec<Arc<dyn Sweep>> = vec![
            self.state.gateway.throttle().clone(),
            self.state.sessions.clone(),
        ];
        let sweeper = spawn_sweeper(targets, self.config.throttle.sweep_interval());

        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, data_dir = %self.config.data_dir.display(), "quire server listening");

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        result.map_err(ServerError::Io)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
