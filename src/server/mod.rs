//! HTTP and WebSocket server
//!
//! A single axum router serves the `/ws` game endpoint next to the health,
//! metrics and stats endpoints.

pub mod endpoints;
pub mod ws;

use crate::config::AppConfig;
use crate::metrics::MetricsCollector;
use crate::session::SessionCoordinator;
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Shared state for all handlers
#[derive(Clone)]
pub struct ServerState {
    pub coordinator: SessionCoordinator,
    pub metrics: Arc<MetricsCollector>,
    pub service_name: String,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    /// Build a coordinator and metrics collector from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let metrics = Arc::new(MetricsCollector::new().context("Failed to create metrics")?);
        let coordinator =
            SessionCoordinator::new(config.coordinator_config()).with_metrics(metrics.clone());
        Ok(Self {
            coordinator,
            metrics,
            service_name: config.service.name.clone(),
            started_at: crate::utils::current_timestamp(),
        })
    }
}

/// Build the router with every endpoint
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(endpoints::root_handler))
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(endpoints::health_handler))
        .route("/metrics", get(endpoints::metrics_handler))
        .route("/stats", get(endpoints::stats_handler))
        .with_state(state)
}

/// The room service's network front
pub struct RoomServer {
    config: AppConfig,
    state: ServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl RoomServer {
    /// Create a new server from configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let state = ServerState::from_config(&config)?;
        let (shutdown_tx, _) = broadcast::channel(1);
        Ok(Self {
            config,
            state,
            shutdown_tx,
        })
    }

    pub fn state(&self) -> ServerState {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Bind the configured address and serve until stopped
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address()
            .parse()
            .context("Invalid listen address")?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until stopped
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        info!("Room server listening on http://{} (ws at /ws)", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Room server shutdown signal received");
            })
            .await?;

        info!("Room server stopped");
        Ok(())
    }

    /// Ask a running server to shut down
    pub fn stop(&self) {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Room server is not running, nothing to stop");
        }
    }
}
