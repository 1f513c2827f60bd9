//! Infinity Room service binary
//!
//! Serves the WebSocket game endpoint together with health, metrics and
//! stats until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use infinity_room::config::{validate_config, AppConfig};
use infinity_room::server::RoomServer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Room and match-state coordinator for infinity tic-tac-toe
#[derive(Parser)]
#[command(name = "infinity-room", version)]
struct Args {
    /// TOML configuration file; environment variables are used otherwise
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum number of open rooms
    #[arg(long, value_name = "COUNT")]
    max_rooms: Option<usize>,

    /// Only accept moves from the player whose turn it is
    #[arg(long)]
    enforce_turn_order: bool,

    /// Shorthand for `--log-level debug`
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn into_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::from_env()?,
        };

        let service = &mut config.service;
        if self.debug {
            service.log_level = "debug".to_string();
        } else if let Some(level) = self.log_level {
            service.log_level = level;
        }
        if let Some(host) = self.host {
            service.host = host;
        }
        service.port = self.port.unwrap_or(service.port);
        config.rooms.max_rooms = self.max_rooms.unwrap_or(config.rooms.max_rooms);
        config.game.enforce_turn_order |= self.enforce_turn_order;

        validate_config(&config)?;
        Ok(config)
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

/// Resolves on the first SIGINT or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
                    _ = term.recv() => info!("SIGTERM received"),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable ({}), waiting for Ctrl+C", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let dry_run = args.dry_run;
    let config = args.into_config().context("Configuration error")?;
    init_logging(&config.service.log_level)?;

    info!(
        "{} v{} on {} (max rooms: {}, turn order enforced: {})",
        config.service.name,
        infinity_room::VERSION,
        config.bind_address(),
        config.rooms.max_rooms,
        config.game.enforce_turn_order
    );
    if dry_run {
        info!("Configuration is valid, exiting");
        return Ok(());
    }

    let server = Arc::new(RoomServer::new(config.clone())?);
    let mut serving = tokio::spawn({
        let server = server.clone();
        async move { server.start().await }
    });

    tokio::select! {
        _ = shutdown_signal() => {}
        finished = &mut serving => {
            return match finished {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e.context("Room server failed")),
                Err(e) => Err(anyhow::anyhow!("Room server task failed: {}", e)),
            };
        }
    }

    server.stop();
    if tokio::time::timeout(config.shutdown_timeout(), serving)
        .await
        .is_err()
    {
        error!(
            "Room server did not stop within {:?}",
            config.shutdown_timeout()
        );
    }
    Ok(())
}
