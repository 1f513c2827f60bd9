//! Main application configuration
//!
//! This module defines the configuration structures for the infinity-room
//! service, including environment variable and TOML file loading and
//! validation.

use crate::room::id::MAX_ROOM_ID_LENGTH;
use crate::session::CoordinatorConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rooms: RoomSettings,
    pub game: GameSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address to bind the HTTP/WebSocket listener to
    pub host: String,
    /// Port for the HTTP/WebSocket listener
    pub port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Room registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    /// Maximum number of rooms open at once
    pub max_rooms: usize,
    /// Length of generated public room ids
    pub room_id_length: usize,
    /// Attempts to find an unused generated id
    pub room_id_attempts: usize,
}

/// Game rule settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Reject moves from connections not seated as the mark to move
    pub enforce_turn_order: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "infinity-room".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3001,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        let coordinator = CoordinatorConfig::default();
        Self {
            max_rooms: coordinator.max_rooms,
            room_id_length: coordinator.room_id_length,
            room_id_attempts: coordinator.room_id_attempts,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing keys take defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).context("Failed to parse TOML configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HOST") {
            self.service.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.service.port = parse_var("PORT", &port)?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = parse_var("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Room settings
        if let Ok(max_rooms) = env::var("MAX_ROOMS") {
            self.rooms.max_rooms = parse_var("MAX_ROOMS", &max_rooms)?;
        }
        if let Ok(length) = env::var("ROOM_ID_LENGTH") {
            self.rooms.room_id_length = parse_var("ROOM_ID_LENGTH", &length)?;
        }
        if let Ok(attempts) = env::var("ROOM_ID_MAX_ATTEMPTS") {
            self.rooms.room_id_attempts = parse_var("ROOM_ID_MAX_ATTEMPTS", &attempts)?;
        }

        // Game settings
        if let Ok(enforce) = env::var("ENFORCE_TURN_ORDER") {
            self.game.enforce_turn_order = parse_var("ENFORCE_TURN_ORDER", &enforce)?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Listener address as `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }

    /// Settings handed to the session coordinator
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            max_rooms: self.rooms.max_rooms,
            room_id_length: self.rooms.room_id_length,
            room_id_attempts: self.rooms.room_id_attempts,
            enforce_turn_order: self.game.enforce_turn_order,
        }
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.host.is_empty() {
        return Err(anyhow!("Host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate room settings
    if config.rooms.max_rooms == 0 {
        return Err(anyhow!("Max rooms must be greater than 0"));
    }
    if config.rooms.room_id_length == 0 || config.rooms.room_id_length > MAX_ROOM_ID_LENGTH {
        return Err(anyhow!(
            "Room id length must be between 1 and {}",
            MAX_ROOM_ID_LENGTH
        ));
    }
    if config.rooms.room_id_attempts == 0 {
        return Err(anyhow!("Room id attempts must be greater than 0"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.service.port, 3001);
        assert_eq!(config.rooms.max_rooms, 10);
        assert!(!config.game.enforce_turn_order);
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [service]
            port = 8080

            [game]
            enforce_turn_order = true
            "#,
        )
        .unwrap();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.rooms.max_rooms, 10);
        assert!(config.coordinator_config().enforce_turn_order);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.rooms.max_rooms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.rooms.room_id_length = 64;
        assert!(validate_config(&config).is_err());

        assert!(AppConfig::from_toml_str("[rooms]\nmax_rooms = 0").is_err());
    }
}
