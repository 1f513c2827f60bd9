//! Infinity Room - room and match-state coordinator for infinity tic-tac-toe
//!
//! Pairs of players share a named, optionally passcode-protected room where
//! each side keeps only its three most recent marks. Spectators may watch.
//! This crate owns rooms, seats, board state, anonymous matchmaking and the
//! WebSocket transport that carries the event protocol.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod game;
pub mod matchmaking;
pub mod metrics;
pub mod protocol;
pub mod room;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, RoomError, RoomResult};
pub use types::*;

// Re-export key components
pub use game::GameState;
pub use matchmaking::Matchmaker;
pub use room::RoomRegistry;
pub use session::{CoordinatorConfig, SessionCoordinator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
