//! Per-connection protocol handling
//!
//! This module binds connections to rooms, relays moves and resets, and
//! cleans up after disconnects. Presence snapshots are derived here too.

pub mod connection;
pub mod coordinator;
pub mod presence;

// Re-export commonly used types
pub use connection::{Binding, Session, SessionState};
pub use coordinator::{CoordinatorConfig, CoordinatorStats, RoomSummary, SessionCoordinator};
pub use presence::PresenceNotifier;
