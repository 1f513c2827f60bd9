//! Common types used throughout the room service

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque per-connection token minted by the transport
pub type ConnectionId = Uuid;

/// Room identifier, used verbatim as supplied by callers
pub type RoomId = String;

/// Mark placed on the board by a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Role assigned to a connection when it binds to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    X,
    O,
    Spectator,
}

impl Role {
    /// The board mark this role plays, if any
    pub fn mark(self) -> Option<Mark> {
        match self {
            Role::X => Some(Mark::X),
            Role::O => Some(Mark::O),
            Role::Spectator => None,
        }
    }
}

impl From<Mark> for Role {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Role::X,
            Mark::O => Role::O,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::X => write!(f, "X"),
            Role::O => write!(f, "O"),
            Role::Spectator => write!(f, "Spectator"),
        }
    }
}
