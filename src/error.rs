//! Error types for the room service
//!
//! Coordinator operations return [`RoomResult`] so callers can match on the
//! failure kind; the service shell uses the anyhow-based [`Result`] alias.

/// Result type alias for service-level code
pub type Result<T> = anyhow::Result<T>;

/// Result type alias for room and session operations
pub type RoomResult<T> = std::result::Result<T, RoomError>;

/// Failures surfaced by the room coordinator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Server is full")]
    ServerFull { capacity: usize },

    #[error("Wrong passcode")]
    WrongPasscode { room_id: String },

    #[error("Room not found: {room_id}")]
    RoomNotFound { room_id: String },

    #[error("Invalid move at index {index}: {reason}")]
    InvalidMove { index: usize, reason: String },

    #[error("Not your turn in room {room_id}")]
    NotYourTurn { room_id: String },

    #[error("Could not generate a free room id after {attempts} attempts")]
    RoomIdExhausted { attempts: usize },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

impl RoomError {
    /// Whether this failure is reported back to the requesting connection
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            RoomError::ServerFull { .. }
                | RoomError::WrongPasscode { .. }
                | RoomError::RoomIdExhausted { .. }
                | RoomError::Internal { .. }
        )
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::ServerFull { .. } => "server_full",
            RoomError::WrongPasscode { .. } => "wrong_passcode",
            RoomError::RoomNotFound { .. } => "room_not_found",
            RoomError::InvalidMove { .. } => "invalid_move",
            RoomError::NotYourTurn { .. } => "not_your_turn",
            RoomError::RoomIdExhausted { .. } => "room_id_exhausted",
            RoomError::Internal { .. } => "internal",
        }
    }
}
