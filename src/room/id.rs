//! Room identifier generation for matchmaker-created rooms

use crate::types::RoomId;
use uuid::Uuid;

/// Longest token the default generator can produce
pub const MAX_ROOM_ID_LENGTH: usize = 32;

/// Source of identifiers for rooms the service creates itself
pub trait RoomIdGenerator: Send + Sync {
    /// Produce a candidate identifier; the registry checks it for collisions
    fn generate(&self) -> RoomId;
}

/// Short random lowercase alphanumeric tokens
#[derive(Debug, Clone)]
pub struct RandomRoomIdGenerator {
    length: usize,
}

impl RandomRoomIdGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.clamp(1, MAX_ROOM_ID_LENGTH),
        }
    }
}

impl Default for RandomRoomIdGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl RoomIdGenerator for RandomRoomIdGenerator {
    fn generate(&self) -> RoomId {
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(self.length);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let generator = RandomRoomIdGenerator::default();
        let token = generator.generate();
        assert_eq!(token.len(), 6);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_length_is_clamped() {
        assert_eq!(RandomRoomIdGenerator::new(0).generate().len(), 1);
        assert_eq!(RandomRoomIdGenerator::new(100).generate().len(), 32);
    }
}
