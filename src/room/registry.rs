//! Room registry with capacity and lifecycle rules
//!
//! The registry is an owned object, so several independent registries can
//! live side by side (one per coordinator, one per test).

use crate::error::{RoomError, RoomResult};
use crate::room::id::{RandomRoomIdGenerator, RoomIdGenerator};
use crate::room::instance::Room;
use crate::types::RoomId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of rooms that may be open at once
pub const DEFAULT_MAX_ROOMS: usize = 10;

/// Default number of attempts to find an unused generated id
pub const DEFAULT_ROOM_ID_ATTEMPTS: usize = 8;

/// Map of room id to room, iterated in creation order
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    order: Vec<RoomId>,
    capacity: usize,
    id_generator: Arc<dyn RoomIdGenerator>,
    max_id_attempts: usize,
}

impl RoomRegistry {
    /// Create a registry with the default random id generator
    pub fn new(capacity: usize) -> Self {
        Self::with_generator(
            capacity,
            Arc::new(RandomRoomIdGenerator::default()),
            DEFAULT_ROOM_ID_ATTEMPTS,
        )
    }

    /// Create a registry with a custom id source
    pub fn with_generator(
        capacity: usize,
        id_generator: Arc<dyn RoomIdGenerator>,
        max_id_attempts: usize,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            order: Vec::new(),
            capacity,
            id_generator,
            max_id_attempts: max_id_attempts.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn is_at_capacity(&self) -> bool {
        self.rooms.len() >= self.capacity
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Look up a room, failing with `RoomNotFound`
    pub fn get_or_fail(&self, room_id: &str) -> RoomResult<&Room> {
        self.rooms.get(room_id).ok_or_else(|| RoomError::RoomNotFound {
            room_id: room_id.to_string(),
        })
    }

    /// Rooms in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.order.iter().filter_map(|id| self.rooms.get(id))
    }

    /// Return the room with this id, creating it if there is still capacity.
    ///
    /// The passcode only matters when the room is created; the boolean is
    /// true when a new room was made.
    pub fn ensure(
        &mut self,
        room_id: &str,
        passcode: Option<String>,
    ) -> RoomResult<(&mut Room, bool)> {
        let created = if self.rooms.contains_key(room_id) {
            false
        } else {
            self.insert(Room::new(room_id.to_string(), passcode))?;
            true
        };

        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RoomError::Internal {
                message: format!("room {} vanished after insertion", room_id),
            })?;
        Ok((room, created))
    }

    /// Create a public room under a freshly generated id
    pub fn create_generated(&mut self) -> RoomResult<&mut Room> {
        self.check_capacity()?;

        let mut room_id = None;
        for attempt in 1..=self.max_id_attempts {
            let candidate = self.id_generator.generate();
            if !self.rooms.contains_key(&candidate) {
                room_id = Some(candidate);
                break;
            }
            warn!(
                "Generated room id '{}' collides with an open room (attempt {}/{})",
                candidate, attempt, self.max_id_attempts
            );
        }
        let room_id = room_id.ok_or(RoomError::RoomIdExhausted {
            attempts: self.max_id_attempts,
        })?;

        self.insert(Room::new(room_id.clone(), None))?;
        self.rooms
            .get_mut(&room_id)
            .ok_or_else(|| RoomError::Internal {
                message: format!("room {} vanished after insertion", room_id),
            })
    }

    /// Delete a room; removing an unknown id is a no-op
    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        let removed = self.rooms.remove(room_id);
        if removed.is_some() {
            self.order.retain(|id| id != room_id);
            info!(
                "Removed room '{}' - open rooms: {}/{}",
                room_id,
                self.rooms.len(),
                self.capacity
            );
        }
        removed
    }

    fn check_capacity(&self) -> RoomResult<()> {
        if self.is_at_capacity() {
            warn!(
                "Room registry at capacity ({}), refusing to create a room",
                self.capacity
            );
            return Err(RoomError::ServerFull {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn insert(&mut self, room: Room) -> RoomResult<()> {
        self.check_capacity()?;
        let room_id = room.id().to_string();
        debug!(
            "Inserting room '{}' (public: {})",
            room_id,
            room.is_public()
        );
        self.order.push(room_id.clone());
        self.rooms.insert(room_id.clone(), room);
        info!(
            "Created room '{}' - open rooms: {}/{}",
            room_id,
            self.rooms.len(),
            self.capacity
        );
        Ok(())
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROOMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out a scripted sequence of ids
    struct ScriptedIds(Mutex<VecDeque<&'static str>>);

    impl RoomIdGenerator for ScriptedIds {
        fn generate(&self) -> RoomId {
            self.0
                .lock()
                .ok()
                .and_then(|mut ids| ids.pop_front())
                .unwrap_or("fallback")
                .to_string()
        }
    }

    #[test]
    fn test_ensure_creates_then_reuses() {
        let mut registry = RoomRegistry::default();
        let (room, created) = registry.ensure("alpha", Some("pw".to_string())).unwrap();
        assert!(created);
        assert!(!room.is_public());

        let (room, created) = registry.ensure("alpha", None).unwrap();
        assert!(!created);
        // Passcode is fixed at creation
        assert!(!room.is_public());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capacity_limit() {
        let mut registry = RoomRegistry::default();
        for i in 0..DEFAULT_MAX_ROOMS {
            registry.ensure(&format!("room-{}", i), None).unwrap();
        }
        assert!(registry.is_at_capacity());

        let result = registry.ensure("room-11", None);
        assert!(matches!(result, Err(RoomError::ServerFull { capacity: 10 })));
        assert!(!registry.contains("room-11"));
        assert_eq!(registry.len(), DEFAULT_MAX_ROOMS);

        // Existing rooms remain reachable when full
        assert!(registry.ensure("room-3", None).is_ok());
        assert!(registry.create_generated().is_err());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = RoomRegistry::default();
        registry.ensure("alpha", None).unwrap();
        assert!(registry.remove("alpha").is_some());
        assert!(registry.remove("alpha").is_none());
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get_or_fail("alpha"),
            Err(RoomError::RoomNotFound { .. })
        ));
    }

    #[test]
    fn test_iteration_follows_creation_order() {
        let mut registry = RoomRegistry::default();
        for id in ["c", "a", "b"] {
            registry.ensure(id, None).unwrap();
        }
        registry.remove("a");
        registry.ensure("a", None).unwrap();

        let ids: Vec<&str> = registry.iter().map(Room::id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_generated_ids_retry_on_collision() {
        let ids = ScriptedIds(Mutex::new(VecDeque::from(vec!["taken", "taken", "fresh"])));
        let mut registry = RoomRegistry::with_generator(10, Arc::new(ids), 3);
        registry.ensure("taken", None).unwrap();

        let room = registry.create_generated().unwrap();
        assert_eq!(room.id(), "fresh");
        assert!(room.is_public());
    }

    #[test]
    fn test_generated_ids_give_up_after_max_attempts() {
        let ids = ScriptedIds(Mutex::new(VecDeque::from(vec!["taken", "taken"])));
        let mut registry = RoomRegistry::with_generator(10, Arc::new(ids), 2);
        registry.ensure("taken", None).unwrap();

        assert!(matches!(
            registry.create_generated(),
            Err(RoomError::RoomIdExhausted { attempts: 2 })
        ));
        assert_eq!(registry.len(), 1);
    }
}
