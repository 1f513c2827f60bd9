//! Presence notifications derived from slot occupancy

use crate::broadcast::BroadcastHub;
use crate::protocol::ServerEvent;
use crate::room::{Presence, RoomRegistry};
use tracing::debug;

/// Emits `opponent_status` snapshots to a room's group
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceNotifier;

impl PresenceNotifier {
    pub fn new() -> Self {
        Self
    }

    /// Broadcast the room's current occupancy once. Unknown rooms are skipped.
    pub fn notify(
        &self,
        registry: &RoomRegistry,
        hub: &BroadcastHub,
        room_id: &str,
    ) -> Option<Presence> {
        let presence = registry.get(room_id)?.presence();
        let recipients = hub.publish(room_id, &ServerEvent::OpponentStatus(presence), None);
        debug!(
            "Presence for room '{}' - x: {}, o: {}, recipients: {}",
            room_id, presence.x_connected, presence.o_connected, recipients
        );
        Some(presence)
    }
}
