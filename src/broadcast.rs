//! Per-room publish groups
//!
//! Every connection registers an unbounded outbound channel. Rooms are named
//! groups of connections; publishing to a group enqueues the event on each
//! member's channel in membership order. Channels are FIFO, so members see a
//! room's events in the order they were published.

use crate::protocol::ServerEvent;
use crate::types::{ConnectionId, RoomId};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiving half handed to the transport for one connection
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// Connection outlets and room groups
#[derive(Debug, Default)]
pub struct BroadcastHub {
    outlets: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    groups: HashMap<RoomId, Vec<ConnectionId>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbound channel for a connection
    pub fn register(&mut self, connection: ConnectionId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outlets.insert(connection, tx);
        rx
    }

    /// Drop a connection's channel and every group membership it had
    pub fn unregister(&mut self, connection: ConnectionId) {
        self.outlets.remove(&connection);
        self.groups.retain(|_, members| {
            members.retain(|member| *member != connection);
            !members.is_empty()
        });
    }

    /// Add a connection to a room's group; joining twice is a no-op
    pub fn join(&mut self, room_id: &str, connection: ConnectionId) {
        let members = self.groups.entry(room_id.to_string()).or_default();
        if !members.contains(&connection) {
            members.push(connection);
        }
    }

    /// Delete a group, returning its former members
    pub fn dissolve(&mut self, room_id: &str) -> Vec<ConnectionId> {
        self.groups.remove(room_id).unwrap_or_default()
    }

    pub fn members(&self, room_id: &str) -> &[ConnectionId] {
        self.groups.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Deliver an event to one connection
    pub fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        match self.outlets.get(&connection) {
            Some(tx) => {
                let delivered = tx.send(event).is_ok();
                if !delivered {
                    debug!("Outbound channel of {} is closed", connection);
                }
                delivered
            }
            None => {
                debug!("No outbound channel for {}", connection);
                false
            }
        }
    }

    /// Deliver an event to every member of a room's group, optionally
    /// skipping one connection. Returns the number of deliveries.
    pub fn publish(
        &self,
        room_id: &str,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let delivered = self
            .members(room_id)
            .iter()
            .filter(|member| Some(**member) != except)
            .filter(|member| self.send_to(**member, event.clone()))
            .count();
        debug!(
            "Published {} to room '{}' - {} recipient(s)",
            event.name(),
            room_id,
            delivered
        );
        delivered
    }
}
