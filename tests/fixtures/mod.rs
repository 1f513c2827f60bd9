//! Test fixtures and helpers for integration testing

#![allow(dead_code)]

use infinity_room::broadcast::EventReceiver;
use infinity_room::protocol::{RoleAssignment, ServerEvent};
use infinity_room::room::RoomIdGenerator;
use infinity_room::session::SessionCoordinator;
use infinity_room::types::{ConnectionId, RoomId};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A connected client: its id and the events queued for it
pub struct TestClient {
    pub id: ConnectionId,
    pub events: EventReceiver,
}

impl TestClient {
    pub fn connect(coordinator: &SessionCoordinator) -> Self {
        let (id, events) = coordinator.connect().unwrap();
        Self { id, events }
    }

    /// Take every event queued so far
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// The last role assignment among queued events
    pub fn last_assignment(&mut self) -> Option<RoleAssignment> {
        self.drain().into_iter().rev().find_map(|event| match event {
            ServerEvent::AssignRole(assignment) => Some(assignment),
            _ => None,
        })
    }
}

/// Predictable room ids: `room-1`, `room-2`, ...
#[derive(Debug, Default)]
pub struct CountingRoomIds {
    next: AtomicUsize,
}

impl RoomIdGenerator for CountingRoomIds {
    fn generate(&self) -> RoomId {
        format!("room-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Names of the events in order
pub fn event_names(events: &[ServerEvent]) -> Vec<&'static str> {
    events.iter().map(ServerEvent::name).collect()
}
