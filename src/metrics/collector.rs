//! Metrics collection using Prometheus
//!
//! This module provides the Prometheus metrics recorded by the session
//! coordinator and exposed on the `/metrics` endpoint.

use crate::types::Role;
use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Main metrics collector for the room service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Rooms currently open
    pub rooms_active: IntGauge,

    /// Connections currently registered
    pub connections_active: IntGauge,

    /// Total rooms created
    pub rooms_created_total: IntCounter,

    /// Total rooms removed after both seats emptied
    pub rooms_removed_total: IntCounter,

    /// Successful joins by role and source (join_room / matchmaking)
    pub joins_total: IntCounterVec,

    /// Rejected joins by reason
    pub joins_rejected_total: IntCounterVec,

    /// Moves applied and relayed
    pub moves_relayed_total: IntCounter,

    /// Inbound events dropped without a reply, by reason
    pub events_dropped_total: IntCounterVec,

    /// Board resets by trigger (requested / seats_filled)
    pub resets_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let rooms_active = IntGauge::new("infinity_room_rooms_active", "Rooms currently open")?;
        let connections_active = IntGauge::new(
            "infinity_room_connections_active",
            "Connections currently registered",
        )?;
        let rooms_created_total =
            IntCounter::new("infinity_room_rooms_created_total", "Total rooms created")?;
        let rooms_removed_total =
            IntCounter::new("infinity_room_rooms_removed_total", "Total rooms removed")?;
        let joins_total = IntCounterVec::new(
            Opts::new("infinity_room_joins_total", "Successful room joins"),
            &["role", "source"],
        )?;
        let joins_rejected_total = IntCounterVec::new(
            Opts::new("infinity_room_joins_rejected_total", "Rejected room joins"),
            &["reason"],
        )?;
        let moves_relayed_total =
            IntCounter::new("infinity_room_moves_relayed_total", "Moves applied and relayed")?;
        let events_dropped_total = IntCounterVec::new(
            Opts::new(
                "infinity_room_events_dropped_total",
                "Inbound events dropped without reply",
            ),
            &["reason"],
        )?;
        let resets_total = IntCounterVec::new(
            Opts::new("infinity_room_resets_total", "Board resets"),
            &["trigger"],
        )?;

        registry.register(Box::new(rooms_active.clone()))?;
        registry.register(Box::new(connections_active.clone()))?;
        registry.register(Box::new(rooms_created_total.clone()))?;
        registry.register(Box::new(rooms_removed_total.clone()))?;
        registry.register(Box::new(joins_total.clone()))?;
        registry.register(Box::new(joins_rejected_total.clone()))?;
        registry.register(Box::new(moves_relayed_total.clone()))?;
        registry.register(Box::new(events_dropped_total.clone()))?;
        registry.register(Box::new(resets_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            rooms_active,
            connections_active,
            rooms_created_total,
            rooms_removed_total,
            joins_total,
            joins_rejected_total,
            moves_relayed_total,
            events_dropped_total,
            resets_total,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_room_created(&self, open_rooms: usize) {
        self.rooms_created_total.inc();
        self.rooms_active.set(open_rooms as i64);
    }

    pub fn record_room_removed(&self, open_rooms: usize) {
        self.rooms_removed_total.inc();
        self.rooms_active.set(open_rooms as i64);
    }

    pub fn record_join(&self, role: Role, source: &str) {
        let role = role.to_string();
        self.joins_total
            .with_label_values(&[role.as_str(), source])
            .inc();
    }

    pub fn record_join_rejected(&self, reason: &str) {
        self.joins_rejected_total.with_label_values(&[reason]).inc();
    }

    pub fn record_move(&self) {
        self.moves_relayed_total.inc();
    }

    pub fn record_dropped_event(&self, reason: &str) {
        self.events_dropped_total.with_label_values(&[reason]).inc();
    }

    pub fn record_reset(&self, trigger: &str) {
        self.resets_total.with_label_values(&[trigger]).inc();
    }

    pub fn set_connections(&self, connections: usize) {
        self.connections_active.set(connections as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
