//! Metrics and monitoring for the room service

pub mod collector;

pub use collector::MetricsCollector;
