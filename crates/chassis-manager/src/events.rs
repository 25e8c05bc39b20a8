//! Port state change notifications.
//!
//! The chassis manager holds at most one [`EventWriter`]. Link state changes
//! reported by the device are translated from `(unit, sdk port)` to
//! `(node, port)` and forwarded to it as [`ChassisEvent`]s.

use chassis_types::PortState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

/// Notification emitted by the chassis manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChassisEvent {
    PortOperStateChanged {
        node_id: u64,
        port_id: u32,
        state: PortState,
        time_last_changed: DateTime<Utc>,
    },
}

/// Sink for chassis events.
pub trait EventWriter: Send + Sync {
    /// Delivers one event. Returns false if the receiving side is gone.
    fn write(&self, event: ChassisEvent) -> bool;
}

impl EventWriter for mpsc::UnboundedSender<ChassisEvent> {
    fn write(&self, event: ChassisEvent) -> bool {
        self.send(event).is_ok()
    }
}

impl EventWriter for mpsc::Sender<ChassisEvent> {
    fn write(&self, event: ChassisEvent) -> bool {
        self.try_send(event).is_ok()
    }
}
