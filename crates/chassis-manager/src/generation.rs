//! Snapshot of applied chassis state.
//!
//! A [`Generation`] is built from scratch by every push and becomes live in a
//! single reference swap once the whole push succeeded. It holds the
//! node/unit bijection, one record per `(node, port)` and the reverse index
//! from SDK port id back to port id.

use crate::port_config::PortConfig;
use chassis_device::{SdkPortId, Unit};
use chassis_types::{PortKey, PortState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Composite key of a port: the node it belongs to and its id on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PortRef {
    pub node_id: u64,
    pub port_id: u32,
}

impl PortRef {
    pub const fn new(node_id: u64, port_id: u32) -> Self {
        Self { node_id, port_id }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Port {} in node {}", self.port_id, self.node_id)
    }
}

/// Everything known about one port in a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortRecord {
    pub key: PortKey,
    pub sdk_port_id: SdkPortId,
    /// Last reported operational state; `Unknown` forces a live query.
    pub state: PortState,
    pub time_last_changed: DateTime<Utc>,
    pub config: PortConfig,
}

impl PortRecord {
    /// Creates a record with unknown state and an epoch timestamp.
    pub fn new(key: PortKey, sdk_port_id: SdkPortId) -> Self {
        Self {
            key,
            sdk_port_id,
            state: PortState::Unknown,
            time_last_changed: DateTime::<Utc>::UNIX_EPOCH,
            config: PortConfig::default(),
        }
    }

    /// Forgets the cached operational state.
    pub fn reset_state(&mut self) {
        self.state = PortState::Unknown;
        self.time_last_changed = DateTime::<Utc>::UNIX_EPOCH;
    }
}

/// One consistent snapshot of applied state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    node_id_to_unit: BTreeMap<u64, Unit>,
    unit_to_node_id: BTreeMap<Unit, u64>,
    ports: BTreeMap<PortRef, PortRecord>,
    sdk_port_to_port_id: BTreeMap<(u64, SdkPortId), u32>,
}

impl Generation {
    pub fn insert_node(&mut self, node_id: u64, unit: Unit) {
        self.node_id_to_unit.insert(node_id, unit);
        self.unit_to_node_id.insert(unit, node_id);
    }

    pub fn insert_port(&mut self, port: PortRef, record: PortRecord) {
        self.sdk_port_to_port_id
            .insert((port.node_id, record.sdk_port_id), port.port_id);
        self.ports.insert(port, record);
    }

    pub fn unit(&self, node_id: u64) -> Option<Unit> {
        self.node_id_to_unit.get(&node_id).copied()
    }

    pub fn node_id(&self, unit: Unit) -> Option<u64> {
        self.unit_to_node_id.get(&unit).copied()
    }

    pub fn node_id_to_unit(&self) -> &BTreeMap<u64, Unit> {
        &self.node_id_to_unit
    }

    pub fn port(&self, port: &PortRef) -> Option<&PortRecord> {
        self.ports.get(port)
    }

    pub fn port_mut(&mut self, port: &PortRef) -> Option<&mut PortRecord> {
        self.ports.get_mut(port)
    }

    pub fn contains_port(&self, port: &PortRef) -> bool {
        self.ports.contains_key(port)
    }

    pub fn ports(&self) -> impl Iterator<Item = (&PortRef, &PortRecord)> {
        self.ports.iter()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Iterates the ports of one node in port id order.
    pub fn node_ports_mut(
        &mut self,
        node_id: u64,
    ) -> impl Iterator<Item = (&PortRef, &mut PortRecord)> {
        self.ports
            .range_mut(PortRef::new(node_id, 0)..=PortRef::new(node_id, u32::MAX))
    }

    /// Maps an SDK port back to the port id it was configured under.
    pub fn port_id_for_sdk_port(&self, node_id: u64, sdk_port_id: SdkPortId) -> Option<u32> {
        self.sdk_port_to_port_id
            .get(&(node_id, sdk_port_id))
            .copied()
    }

    /// Returns the `(node, port) -> PortKey` layout of this generation.
    pub fn port_layout(&self) -> BTreeMap<PortRef, PortKey> {
        self.ports.iter().map(|(r, rec)| (*r, rec.key)).collect()
    }
}
