//! Port operations of the device backend.
//!
//! All operations are synchronous and keyed by a [`Unit`] and an
//! [`SdkPortId`]. Implementations must be safe to share across threads; the
//! chassis manager serializes mutating calls under its own lock.

use crate::error::DeviceResult;
use crate::types::{SdkPortId, Unit};
use chassis_types::{FecMode, LoopbackState, PacketDirection, PortKey, PortState, PortType, TriState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Parameters passed to the backend when a port is created.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DevicePortParams {
    pub port_name: String,
    pub port_type: PortType,
    pub packet_dir: PacketDirection,
    pub queues: u32,
    pub mtu: u32,
    pub pipeline_name: String,
    pub mempool_name: String,
    pub socket_path: Option<String>,
    pub host_name: Option<String>,
    pub pci_bdf: Option<String>,
}

/// Traffic counters of a single port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortCounters {
    pub in_octets: u64,
    pub out_octets: u64,
    pub in_unicast_pkts: u64,
    pub out_unicast_pkts: u64,
    pub in_broadcast_pkts: u64,
    pub out_broadcast_pkts: u64,
    pub in_multicast_pkts: u64,
    pub out_multicast_pkts: u64,
    pub in_discards: u64,
    pub out_discards: u64,
    pub in_unknown_protos: u64,
    pub in_errors: u64,
    pub out_errors: u64,
    pub in_fcs_errors: u64,
}

/// Link state change reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortStatusEvent {
    pub unit: Unit,
    pub sdk_port_id: SdkPortId,
    pub state: PortState,
    pub time_last_changed: DateTime<Utc>,
}

/// Operations the chassis manager needs from a data-plane backend.
pub trait DeviceInterface: Send + Sync {
    /// Maps a `(slot, port, channel)` triple to the backend's port id.
    fn resolve_port_key(&self, unit: Unit, key: &PortKey) -> DeviceResult<SdkPortId>;

    /// Returns true if the port is currently created on the backend.
    fn port_exists(&self, unit: Unit, port: SdkPortId) -> bool;

    fn create_port(
        &self,
        unit: Unit,
        port: SdkPortId,
        speed_bps: u64,
        params: &DevicePortParams,
        fec_mode: FecMode,
    ) -> DeviceResult<()>;

    fn delete_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()>;

    fn enable_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()>;

    fn disable_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()>;

    fn set_autoneg_policy(&self, unit: Unit, port: SdkPortId, autoneg: TriState)
        -> DeviceResult<()>;

    fn set_loopback_mode(
        &self,
        unit: Unit,
        port: SdkPortId,
        mode: LoopbackState,
    ) -> DeviceResult<()>;

    fn set_mtu(&self, unit: Unit, port: SdkPortId, mtu: u32) -> DeviceResult<()>;

    /// Reads the live operational state of a port.
    fn get_port_state(&self, unit: Unit, port: SdkPortId) -> DeviceResult<PortState>;

    fn get_port_counters(&self, unit: Unit, port: SdkPortId) -> DeviceResult<PortCounters>;

    /// Returns a human-readable chip type for the unit.
    fn chip_type(&self, unit: Unit) -> DeviceResult<String>;
}
