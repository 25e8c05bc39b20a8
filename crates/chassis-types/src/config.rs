//! Declarative chassis config model.
//!
//! A [`ChassisConfig`] describes the desired node and port layout of a switch.
//! It is deserialized from YAML or JSON and handed to the chassis manager,
//! which verifies it and reconciles the device against it.
//!
//! Unset string parameters are `None` and unset numeric parameters are
//! `None` or zero; the manager applies its own defaults when a port is
//! created.

use crate::port::{AdminState, FecMode, LoopbackState, PortType, TriState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved port id of the CPU port. Never valid for a singleton port.
pub const CPU_PORT_ID: u32 = 0xFFFF_FFFD;

/// Hardware platform the chassis runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Unknown,
    GenericBarefootTofino,
    GenericBarefootTofino2,
    P4SoftSwitch,
    GenericBroadcomTomahawk,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Unknown => "unknown",
            Platform::GenericBarefootTofino => "generic_barefoot_tofino",
            Platform::GenericBarefootTofino2 => "generic_barefoot_tofino2",
            Platform::P4SoftSwitch => "p4_soft_switch",
            Platform::GenericBroadcomTomahawk => "generic_broadcom_tomahawk",
        };
        write!(f, "{}", s)
    }
}

/// Chassis-wide attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Chassis {
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub name: String,
}

/// A switching node (one ASIC or one software pipeline instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub slot: i32,
    #[serde(default)]
    pub name: String,
}

impl Node {
    pub fn new(id: u64, slot: i32) -> Self {
        Self {
            id,
            slot,
            name: String::new(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(id: {}, slot: {})", self.id, self.slot)
    }
}

/// Physical wiring identity of a port: `(slot, port, channel)`.
///
/// A channel of zero means the port is not channelized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortKey {
    pub slot: i32,
    pub port: i32,
    pub channel: i32,
}

impl PortKey {
    pub const fn new(slot: i32, port: i32, channel: i32) -> Self {
        Self {
            slot,
            port,
            channel,
        }
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(slot: {}, port: {}, channel: {})",
            self.slot, self.port, self.channel
        )
    }
}

/// Per-port tunables carried in a singleton port entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfigParams {
    pub admin_state: AdminState,
    pub fec_mode: FecMode,
    /// Zero or absent means "use the default MTU".
    pub mtu: Option<u32>,
    pub autoneg: TriState,
    pub loopback_mode: LoopbackState,
    pub port_type: PortType,
    pub pipeline_name: Option<String>,
    pub mempool_name: Option<String>,
    /// When set, a TAP control port with this name is created alongside the port.
    pub control_port: Option<String>,
    pub queues: u32,
    pub socket_path: Option<String>,
    pub host_name: Option<String>,
    pub pci_bdf: Option<String>,
}

impl PortConfigParams {
    /// Returns the MTU only if one was explicitly specified.
    pub fn explicit_mtu(&self) -> Option<u32> {
        self.mtu.filter(|mtu| *mtu > 0)
    }
}

/// A single (non-trunk) port entry of the chassis config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonPort {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub slot: i32,
    pub port: i32,
    #[serde(default)]
    pub channel: i32,
    pub node: u64,
    pub speed_bps: u64,
    #[serde(default)]
    pub config_params: PortConfigParams,
}

impl SingletonPort {
    /// Creates a port with default config params.
    pub fn new(id: u32, node: u64, key: PortKey, speed_bps: u64) -> Self {
        Self {
            id,
            name: String::new(),
            slot: key.slot,
            port: key.port,
            channel: key.channel,
            node,
            speed_bps,
            config_params: PortConfigParams::default(),
        }
    }

    pub fn with_admin_state(mut self, admin_state: AdminState) -> Self {
        self.config_params.admin_state = admin_state;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn port_key(&self) -> PortKey {
        PortKey::new(self.slot, self.port, self.channel)
    }
}

impl fmt::Display for SingletonPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SingletonPort(id: {}, node: {}, slot: {}, port: {}, channel: {}, speed_bps: {})",
            self.id, self.node, self.slot, self.port, self.channel, self.speed_bps
        )
    }
}

/// Trunk (LAG) port. Not supported by the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrunkPort {
    pub id: u32,
    pub node: u64,
    #[serde(default)]
    pub members: Vec<u32>,
}

/// Port group (breakout group). Not supported by the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortGroup {
    pub id: u32,
    pub node: u64,
    #[serde(default)]
    pub members: Vec<u32>,
}

/// The full desired chassis layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub description: String,
    pub chassis: Option<Chassis>,
    pub nodes: Vec<Node>,
    pub singleton_ports: Vec<SingletonPort>,
    pub trunk_ports: Vec<TrunkPort>,
    pub port_groups: Vec<PortGroup>,
}

impl ChassisConfig {
    /// Returns the declared platform, or `Unknown` if no chassis block is present.
    pub fn platform(&self) -> Platform {
        self.chassis
            .as_ref()
            .map(|c| c.platform)
            .unwrap_or_default()
    }
}
