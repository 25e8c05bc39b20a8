//! Common chassis types for switch port reconciliation.
//!
//! This crate provides the declarative chassis config model and the
//! strongly-typed enums shared by the device backend and the chassis manager:
//!
//! - [`ChassisConfig`]: the desired node/port layout pushed by a controller
//! - [`PortKey`]: the `(slot, port, channel)` wiring identity of a port
//! - [`AdminState`], [`TriState`], [`LoopbackState`], [`FecMode`]: port tunables
//! - [`PortState`]: operational link state
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses

mod config;
mod mac;
mod port;

pub use config::{
    Chassis, ChassisConfig, Node, Platform, PortConfigParams, PortGroup, PortKey, SingletonPort,
    TrunkPort, CPU_PORT_ID,
};
pub use mac::MacAddress;
pub use port::{AdminState, FecMode, LoopbackState, PacketDirection, PortState, PortType, TriState};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid admin state: {0}")]
    InvalidAdminState(String),

    #[error("invalid tri-state value: {0}")]
    InvalidTriState(String),

    #[error("invalid loopback mode: {0}")]
    InvalidLoopbackState(String),

    #[error("invalid FEC mode: {0}")]
    InvalidFecMode(String),

    #[error("invalid port type: {0}")]
    InvalidPortType(String),
}
