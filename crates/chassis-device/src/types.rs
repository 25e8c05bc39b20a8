//! Strongly-typed device identifiers.
//!
//! A [`Unit`] is the dense per-node index the backend is addressed with, and
//! an [`SdkPortId`] is the backend's own port handle. Keeping them as
//! distinct types prevents passing a unit where a port is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset added to a port's SDK id to obtain its auto-created control port.
pub const CONTROL_PORT_BASE: u32 = 256;

/// Dense 0-based index of a node as seen by the device backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(u32);

impl Unit {
    pub const fn new(unit: u32) -> Self {
        Unit(unit)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-assigned port identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SdkPortId(u32);

impl SdkPortId {
    pub const fn new(id: u32) -> Self {
        SdkPortId(id)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the id of the control port paired with this port.
    pub const fn control_port(&self) -> SdkPortId {
        SdkPortId(CONTROL_PORT_BASE + self.0)
    }
}

impl fmt::Display for SdkPortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
