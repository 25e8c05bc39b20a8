//! Device API surface consumed by the chassis manager.
//!
//! - [`port`]: port lifecycle, tunables, state and counters

pub mod port;

pub use port::{DeviceInterface, DevicePortParams, PortCounters, PortStatusEvent};
