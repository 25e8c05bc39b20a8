//! Device interface for programming switch ports.
//!
//! This crate defines the boundary between the chassis manager and the
//! data-plane backend that actually creates, deletes and toggles ports.
//!
//! # Architecture
//!
//! - [`types`]: strongly-typed unit and SDK port identifiers
//! - [`error`]: device error types and status handling
//! - [`api`]: the [`DeviceInterface`] trait and its parameter/counter types
//! - [`sim`]: [`SimDevice`], an in-memory software switch used by the daemon
//!   and by tests
//!
//! # Example
//!
//! ```
//! use chassis_device::{DeviceInterface, DevicePortParams, SimDevice, Unit};
//! use chassis_types::{FecMode, PortKey};
//!
//! let device = SimDevice::new(8);
//! let unit = Unit::new(0);
//! let port = device.resolve_port_key(unit, &PortKey::new(1, 1, 0)).unwrap();
//! device
//!     .create_port(unit, port, 100_000_000_000, &DevicePortParams::default(), FecMode::Off)
//!     .unwrap();
//! assert!(device.port_exists(unit, port));
//! ```

pub mod api;
pub mod error;
pub mod sim;
pub mod types;

pub use api::{DeviceInterface, DevicePortParams, PortCounters, PortStatusEvent};
pub use error::{DeviceError, DeviceResult, DeviceStatus};
pub use sim::{DeviceCall, DeviceOp, FailureRule, SimDevice};
pub use types::{SdkPortId, Unit, CONTROL_PORT_BASE};
