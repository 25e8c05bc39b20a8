//! Chassis port config reconciliation engine.
//!
//! The [`ChassisManager`] accepts a declarative [`ChassisConfig`], diffs it
//! against the configuration applied last time and drives a
//! [`DeviceInterface`] until the device matches. Each difference is either
//! patched live, applied by deleting and re-adding the port, rejected as
//! unsupported, or reported as needing a reboot.
//!
//! # Architecture
//!
//! - [`manager`]: the orchestrator, its lock guards, replay and shutdown
//! - [`verify`](ChassisWriteGuard::verify_chassis_config): config validation
//! - [`generation`]: the snapshot of applied state swapped in by each push
//! - [`port_config`]: what was actually applied to each port
//! - [`query`]: cached and live queries, including [`DataRequest`] dispatch
//! - [`events`]: port state change notifications
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chassis_device::SimDevice;
//! use chassis_manager::{ChassisManager, ChassisQueries};
//! use chassis_types::{AdminState, Chassis, ChassisConfig, Node, Platform, PortKey, SingletonPort};
//!
//! let manager = ChassisManager::new(Arc::new(SimDevice::new(8)));
//! let config = ChassisConfig {
//!     chassis: Some(Chassis { platform: Platform::P4SoftSwitch, name: "sim".into() }),
//!     nodes: vec![Node::new(1, 1)],
//!     singleton_ports: vec![SingletonPort::new(1, 1, PortKey::new(1, 1, 0), 10_000_000_000)
//!         .with_admin_state(AdminState::Enabled)],
//!     ..Default::default()
//! };
//!
//! let mut chassis = manager.lock_write();
//! chassis.verify_chassis_config(&config).unwrap();
//! chassis.push_chassis_config(&config).unwrap();
//! assert_eq!(chassis.get_port_config(1, 1).unwrap().speed_bps, Some(10_000_000_000));
//! ```
//!
//! [`ChassisConfig`]: chassis_types::ChassisConfig
//! [`DeviceInterface`]: chassis_device::DeviceInterface

mod applier;
pub mod data;
pub mod defaults;
pub mod error;
pub mod events;
pub mod generation;
pub mod manager;
pub mod port_config;
pub mod query;
mod verify;

pub use data::{DataRequest, DataResponse, FrontPanelPortInfo, HealthState, TrunkMemberBlockState};
pub use error::{ChassisError, ChassisResult, ErrorCode};
pub use events::{ChassisEvent, EventWriter};
pub use generation::{Generation, PortRecord, PortRef};
pub use manager::{ChassisManager, ChassisReadGuard, ChassisWriteGuard};
pub use port_config::{PortApplyState, PortConfig};
pub use query::ChassisQueries;
