//! chassisd - chassis manager daemon.
//!
//! Loads a chassis config from disk, verifies it and pushes it to the
//! device through [`chassis_manager::ChassisManager`], then keeps the
//! manager's port state current from device events until shut down.

pub mod config;
pub mod daemon;

pub use config::{load_chassis_config, parse_chassis_config, ConfigFormat, DaemonConfig};
pub use daemon::{ChassisDaemon, PortStatus};
