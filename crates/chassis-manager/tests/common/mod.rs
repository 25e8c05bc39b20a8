//! Shared fixtures for chassis manager integration tests.
#![allow(dead_code)]

use chassis_device::{DeviceOp, SimDevice};
use chassis_manager::ChassisManager;
use chassis_types::{
    AdminState, Chassis, ChassisConfig, Node, Platform, PortKey, SingletonPort,
};
use std::sync::Arc;

pub const NODE_ID: u64 = 7654321;
pub const SPEED_25G: u64 = 25_000_000_000;
pub const SPEED_100G: u64 = 100_000_000_000;

pub fn setup() -> (Arc<SimDevice>, ChassisManager) {
    let device = Arc::new(SimDevice::new(16));
    let manager = ChassisManager::new(device.clone());
    (device, manager)
}

/// A port on `NODE_ID` whose front-panel port number equals its id.
pub fn port(id: u32, admin_state: AdminState) -> SingletonPort {
    SingletonPort::new(id, NODE_ID, PortKey::new(1, id as i32, 0), SPEED_25G)
        .with_admin_state(admin_state)
        .with_name(format!("port-{}", id))
}

pub fn config(ports: Vec<SingletonPort>) -> ChassisConfig {
    ChassisConfig {
        description: "test chassis".to_string(),
        chassis: Some(Chassis {
            platform: Platform::P4SoftSwitch,
            name: "sim".to_string(),
        }),
        nodes: vec![Node::new(NODE_ID, 1)],
        singleton_ports: ports,
        ..Default::default()
    }
}

/// Verifies and pushes under one write lock, then clears recorded calls.
pub fn push(device: &SimDevice, manager: &ChassisManager, config: &ChassisConfig) {
    let mut chassis = manager.lock_write();
    chassis.verify_chassis_config(config).unwrap();
    chassis.push_chassis_config(config).unwrap();
    device.clear_calls();
}

pub fn mutating_ops(device: &SimDevice) -> Vec<DeviceOp> {
    device.mutating_calls().iter().map(|c| c.op).collect()
}
