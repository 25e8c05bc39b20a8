//! Chassis config verification.
//!
//! Verification never touches device state beyond resolving port keys. It
//! rejects structurally invalid configs and, once the switch is running,
//! reports configs that would change the port layout as reboot-required.

use crate::defaults::{CPU_PORT_ID, MAX_MTU};
use crate::error::{ChassisError, ChassisResult};
use crate::generation::{Generation, PortRef};
use chassis_device::{DeviceInterface, Unit};
use chassis_types::{ChassisConfig, Platform, PortKey};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Assigns units to nodes in declaration order.
pub(crate) fn assign_units(config: &ChassisConfig) -> BTreeMap<u64, Unit> {
    config
        .nodes
        .iter()
        .zip(0u32..)
        .map(|(node, unit)| (node.id, Unit::new(unit)))
        .collect()
}

fn check(condition: bool, message: impl FnOnce() -> String) -> ChassisResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ChassisError::invalid_param(message()))
    }
}

/// Verifies `config` against the device and, if given, the live generation.
pub(crate) fn verify_chassis_config(
    config: &ChassisConfig,
    device: &dyn DeviceInterface,
    live: Option<&Generation>,
) -> ChassisResult<()> {
    check(config.trunk_ports.is_empty(), || {
        "Trunk ports are not supported".to_string()
    })?;
    check(config.port_groups.is_empty(), || {
        "Port groups are not supported".to_string()
    })?;
    check(!config.nodes.is_empty(), || {
        "The config must contain at least one node".to_string()
    })?;
    match config.platform() {
        Platform::GenericBarefootTofino
        | Platform::GenericBarefootTofino2
        | Platform::P4SoftSwitch => {}
        Platform::Unknown => {
            return Err(ChassisError::invalid_param(
                "Config needs a chassis entry with a supported platform",
            ))
        }
        other => {
            return Err(ChassisError::invalid_param(format!(
                "Unsupported platform: {}",
                other
            )))
        }
    }

    let mut node_ids = BTreeSet::new();
    for node in &config.nodes {
        check(node.slot > 0, || format!("No positive slot in {}", node))?;
        check(node.id > 0, || format!("No positive ID in {}", node))?;
        check(node_ids.insert(node.id), || {
            format!("The id for {} was already recorded for another node", node)
        })?;
    }
    let node_id_to_unit = assign_units(config);

    let mut port_keys = BTreeSet::new();
    let mut port_ids: BTreeSet<PortRef> = BTreeSet::new();
    for port in &config.singleton_ports {
        check(port.id != CPU_PORT_ID, || {
            format!("{} has the reserved CPU port ID ({})", port, CPU_PORT_ID)
        })?;
        check(port.slot > 0, || format!("No valid slot in {}", port))?;
        check(port.port > 0, || format!("No valid port in {}", port))?;
        check(port.speed_bps > 0, || format!("No valid speed_bps in {}", port))?;
        check(port_keys.insert(port.port_key()), || {
            format!(
                "The (slot, port, channel) tuple for {} was already recorded for another port",
                port
            )
        })?;
        check(port.node > 0, || format!("No valid node ID in {}", port))?;
        check(node_id_to_unit.contains_key(&port.node), || {
            format!("Node ID {} given for {} has not been given to any node", port.node, port)
        })?;
        check(port_ids.insert(PortRef::new(port.node, port.id)), || {
            format!(
                "The id for {} was already recorded for another port on node {}",
                port, port.node
            )
        })?;
        if let Some(mtu) = port.config_params.explicit_mtu() {
            check(mtu <= MAX_MTU, || {
                format!("MTU {} of {} exceeds the maximum of {}", mtu, port, MAX_MTU)
            })?;
        }
    }

    let mut layout: BTreeMap<PortRef, PortKey> = BTreeMap::new();
    for port in &config.singleton_ports {
        let key = port.port_key();
        layout.insert(PortRef::new(port.node, port.id), key);

        let unit = node_id_to_unit.get(&port.node).copied().ok_or_else(|| {
            ChassisError::internal(format!("Node {} not found for port {}", port.node, port.id))
        })?;
        let sdk_port_id = device.resolve_port_key(unit, &key)?;
        debug!("Verified port {} resolves to SDK port {}", port.id, sdk_port_id);
    }

    if let Some(live) = live {
        if layout != live.port_layout() {
            return Err(ChassisError::reboot_required(
                "The switch is already initialized, but the pushed config changes the port \
                 layout; the stack needs to be rebooted to finish config push",
            ));
        }
        if &node_id_to_unit != live.node_id_to_unit() {
            return Err(ChassisError::reboot_required(
                "The switch is already initialized, but the pushed config changes the node to \
                 unit mapping; the stack needs to be rebooted to finish config push",
            ));
        }
    }

    Ok(())
}
