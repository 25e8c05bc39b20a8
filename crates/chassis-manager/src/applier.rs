//! Config applier: turns a desired port entry into device calls.
//!
//! [`ConfigApplier::add_port`] programs a port from scratch and
//! [`ConfigApplier::update_port`] diffs a desired entry against the config
//! applied last time, issuing only the calls needed to converge. Both fill in
//! a [`PortConfig`] that reflects the steps that actually completed, even
//! when they fail part way through.

use crate::defaults::{
    DEFAULT_MEMPOOL_NAME, DEFAULT_MTU, DEFAULT_PACKET_DIRECTION, DEFAULT_PIPELINE_NAME,
};
use crate::error::{ChassisError, ChassisResult};
use crate::port_config::{PortApplyState, PortConfig};
use chassis_device::{DeviceInterface, DevicePortParams, SdkPortId, Unit};
use chassis_types::{AdminState, LoopbackState, PacketDirection, PortType, SingletonPort, TriState};
use tracing::{debug, error, info, instrument, warn};

/// Issues device calls for single ports.
pub(crate) struct ConfigApplier<'a> {
    device: &'a dyn DeviceInterface,
}

fn check_admin_state(node_id: u64, port: &SingletonPort, sdk_port_id: SdkPortId) -> ChassisResult<()> {
    match port.config_params.admin_state {
        AdminState::Unknown => Err(ChassisError::invalid_param(format!(
            "Invalid admin state for port {} in node {} (SDK port {})",
            port.id, node_id, sdk_port_id
        ))),
        AdminState::Diag => Err(ChassisError::unimplemented(format!(
            "Unsupported 'diags' admin state for port {} in node {} (SDK port {})",
            port.id, node_id, sdk_port_id
        ))),
        AdminState::Enabled | AdminState::Disabled => Ok(()),
    }
}

/// Builds the creation parameters for a port entry, filling in defaults.
fn device_params(port: &SingletonPort) -> DevicePortParams {
    let params = &port.config_params;
    DevicePortParams {
        port_name: port.name.clone(),
        port_type: params.port_type,
        packet_dir: DEFAULT_PACKET_DIRECTION,
        queues: params.queues,
        mtu: params.explicit_mtu().unwrap_or(DEFAULT_MTU),
        pipeline_name: params
            .pipeline_name
            .clone()
            .unwrap_or_else(|| DEFAULT_PIPELINE_NAME.to_string()),
        mempool_name: params
            .mempool_name
            .clone()
            .unwrap_or_else(|| DEFAULT_MEMPOOL_NAME.to_string()),
        socket_path: params.socket_path.clone(),
        host_name: params.host_name.clone(),
        pci_bdf: params.pci_bdf.clone(),
    }
}

impl<'a> ConfigApplier<'a> {
    pub(crate) fn new(device: &'a dyn DeviceInterface) -> Self {
        Self { device }
    }

    /// Creates and configures a port from scratch.
    ///
    /// `config` is reset first and then records each completed step.
    #[instrument(skip(self, port, config), fields(port_id = port.id, sdk_port = %sdk_port_id))]
    pub(crate) fn add_port(
        &self,
        node_id: u64,
        unit: Unit,
        sdk_port_id: SdkPortId,
        port: &SingletonPort,
        config: &mut PortConfig,
    ) -> ChassisResult<()> {
        *config = PortConfig::default();
        check_admin_state(node_id, port, sdk_port_id)?;

        let params = &port.config_params;
        let dev_params = device_params(port);

        info!(
            "Adding port {} in node {} (SDK port {}) at {} bps",
            port.id, node_id, sdk_port_id, port.speed_bps
        );
        self.device
            .create_port(unit, sdk_port_id, port.speed_bps, &dev_params, params.fec_mode)?;
        config.state = PortApplyState::Disabled;
        config.speed_bps = Some(port.speed_bps);
        config.fec_mode = Some(params.fec_mode);
        config.mtu = Some(dev_params.mtu);
        config.params = dev_params.clone();

        if let Some(control_port) = &params.control_port {
            let control_sdk_port = sdk_port_id.control_port();
            let control_params = DevicePortParams {
                port_name: control_port.clone(),
                port_type: PortType::Tap,
                packet_dir: PacketDirection::Host,
                ..dev_params
            };
            info!(
                "Adding control port {} (SDK port {}) for port {} in node {}",
                control_port, control_sdk_port, port.id, node_id
            );
            self.device.create_port(
                unit,
                control_sdk_port,
                port.speed_bps,
                &control_params,
                params.fec_mode,
            )?;
            config.control_port = Some(control_port.clone());
        }

        if let Some(mtu) = params.explicit_mtu() {
            self.device.set_mtu(unit, sdk_port_id, mtu)?;
        }

        if params.autoneg != TriState::Unknown {
            self.device
                .set_autoneg_policy(unit, sdk_port_id, params.autoneg)?;
        }
        config.autoneg = params.autoneg;

        if params.loopback_mode != LoopbackState::Unknown {
            self.device
                .set_loopback_mode(unit, sdk_port_id, params.loopback_mode)?;
        }
        config.loopback_mode = params.loopback_mode;

        if params.admin_state == AdminState::Enabled {
            info!("Enabling port {} in node {} (SDK port {})", port.id, node_id, sdk_port_id);
            self.device.enable_port(unit, sdk_port_id)?;
            config.state = PortApplyState::Enabled;
        }

        Ok(())
    }

    /// Converges an existing port towards a desired entry.
    ///
    /// `config` starts as a copy of `old` and tracks each applied change.
    #[instrument(skip(self, port, old, config), fields(port_id = port.id, sdk_port = %sdk_port_id))]
    pub(crate) fn update_port(
        &self,
        node_id: u64,
        unit: Unit,
        sdk_port_id: SdkPortId,
        port: &SingletonPort,
        old: &PortConfig,
        config: &mut PortConfig,
    ) -> ChassisResult<()> {
        *config = old.clone();

        if !self.device.port_exists(unit, sdk_port_id) {
            config.mark_broken();
            return Err(ChassisError::internal(format!(
                "Port {} in node {} is not valid (SDK port {})",
                port.id, node_id, sdk_port_id
            )));
        }

        let params = &port.config_params;

        if Some(port.speed_bps) != old.speed_bps {
            return self.change_speed(node_id, unit, sdk_port_id, port, old, config);
        }

        if Some(params.fec_mode) != old.fec_mode {
            return Err(ChassisError::unimplemented(format!(
                "The FEC mode for port {} in node {} has changed; the port must be deleted \
                 and added again (SDK port {})",
                port.id, node_id, sdk_port_id
            )));
        }

        check_admin_state(node_id, port, sdk_port_id)?;

        let mut config_changed = false;

        let mtu = params.explicit_mtu().unwrap_or(DEFAULT_MTU);
        if Some(mtu) != old.mtu {
            debug!("MTU for port {} in node {} changed to {}", port.id, node_id, mtu);
            config.mtu = None;
            self.device.set_mtu(unit, sdk_port_id, mtu)?;
            config.mtu = Some(mtu);
            config_changed = true;
        }

        if params.autoneg != old.autoneg {
            debug!(
                "Autoneg policy for port {} in node {} changed to {}",
                port.id, node_id, params.autoneg
            );
            config.autoneg = TriState::Unknown;
            self.device
                .set_autoneg_policy(unit, sdk_port_id, params.autoneg)?;
            config.autoneg = params.autoneg;
            config_changed = true;
        }

        if params.loopback_mode != old.loopback_mode {
            debug!(
                "Loopback mode for port {} in node {} changed to {}",
                port.id, node_id, params.loopback_mode
            );
            config.loopback_mode = LoopbackState::Unknown;
            self.device
                .set_loopback_mode(unit, sdk_port_id, params.loopback_mode)?;
            config.loopback_mode = params.loopback_mode;
            config_changed = true;
        }

        let was_enabled = old.state == PortApplyState::Enabled;
        let (need_disable, need_enable) = match params.admin_state {
            AdminState::Disabled => (was_enabled, false),
            _ => {
                let need_disable = config_changed && was_enabled;
                (need_disable, need_disable || !was_enabled)
            }
        };

        if need_disable {
            info!("Disabling port {} in node {} (SDK port {})", port.id, node_id, sdk_port_id);
            self.device.disable_port(unit, sdk_port_id)?;
            config.state = PortApplyState::Disabled;
        }
        if need_enable {
            info!("Enabling port {} in node {} (SDK port {})", port.id, node_id, sdk_port_id);
            self.device.enable_port(unit, sdk_port_id)?;
            config.state = PortApplyState::Enabled;
        }

        Ok(())
    }

    /// Speed changes need the port deleted and added again.
    ///
    /// If the re-add fails the old config is restored on a best-effort basis
    /// and an invalid-parameter error is returned either way.
    fn change_speed(
        &self,
        node_id: u64,
        unit: Unit,
        sdk_port_id: SdkPortId,
        port: &SingletonPort,
        old: &PortConfig,
        config: &mut PortConfig,
    ) -> ChassisResult<()> {
        info!(
            "Speed of port {} in node {} changed to {} bps, re-creating (SDK port {})",
            port.id, node_id, port.speed_bps, sdk_port_id
        );
        self.device.disable_port(unit, sdk_port_id)?;
        self.delete_port(unit, sdk_port_id, old)?;

        let err = match self.add_port(node_id, unit, sdk_port_id, port, config) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        warn!(
            "Could not add port {} in node {} with new speed: {}; restoring old config",
            port.id, node_id, err
        );
        self.remove_stale_port(unit, sdk_port_id);

        match old.to_singleton_port(port.id, node_id, port.port_key()) {
            Some(port_old) => {
                if let Err(rollback_err) =
                    self.add_port(node_id, unit, sdk_port_id, &port_old, config)
                {
                    error!(
                        "Failed to restore port {} in node {} with its old config: {}",
                        port.id, node_id, rollback_err
                    );
                }
            }
            None => error!(
                "Cannot restore port {} in node {}: old config has no speed",
                port.id, node_id
            ),
        }

        Err(ChassisError::invalid_param(format!(
            "Could not add port {} with new speed {} to the device (SDK port {}): {}",
            port.id, port.speed_bps, sdk_port_id, err
        )))
    }

    /// Deletes a port along with its control port, if it has one.
    pub(crate) fn delete_port(
        &self,
        unit: Unit,
        sdk_port_id: SdkPortId,
        config: &PortConfig,
    ) -> ChassisResult<()> {
        self.device.delete_port(unit, sdk_port_id)?;
        if config.control_port.is_some() {
            self.device.delete_port(unit, sdk_port_id.control_port())?;
        }
        Ok(())
    }

    /// Deletes whatever is left of a port, ignoring failures.
    pub(crate) fn remove_stale_port(&self, unit: Unit, sdk_port_id: SdkPortId) {
        for sdk_port in [sdk_port_id, sdk_port_id.control_port()] {
            if self.device.port_exists(unit, sdk_port) {
                if let Err(err) = self.device.delete_port(unit, sdk_port) {
                    warn!("Ignoring failure to delete stale SDK port {}: {}", sdk_port, err);
                }
            }
        }
    }
}
