//! Applied per-port configuration.
//!
//! A [`PortConfig`] records what was actually programmed on the device for a
//! port, which may differ from what was requested if a push or replay failed
//! part way through.

use chassis_device::DevicePortParams;
use chassis_types::{
    AdminState, FecMode, LoopbackState, PortConfigParams, PortKey, SingletonPort, TriState,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State a port actually reached on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortApplyState {
    /// The port was never created successfully.
    #[default]
    NotConfigured,
    /// The port was created once but is no longer usable (vanished from the
    /// device or failed to replay).
    Broken,
    Disabled,
    Enabled,
}

impl PortApplyState {
    /// Returns true if the port exists with known settings.
    ///
    /// Ports that are not configured are deleted and re-added on the next push.
    pub const fn is_configured(&self) -> bool {
        matches!(self, PortApplyState::Disabled | PortApplyState::Enabled)
    }

    /// Admin state as reported to controllers.
    pub const fn admin_state(&self) -> AdminState {
        match self {
            PortApplyState::Enabled => AdminState::Enabled,
            PortApplyState::Disabled => AdminState::Disabled,
            PortApplyState::NotConfigured | PortApplyState::Broken => AdminState::Unknown,
        }
    }
}

impl fmt::Display for PortApplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortApplyState::NotConfigured => "not_configured",
            PortApplyState::Broken => "broken",
            PortApplyState::Disabled => "disabled",
            PortApplyState::Enabled => "enabled",
        };
        write!(f, "{}", s)
    }
}

/// Configuration applied to one port.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortConfig {
    pub state: PortApplyState,
    pub speed_bps: Option<u64>,
    pub fec_mode: Option<FecMode>,
    /// Resolved MTU; the default is filled in when the entry left it unset.
    pub mtu: Option<u32>,
    pub autoneg: TriState,
    pub loopback_mode: LoopbackState,
    /// Parameters the port was created with.
    pub params: DevicePortParams,
    /// Name of the TAP control port created with this port, if any.
    pub control_port: Option<String>,
}

impl PortConfig {
    /// Rebuilds a port entry that recreates this config when added.
    ///
    /// Returns `None` if the port never reached a speed and FEC mode.
    pub fn to_singleton_port(&self, id: u32, node: u64, key: PortKey) -> Option<SingletonPort> {
        let speed_bps = self.speed_bps?;
        let fec_mode = self.fec_mode?;

        let mut port = SingletonPort::new(id, node, key, speed_bps).with_name(&self.params.port_name);
        port.config_params = PortConfigParams {
            admin_state: self.state.admin_state(),
            fec_mode,
            mtu: self.mtu,
            autoneg: self.autoneg,
            loopback_mode: self.loopback_mode,
            port_type: self.params.port_type,
            pipeline_name: Some(self.params.pipeline_name.clone()),
            mempool_name: Some(self.params.mempool_name.clone()),
            control_port: self.control_port.clone(),
            queues: self.params.queues,
            socket_path: self.params.socket_path.clone(),
            host_name: self.params.host_name.clone(),
            pci_bdf: self.params.pci_bdf.clone(),
        };
        Some(port)
    }

    /// Marks the port unusable and forgets its speed and FEC mode.
    pub fn mark_broken(&mut self) {
        self.state = PortApplyState::Broken;
        self.speed_bps = None;
        self.fec_mode = None;
    }
}
