//! In-memory software switch backend.
//!
//! [`SimDevice`] implements [`DeviceInterface`] without any hardware. It keeps
//! per-port state, records every call it receives and can be told to fail
//! selected operations. Enabling or disabling a port moves its link state and
//! publishes a [`PortStatusEvent`] to the subscriber, if any.
//!
//! An unchannelized key (channel 0) resolves to `(port - 1) * 4`. A channelized
//! key resolves to `512 + (port - 1) * 4 + (channel - 1)`, so the two forms of
//! one front-panel port never share an SDK port id, and neither collides with
//! the other's control port.

use crate::api::{DeviceInterface, DevicePortParams, PortCounters, PortStatusEvent};
use crate::error::{DeviceError, DeviceResult, DeviceStatus};
use crate::types::{SdkPortId, Unit, CONTROL_PORT_BASE};
use chassis_types::{FecMode, LoopbackState, PortKey, PortState, TriState};
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

const CHANNELS_PER_PORT: u32 = 4;

/// First SDK port id of channelized ports, above the control ports of unchannelized ones.
const CHANNELIZED_BASE: u32 = 2 * CONTROL_PORT_BASE;

/// Largest front-panel port count; keeps data ports below the control port range.
pub const MAX_SIM_PORTS: u32 = 64;

/// Operation kinds recorded by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOp {
    ResolvePortKey,
    PortExists,
    CreatePort,
    DeletePort,
    EnablePort,
    DisablePort,
    SetAutoneg,
    SetLoopback,
    SetMtu,
    GetPortState,
    GetPortCounters,
    ChipType,
}

impl DeviceOp {
    /// Returns true for operations that change backend state.
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            DeviceOp::CreatePort
                | DeviceOp::DeletePort
                | DeviceOp::EnablePort
                | DeviceOp::DisablePort
                | DeviceOp::SetAutoneg
                | DeviceOp::SetLoopback
                | DeviceOp::SetMtu
        )
    }
}

impl fmt::Display for DeviceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceOp::ResolvePortKey => "resolve_port_key",
            DeviceOp::PortExists => "port_exists",
            DeviceOp::CreatePort => "create_port",
            DeviceOp::DeletePort => "delete_port",
            DeviceOp::EnablePort => "enable_port",
            DeviceOp::DisablePort => "disable_port",
            DeviceOp::SetAutoneg => "set_autoneg_policy",
            DeviceOp::SetLoopback => "set_loopback_mode",
            DeviceOp::SetMtu => "set_mtu",
            DeviceOp::GetPortState => "get_port_state",
            DeviceOp::GetPortCounters => "get_port_counters",
            DeviceOp::ChipType => "chip_type",
        };
        write!(f, "{}", s)
    }
}

/// One call received by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCall {
    pub op: DeviceOp,
    pub unit: Unit,
    pub port: Option<SdkPortId>,
    /// Operation argument rendered as text (speed, MTU, mode...).
    pub detail: String,
}

/// Makes matching operations fail, by default with a hardware error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRule {
    op: DeviceOp,
    port: Option<SdkPortId>,
    remaining: Option<u32>,
    status: DeviceStatus,
}

impl FailureRule {
    /// Fails every call of `op` until cleared.
    pub fn on(op: DeviceOp) -> Self {
        Self {
            op,
            port: None,
            remaining: None,
            status: DeviceStatus::HwFailure,
        }
    }

    /// Restricts the rule to one port.
    pub fn for_port(mut self, port: SdkPortId) -> Self {
        self.port = Some(port);
        self
    }

    /// Fails only the next `count` matching calls.
    pub fn times(mut self, count: u32) -> Self {
        self.remaining = Some(count);
        self
    }

    /// Reports `status` instead of a hardware error.
    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    fn matches(&self, op: DeviceOp, port: Option<SdkPortId>) -> bool {
        self.op == op && (self.port.is_none() || self.port == port)
    }
}

#[derive(Debug, Clone)]
struct SimPort {
    speed_bps: u64,
    fec_mode: FecMode,
    params: DevicePortParams,
    enabled: bool,
    state: PortState,
    mtu: u32,
    autoneg: TriState,
    loopback: LoopbackState,
    counters: PortCounters,
}

#[derive(Default)]
struct SimState {
    ports: BTreeMap<(Unit, SdkPortId), SimPort>,
    calls: Vec<DeviceCall>,
    failures: Vec<FailureRule>,
}

impl SimState {
    fn record(&mut self, op: DeviceOp, unit: Unit, port: Option<SdkPortId>, detail: String) {
        self.calls.push(DeviceCall {
            op,
            unit,
            port,
            detail,
        });
    }

    fn check_failure(&mut self, op: DeviceOp, port: Option<SdkPortId>) -> DeviceResult<()> {
        let Some(idx) = self.failures.iter().position(|r| r.matches(op, port)) else {
            return Ok(());
        };

        let status = self.failures[idx].status;
        if let Some(remaining) = self.failures[idx].remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.failures.remove(idx);
            }
        }

        debug!(%op, ?port, %status, "Injected device failure");
        let context = match port {
            Some(port) => format!("{} on port {}", op, port),
            None => op.to_string(),
        };
        Err(DeviceError::from_status(status, context))
    }

    fn port_mut(&mut self, unit: Unit, port: SdkPortId) -> DeviceResult<&mut SimPort> {
        self.ports
            .get_mut(&(unit, port))
            .ok_or_else(|| DeviceError::not_found(format!("port {} on unit {}", port, unit)))
    }
}

/// Simulated data-plane backend.
pub struct SimDevice {
    port_count: u32,
    chip_type: String,
    state: Mutex<SimState>,
    events: Mutex<Option<mpsc::UnboundedSender<PortStatusEvent>>>,
}

impl SimDevice {
    /// Creates a simulator exposing `port_count` front-panel ports per unit.
    pub fn new(port_count: u32) -> Self {
        Self {
            port_count: port_count.min(MAX_SIM_PORTS),
            chip_type: "SIMULATED".to_string(),
            state: Mutex::new(SimState::default()),
            events: Mutex::new(None),
        }
    }

    pub fn with_chip_type(mut self, chip_type: impl Into<String>) -> Self {
        self.chip_type = chip_type.into();
        self
    }

    /// Returns a receiver for link state changes. Replaces any earlier subscriber.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PortStatusEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock() = Some(tx);
        rx
    }

    pub fn inject_failure(&self, rule: FailureRule) {
        self.state.lock().failures.push(rule);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().calls.clone()
    }

    /// Returns only calls that change backend state.
    pub fn mutating_calls(&self) -> Vec<DeviceCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op.is_mutating())
            .cloned()
            .collect()
    }

    /// Counts received calls of one kind.
    pub fn count(&self, op: DeviceOp) -> usize {
        self.state.lock().calls.iter().filter(|c| c.op == op).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Drops every created port, as a device restart would.
    pub fn reset(&self) {
        self.state.lock().ports.clear();
    }

    pub fn created_ports(&self, unit: Unit) -> Vec<SdkPortId> {
        self.state
            .lock()
            .ports
            .keys()
            .filter(|(u, _)| *u == unit)
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn is_enabled(&self, unit: Unit, port: SdkPortId) -> bool {
        self.state
            .lock()
            .ports
            .get(&(unit, port))
            .is_some_and(|p| p.enabled)
    }

    /// Returns the MTU programmed on a port, if it exists.
    pub fn port_mtu(&self, unit: Unit, port: SdkPortId) -> Option<u32> {
        self.state.lock().ports.get(&(unit, port)).map(|p| p.mtu)
    }

    /// Returns the creation parameters of a port, if it exists.
    pub fn port_params(&self, unit: Unit, port: SdkPortId) -> Option<DevicePortParams> {
        self.state
            .lock()
            .ports
            .get(&(unit, port))
            .map(|p| p.params.clone())
    }

    /// Returns `(speed_bps, fec_mode)` of a port, if it exists.
    pub fn port_speed(&self, unit: Unit, port: SdkPortId) -> Option<(u64, FecMode)> {
        self.state
            .lock()
            .ports
            .get(&(unit, port))
            .map(|p| (p.speed_bps, p.fec_mode))
    }

    pub fn set_port_counters(&self, unit: Unit, port: SdkPortId, counters: PortCounters) {
        if let Some(p) = self.state.lock().ports.get_mut(&(unit, port)) {
            p.counters = counters;
        }
    }

    /// Forces the link state of a port, e.g. to simulate a cable pull.
    pub fn set_link_state(&self, unit: Unit, port: SdkPortId, state: PortState) {
        let changed = match self.state.lock().ports.get_mut(&(unit, port)) {
            Some(p) if p.state != state => {
                p.state = state;
                true
            }
            _ => false,
        };
        if changed {
            self.publish(unit, port, state);
        }
    }

    fn publish(&self, unit: Unit, port: SdkPortId, state: PortState) {
        if let Some(tx) = self.events.lock().as_ref() {
            let event = PortStatusEvent {
                unit,
                sdk_port_id: port,
                state,
                time_last_changed: Utc::now(),
            };
            if tx.send(event).is_err() {
                debug!(%unit, %port, "Port status subscriber dropped");
            }
        }
    }

    fn set_enabled(&self, op: DeviceOp, unit: Unit, port: SdkPortId, enable: bool) -> DeviceResult<()> {
        let new_state = if enable { PortState::Up } else { PortState::Down };
        let changed = {
            let mut st = self.state.lock();
            st.record(op, unit, Some(port), String::new());
            st.check_failure(op, Some(port))?;
            let p = st.port_mut(unit, port)?;
            p.enabled = enable;
            let changed = p.state != new_state;
            p.state = new_state;
            changed
        };
        if changed {
            self.publish(unit, port, new_state);
        }
        Ok(())
    }
}

impl Default for SimDevice {
    fn default() -> Self {
        Self::new(MAX_SIM_PORTS)
    }
}

impl DeviceInterface for SimDevice {
    fn resolve_port_key(&self, unit: Unit, key: &PortKey) -> DeviceResult<SdkPortId> {
        let mut st = self.state.lock();
        st.record(DeviceOp::ResolvePortKey, unit, None, key.to_string());
        st.check_failure(DeviceOp::ResolvePortKey, None)?;

        if key.slot <= 0 {
            return Err(DeviceError::invalid_parameter(format!("invalid slot in {}", key)));
        }
        let port = u32::try_from(key.port)
            .ok()
            .filter(|p| (1..=self.port_count).contains(p))
            .ok_or_else(|| DeviceError::not_found(format!("port key {}", key)))?;
        let base = (port - 1) * CHANNELS_PER_PORT;
        match key.channel {
            0 => Ok(SdkPortId::new(base)),
            c if c < 0 => Err(DeviceError::invalid_parameter(format!(
                "channel must be set for {}",
                key
            ))),
            c => {
                let channel = u32::try_from(c - 1)
                    .ok()
                    .filter(|ch| *ch < CHANNELS_PER_PORT)
                    .ok_or_else(|| DeviceError::not_found(format!("port key {}", key)))?;
                Ok(SdkPortId::new(CHANNELIZED_BASE + base + channel))
            }
        }
    }

    fn port_exists(&self, unit: Unit, port: SdkPortId) -> bool {
        let mut st = self.state.lock();
        st.record(DeviceOp::PortExists, unit, Some(port), String::new());
        st.ports.contains_key(&(unit, port))
    }

    fn create_port(
        &self,
        unit: Unit,
        port: SdkPortId,
        speed_bps: u64,
        params: &DevicePortParams,
        fec_mode: FecMode,
    ) -> DeviceResult<()> {
        let mut st = self.state.lock();
        st.record(
            DeviceOp::CreatePort,
            unit,
            Some(port),
            format!("speed_bps={} fec={} type={}", speed_bps, fec_mode, params.port_type),
        );
        st.check_failure(DeviceOp::CreatePort, Some(port))?;

        if st.ports.contains_key(&(unit, port)) {
            return Err(DeviceError::already_exists(format!("port {} on unit {}", port, unit)));
        }
        st.ports.insert(
            (unit, port),
            SimPort {
                speed_bps,
                fec_mode,
                params: params.clone(),
                enabled: false,
                state: PortState::Down,
                mtu: params.mtu,
                autoneg: TriState::Unknown,
                loopback: LoopbackState::Unknown,
                counters: PortCounters::default(),
            },
        );
        debug!(%unit, %port, speed_bps, "Simulated port created");
        Ok(())
    }

    fn delete_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()> {
        let mut st = self.state.lock();
        st.record(DeviceOp::DeletePort, unit, Some(port), String::new());
        st.check_failure(DeviceOp::DeletePort, Some(port))?;
        st.ports
            .remove(&(unit, port))
            .map(|_| ())
            .ok_or_else(|| DeviceError::not_found(format!("port {} on unit {}", port, unit)))
    }

    fn enable_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()> {
        self.set_enabled(DeviceOp::EnablePort, unit, port, true)
    }

    fn disable_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()> {
        self.set_enabled(DeviceOp::DisablePort, unit, port, false)
    }

    fn set_autoneg_policy(
        &self,
        unit: Unit,
        port: SdkPortId,
        autoneg: TriState,
    ) -> DeviceResult<()> {
        let mut st = self.state.lock();
        st.record(DeviceOp::SetAutoneg, unit, Some(port), autoneg.to_string());
        st.check_failure(DeviceOp::SetAutoneg, Some(port))?;
        st.port_mut(unit, port)?.autoneg = autoneg;
        Ok(())
    }

    fn set_loopback_mode(
        &self,
        unit: Unit,
        port: SdkPortId,
        mode: LoopbackState,
    ) -> DeviceResult<()> {
        let mut st = self.state.lock();
        st.record(DeviceOp::SetLoopback, unit, Some(port), mode.to_string());
        st.check_failure(DeviceOp::SetLoopback, Some(port))?;
        st.port_mut(unit, port)?.loopback = mode;
        Ok(())
    }

    fn set_mtu(&self, unit: Unit, port: SdkPortId, mtu: u32) -> DeviceResult<()> {
        let mut st = self.state.lock();
        st.record(DeviceOp::SetMtu, unit, Some(port), mtu.to_string());
        st.check_failure(DeviceOp::SetMtu, Some(port))?;
        st.port_mut(unit, port)?.mtu = mtu;
        Ok(())
    }

    fn get_port_state(&self, unit: Unit, port: SdkPortId) -> DeviceResult<PortState> {
        let mut st = self.state.lock();
        st.record(DeviceOp::GetPortState, unit, Some(port), String::new());
        st.check_failure(DeviceOp::GetPortState, Some(port))?;
        Ok(st.port_mut(unit, port)?.state)
    }

    fn get_port_counters(&self, unit: Unit, port: SdkPortId) -> DeviceResult<PortCounters> {
        let mut st = self.state.lock();
        st.record(DeviceOp::GetPortCounters, unit, Some(port), String::new());
        st.check_failure(DeviceOp::GetPortCounters, Some(port))?;
        Ok(st.port_mut(unit, port)?.counters)
    }

    fn chip_type(&self, unit: Unit) -> DeviceResult<String> {
        let mut st = self.state.lock();
        st.record(DeviceOp::ChipType, unit, None, String::new());
        Ok(self.chip_type.clone())
    }
}
