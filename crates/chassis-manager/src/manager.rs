//! ChassisManager - owner of all node and port state.
//!
//! # Locking
//!
//! One reader/writer lock (the chassis lock) protects the live generation.
//! Push and verify are only available on [`ChassisWriteGuard`], obtained from
//! [`ChassisManager::lock_write`]; queries are available on both guards via
//! [`ChassisQueries`]. Replay, shutdown and port status event handling take
//! the lock themselves. The event writer slot has its own lock, which is
//! never held together with the chassis lock; event writers run after the
//! chassis lock is released.
//!
//! # Push
//!
//! ```text
//! ChassisConfig
//!      │
//!      ├─ assign units (declaration order)
//!      ├─ resolve SDK port ids ──────────> DeviceInterface
//!      ├─ add / re-add / update ports ───> ConfigApplier ──> DeviceInterface
//!      ├─ delete ports no longer declared
//!      ▼
//! new Generation ── swapped in only if every step succeeded
//! ```

use crate::applier::ConfigApplier;
use crate::error::{ChassisError, ChassisResult};
use crate::events::{ChassisEvent, EventWriter};
use crate::generation::{Generation, PortRecord, PortRef};
use crate::port_config::{PortApplyState, PortConfig};
use crate::query::ChassisQueries;
use crate::verify;
use chassis_device::{DeviceInterface, PortStatusEvent, Unit};
use chassis_types::ChassisConfig;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default)]
struct ChassisState {
    initialized: bool,
    generation: Arc<Generation>,
}

impl ChassisState {
    fn live(&self) -> Option<&Generation> {
        self.initialized.then_some(self.generation.as_ref())
    }
}

/// Reconciles device port state against pushed chassis configs.
pub struct ChassisManager {
    device: Arc<dyn DeviceInterface>,
    state: RwLock<ChassisState>,
    event_writer: Mutex<Option<Arc<dyn EventWriter>>>,
}

impl ChassisManager {
    pub fn new(device: Arc<dyn DeviceInterface>) -> Self {
        Self {
            device,
            state: RwLock::new(ChassisState::default()),
            event_writer: Mutex::new(None),
        }
    }

    /// Takes the chassis lock for reading.
    pub fn lock_read(&self) -> ChassisReadGuard<'_> {
        ChassisReadGuard {
            device: self.device.as_ref(),
            state: self.state.read(),
        }
    }

    /// Takes the chassis lock for writing.
    pub fn lock_write(&self) -> ChassisWriteGuard<'_> {
        ChassisWriteGuard {
            device: self.device.as_ref(),
            state: self.state.write(),
        }
    }

    pub fn register_event_notify_writer(&self, writer: Arc<dyn EventWriter>) {
        *self.event_writer.lock() = Some(writer);
    }

    pub fn unregister_event_notify_writer(&self) {
        *self.event_writer.lock() = None;
    }

    /// Re-issues the applied config of every port on `node_id`.
    ///
    /// Used after the device lost its state. Ports that were never configured
    /// are skipped. Every remaining port is attempted; ports that fail are
    /// marked broken so the next push re-creates them, and all failures are
    /// returned together.
    #[instrument(skip(self))]
    pub fn replay_ports_config(&self, node_id: u64) -> ChassisResult<()> {
        let mut state = self.state.write();
        if !state.initialized {
            return Err(ChassisError::NotInitialized);
        }
        let generation = Arc::make_mut(&mut state.generation);
        let unit = generation
            .unit(node_id)
            .ok_or_else(|| ChassisError::not_found(format!("Node {}", node_id)))?;

        info!("Replaying ports for node {}", node_id);
        let applier = ConfigApplier::new(self.device.as_ref());
        let mut failures = Vec::new();
        let mut replayed = 0usize;

        for (port_ref, record) in generation.node_ports_mut(node_id) {
            record.reset_state();

            if !record.config.state.is_configured() {
                warn!(
                    "{} was not configured properly ({}), so skipping replay",
                    port_ref, record.config.state
                );
                continue;
            }

            match replay_port(&applier, unit, port_ref, record) {
                Ok(()) => replayed += 1,
                Err(err) => {
                    warn!("Failed to replay {}: {}", port_ref, err);
                    record.config.state = PortApplyState::Broken;
                    failures.push(err);
                }
            }
        }

        info!(
            "Replayed {} port(s) for node {}, {} failure(s)",
            replayed,
            node_id,
            failures.len()
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ChassisError::Replay { node_id, failures })
        }
    }

    /// Clears all state. Calling it again is a no-op.
    pub fn shutdown(&self) -> ChassisResult<()> {
        let mut state = self.state.write();
        if !state.initialized {
            return Ok(());
        }
        state.initialized = false;
        state.generation = Arc::new(Generation::default());
        info!("Chassis manager shut down");
        Ok(())
    }

    /// Records a link state change reported by the device and forwards it to
    /// the registered event writer.
    ///
    /// Returns false if the event does not belong to a known port.
    pub fn handle_port_status_event(&self, event: &PortStatusEvent) -> bool {
        let Some(notification) = self.record_port_status(event) else {
            return false;
        };

        let writer = self.event_writer.lock().clone();
        if let Some(writer) = writer {
            if !writer.write(notification) {
                warn!(
                    "Event writer rejected port state event for SDK port {}",
                    event.sdk_port_id
                );
            }
        }
        true
    }

    fn record_port_status(&self, event: &PortStatusEvent) -> Option<ChassisEvent> {
        let mut state = self.state.write();
        if !state.initialized {
            debug!("Ignoring port status event before first push");
            return None;
        }
        let generation = Arc::make_mut(&mut state.generation);
        let Some(node_id) = generation.node_id(event.unit) else {
            debug!("Ignoring port status event for unknown unit {}", event.unit);
            return None;
        };
        let Some(port_id) = generation.port_id_for_sdk_port(node_id, event.sdk_port_id) else {
            debug!(
                "Ignoring port status event for unknown SDK port {} in node {}",
                event.sdk_port_id, node_id
            );
            return None;
        };
        let record = generation.port_mut(&PortRef::new(node_id, port_id))?;
        record.state = event.state;
        record.time_last_changed = event.time_last_changed;
        info!(
            "State of port {} in node {} (SDK port {}) changed to {}",
            port_id, node_id, event.sdk_port_id, event.state
        );

        Some(ChassisEvent::PortOperStateChanged {
            node_id,
            port_id,
            state: event.state,
            time_last_changed: event.time_last_changed,
        })
    }
}

fn replay_port(
    applier: &ConfigApplier<'_>,
    unit: Unit,
    port_ref: &PortRef,
    record: &mut PortRecord,
) -> ChassisResult<()> {
    if record.config.speed_bps.is_none() {
        return Err(ChassisError::internal(format!(
            "Invalid internal state for {}: speed_bps should contain a value",
            port_ref
        )));
    }
    if record.config.fec_mode.is_none() {
        return Err(ChassisError::internal(format!(
            "Invalid internal state for {}: fec_mode should contain a value",
            port_ref
        )));
    }
    let port = record
        .config
        .to_singleton_port(port_ref.port_id, port_ref.node_id, record.key)
        .ok_or_else(|| ChassisError::internal(format!("Cannot rebuild {}", port_ref)))?;

    debug!("Replaying {}", port_ref);
    let mut config = PortConfig::default();
    let result = applier.add_port(
        port_ref.node_id,
        unit,
        record.sdk_port_id,
        &port,
        &mut config,
    );
    record.config = config;
    result
}

/// Read access to chassis state.
pub struct ChassisReadGuard<'a> {
    device: &'a dyn DeviceInterface,
    state: RwLockReadGuard<'a, ChassisState>,
}

impl ChassisQueries for ChassisReadGuard<'_> {
    fn live_generation(&self) -> Option<&Generation> {
        self.state.live()
    }

    fn device(&self) -> &dyn DeviceInterface {
        self.device
    }
}

/// Write access to chassis state; required for push and verify.
pub struct ChassisWriteGuard<'a> {
    device: &'a dyn DeviceInterface,
    state: RwLockWriteGuard<'a, ChassisState>,
}

impl ChassisQueries for ChassisWriteGuard<'_> {
    fn live_generation(&self) -> Option<&Generation> {
        self.state.live()
    }

    fn device(&self) -> &dyn DeviceInterface {
        self.device
    }
}

impl ChassisWriteGuard<'_> {
    /// Checks a config without changing any state.
    #[instrument(skip_all, fields(nodes = config.nodes.len(), ports = config.singleton_ports.len()))]
    pub fn verify_chassis_config(&self, config: &ChassisConfig) -> ChassisResult<()> {
        verify::verify_chassis_config(config, self.device, self.state.live())
    }

    /// Reconciles the device against `config`.
    ///
    /// On any failure the live generation is left untouched; device calls
    /// already issued are not undone.
    #[instrument(skip_all, fields(nodes = config.nodes.len(), ports = config.singleton_ports.len()))]
    pub fn push_chassis_config(&mut self, config: &ChassisConfig) -> ChassisResult<()> {
        let old = Arc::clone(&self.state.generation);
        let mut generation = Generation::default();

        for (node_id, unit) in verify::assign_units(config) {
            generation.insert_node(node_id, unit);
        }

        for port in &config.singleton_ports {
            let unit = generation.unit(port.node).ok_or_else(|| {
                ChassisError::invalid_param(format!(
                    "Invalid chassis config, unknown node id {} for port {}",
                    port.node, port.id
                ))
            })?;
            let key = port.port_key();
            let sdk_port_id = self.device.resolve_port_key(unit, &key)?;
            info!("SDK port {} for port {} in node {}", sdk_port_id, port.id, port.node);
            generation.insert_port(
                PortRef::new(port.node, port.id),
                PortRecord::new(key, sdk_port_id),
            );
        }

        let applier = ConfigApplier::new(self.device);
        for port in &config.singleton_ports {
            let port_ref = PortRef::new(port.node, port.id);
            let unit = generation
                .unit(port.node)
                .ok_or_else(|| ChassisError::internal(format!("Node {} vanished", port.node)))?;
            let record = generation
                .port_mut(&port_ref)
                .ok_or_else(|| ChassisError::internal(format!("{} vanished", port_ref)))?;
            let sdk_port_id = record.sdk_port_id;

            match old.port(&port_ref).map(|r| &r.config) {
                None => {
                    // A push that failed part way may have left this port behind.
                    if old.port_id_for_sdk_port(port.node, sdk_port_id).is_none() {
                        applier.remove_stale_port(unit, sdk_port_id);
                    }
                    applier.add_port(port.node, unit, sdk_port_id, port, &mut record.config)?;
                }
                Some(prev) if !prev.state.is_configured() => {
                    info!("{} is {}, re-creating it", port_ref, prev.state);
                    applier.remove_stale_port(unit, sdk_port_id);
                    applier.add_port(port.node, unit, sdk_port_id, port, &mut record.config)?;
                }
                Some(prev) => {
                    if prev.speed_bps.is_none() {
                        return Err(ChassisError::internal(format!(
                            "Invalid internal state for {}: speed_bps should contain a value",
                            port_ref
                        )));
                    }
                    applier.update_port(
                        port.node,
                        unit,
                        sdk_port_id,
                        port,
                        prev,
                        &mut record.config,
                    )?;
                }
            }
        }

        for (port_ref, record) in old.ports() {
            if generation.contains_port(port_ref) {
                continue;
            }
            let unit = old.unit(port_ref.node_id).ok_or_else(|| {
                ChassisError::internal(format!("No unit for node {}", port_ref.node_id))
            })?;
            info!("Deleting {} (SDK port {})", port_ref, record.sdk_port_id);
            if record.config.state.is_configured() {
                applier.delete_port(unit, record.sdk_port_id, &record.config)?;
            } else {
                applier.remove_stale_port(unit, record.sdk_port_id);
            }
        }

        info!(
            "Chassis config pushed: {} node(s), {} port(s)",
            generation.node_id_to_unit().len(),
            generation.port_count()
        );
        self.state.generation = Arc::new(generation);
        self.state.initialized = true;
        Ok(())
    }
}
