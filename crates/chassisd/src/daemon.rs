//! ChassisDaemon - wires the chassis manager to a device and runs it.
//!
//! # Startup
//!
//! ```text
//! load config ──> subscribe to device events ──> verify + push (write lock)
//!                                                      │
//!                    port status report <──────────────┤
//!                                                      ▼
//!        device events ──> event pump ──> ChassisManager ──> event log task
//!                                                      │
//!                              ctrl-c ──> shutdown ────┘
//! ```

use crate::config::DaemonConfig;
use anyhow::{Context, Result};
use chassis_device::{PortStatusEvent, SimDevice};
use chassis_manager::{
    ChassisEvent, ChassisManager, ChassisQueries, ChassisResult, DataRequest, DataResponse,
    PortRef,
};
use chassis_types::{AdminState, ChassisConfig, PortState};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Snapshot of one configured port, logged after each push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortStatus {
    pub node_id: u64,
    pub port_id: u32,
    pub name: String,
    pub admin_state: AdminState,
    pub oper_state: PortState,
    pub speed_bps: Option<u64>,
}

pub struct ChassisDaemon {
    config: DaemonConfig,
    device: Arc<SimDevice>,
    manager: Arc<ChassisManager>,
}

impl ChassisDaemon {
    /// Creates a daemon backed by a simulated device.
    pub fn new(config: DaemonConfig) -> Self {
        let device = Arc::new(SimDevice::new(config.sim_port_count));
        let manager = Arc::new(ChassisManager::new(device.clone()));
        Self {
            config,
            device,
            manager,
        }
    }

    pub fn device(&self) -> &Arc<SimDevice> {
        &self.device
    }

    pub fn manager(&self) -> &Arc<ChassisManager> {
        &self.manager
    }

    /// Verifies `chassis` and, unless running verify-only, pushes it.
    ///
    /// Both steps run under a single hold of the chassis write lock.
    pub fn apply(&self, chassis: &ChassisConfig) -> ChassisResult<()> {
        let mut guard = self.manager.lock_write();
        guard.verify_chassis_config(chassis)?;
        info!(
            "Chassis config verified: {} node(s), {} port(s)",
            chassis.nodes.len(),
            chassis.singleton_ports.len()
        );
        if self.config.verify_only {
            return Ok(());
        }
        guard.push_chassis_config(chassis)
    }

    /// Collects admin/oper state and speed of every port in `chassis`.
    ///
    /// Ports whose status cannot be read are logged and left out.
    pub fn port_status(&self, chassis: &ChassisConfig) -> Vec<PortStatus> {
        let guard = self.manager.lock_read();
        let mut statuses = Vec::with_capacity(chassis.singleton_ports.len());

        for port in &chassis.singleton_ports {
            let port_ref = PortRef::new(port.node, port.id);
            let responses = guard.retrieve_value(&[
                DataRequest::AdminStatus(port_ref),
                DataRequest::OperStatus(port_ref),
                DataRequest::PortSpeed(port_ref),
            ]);

            let mut status = PortStatus {
                node_id: port.node,
                port_id: port.id,
                name: port.name.clone(),
                admin_state: AdminState::Unknown,
                oper_state: PortState::Unknown,
                speed_bps: None,
            };
            for response in responses {
                match response {
                    Ok(DataResponse::AdminStatus { state }) => status.admin_state = state,
                    Ok(DataResponse::OperStatus { state, .. }) => status.oper_state = state,
                    Ok(DataResponse::PortSpeed { speed_bps }) => status.speed_bps = speed_bps,
                    Ok(other) => debug!("Unexpected response {:?} for {}", other, port_ref),
                    Err(err) => {
                        warn!("Cannot read status of {}: {}", port_ref, err);
                        break;
                    }
                }
            }
            statuses.push(status);
        }

        statuses
    }

    /// Feeds device port status events into the manager until the sender is dropped.
    ///
    /// The chassis lock is blocking and may be held for a whole push, so each
    /// event is handled on the blocking pool.
    pub fn spawn_event_pump(
        &self,
        mut events: mpsc::UnboundedReceiver<PortStatusEvent>,
    ) -> JoinHandle<usize> {
        let manager = Arc::clone(&self.manager);
        tokio::spawn(async move {
            let mut handled = 0usize;
            while let Some(event) = events.recv().await {
                let manager = Arc::clone(&manager);
                match task::spawn_blocking(move || manager.handle_port_status_event(&event)).await {
                    Ok(true) => handled += 1,
                    Ok(false) => {}
                    Err(err) => warn!("Port status event handler failed: {}", err),
                }
            }
            debug!("Device event stream closed after {} event(s)", handled);
            handled
        })
    }

    /// Registers an event writer that logs every chassis event as JSON.
    fn spawn_event_logger(&self) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChassisEvent>();
        self.manager.register_event_notify_writer(Arc::new(tx));
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(json) => info!(event = %json, "Chassis event"),
                    Err(err) => warn!("Cannot serialize chassis event {:?}: {}", event, err),
                }
            }
        })
    }

    /// Applies `chassis`, then serves device events until `shutdown` resolves.
    pub async fn run<F>(self, chassis: ChassisConfig, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let events = self.device.subscribe();
        self.apply(&chassis)
            .with_context(|| format!("failed to apply {}", self.config.chassis_config.display()))?;

        if self.config.verify_only {
            info!("Verify-only mode, not pushing the chassis config");
            return Ok(());
        }

        for status in self.port_status(&chassis) {
            match serde_json::to_string(&status) {
                Ok(json) => info!(port = %json, "Port status"),
                Err(err) => warn!("Cannot serialize status of port {}: {}", status.port_id, err),
            }
        }

        let logger = self.spawn_event_logger();
        let pump = self.spawn_event_pump(events);
        info!("chassisd running, waiting for shutdown signal");

        shutdown.await;

        info!("Shutting down chassis manager");
        pump.abort();
        self.manager.unregister_event_notify_writer();
        self.manager.shutdown()?;
        if let Err(err) = logger.await {
            warn!("Event log task ended abnormally: {}", err);
        }
        Ok(())
    }
}
