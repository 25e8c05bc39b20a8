//! Read-only queries over the live generation.
//!
//! [`ChassisQueries`] is implemented by both chassis lock guards, so queries
//! are only reachable while the caller holds the chassis lock.

use crate::data::{
    DataRequest, DataResponse, FrontPanelPortInfo, HealthState, TrunkMemberBlockState,
};
use crate::defaults::{DUMMY_MAC_ADDRESS, VENDOR_NAME};
use crate::error::{ChassisError, ChassisResult};
use crate::generation::{Generation, PortRecord, PortRef};
use crate::port_config::PortConfig;
use chassis_device::{DeviceInterface, PortCounters, SdkPortId, Unit};
use chassis_types::PortState;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;

/// Queries available while the chassis lock is held.
pub trait ChassisQueries {
    /// Returns the live generation, or `None` before the first successful push.
    fn live_generation(&self) -> Option<&Generation>;

    fn device(&self) -> &dyn DeviceInterface;

    fn is_initialized(&self) -> bool {
        self.live_generation().is_some()
    }

    #[doc(hidden)]
    fn generation(&self) -> ChassisResult<&Generation> {
        self.live_generation().ok_or(ChassisError::NotInitialized)
    }

    #[doc(hidden)]
    fn port_record(&self, node_id: u64, port_id: u32) -> ChassisResult<&PortRecord> {
        let generation = self.generation()?;
        if generation.unit(node_id).is_none() {
            return Err(ChassisError::not_found(format!("Node {}", node_id)));
        }
        generation
            .port(&PortRef::new(node_id, port_id))
            .ok_or_else(|| ChassisError::not_found(PortRef::new(node_id, port_id).to_string()))
    }

    fn get_node_id_to_unit_map(&self) -> ChassisResult<BTreeMap<u64, Unit>> {
        Ok(self.generation()?.node_id_to_unit().clone())
    }

    fn get_unit_from_node_id(&self, node_id: u64) -> ChassisResult<Unit> {
        self.generation()?
            .unit(node_id)
            .ok_or_else(|| ChassisError::not_found(format!("Node {}", node_id)))
    }

    fn get_port_config(&self, node_id: u64, port_id: u32) -> ChassisResult<&PortConfig> {
        Ok(&self.port_record(node_id, port_id)?.config)
    }

    fn get_sdk_port_id(&self, node_id: u64, port_id: u32) -> ChassisResult<SdkPortId> {
        Ok(self.port_record(node_id, port_id)?.sdk_port_id)
    }

    fn get_port_time_last_changed(&self, node_id: u64, port_id: u32) -> ChassisResult<DateTime<Utc>> {
        Ok(self.port_record(node_id, port_id)?.time_last_changed)
    }

    /// Returns the cached link state, querying the device if it is unknown.
    ///
    /// A live answer is not written back to the cache.
    fn get_port_state(&self, node_id: u64, port_id: u32) -> ChassisResult<PortState> {
        let unit = self.get_unit_from_node_id(node_id)?;
        let record = self.port_record(node_id, port_id)?;
        if record.state != PortState::Unknown {
            return Ok(record.state);
        }

        info!("Querying state of port {} in node {}", port_id, node_id);
        let state = self.device().get_port_state(unit, record.sdk_port_id)?;
        info!(
            "State of port {} in node {} (SDK port {}): {}",
            port_id, node_id, record.sdk_port_id, state
        );
        Ok(state)
    }

    fn get_port_counters(&self, node_id: u64, port_id: u32) -> ChassisResult<PortCounters> {
        let unit = self.get_unit_from_node_id(node_id)?;
        let sdk_port_id = self.get_sdk_port_id(node_id, port_id)?;
        Ok(self.device().get_port_counters(unit, sdk_port_id)?)
    }

    /// Answers one data request.
    fn get_port_data(&self, request: &DataRequest) -> ChassisResult<DataResponse> {
        self.generation()?;

        let response = match *request {
            DataRequest::OperStatus(p) => DataResponse::OperStatus {
                state: self.get_port_state(p.node_id, p.port_id)?,
                time_last_changed: self.get_port_time_last_changed(p.node_id, p.port_id)?,
            },
            DataRequest::AdminStatus(p) => DataResponse::AdminStatus {
                state: self.get_port_config(p.node_id, p.port_id)?.state.admin_state(),
            },
            DataRequest::MacAddress(_) => DataResponse::MacAddress {
                mac_address: DUMMY_MAC_ADDRESS,
            },
            DataRequest::PortSpeed(p) => DataResponse::PortSpeed {
                speed_bps: self.get_port_config(p.node_id, p.port_id)?.speed_bps,
            },
            DataRequest::NegotiatedPortSpeed(p) => {
                let speed_bps = match self.get_port_config(p.node_id, p.port_id)?.speed_bps {
                    Some(speed) if self.get_port_state(p.node_id, p.port_id)?.is_up() => {
                        Some(speed)
                    }
                    _ => None,
                };
                DataResponse::NegotiatedPortSpeed { speed_bps }
            }
            DataRequest::LacpRouterMac(_) => DataResponse::LacpRouterMac {
                mac_address: DUMMY_MAC_ADDRESS,
            },
            DataRequest::PortCounters(p) => {
                DataResponse::PortCounters(self.get_port_counters(p.node_id, p.port_id)?)
            }
            DataRequest::AutonegStatus(p) => DataResponse::AutonegStatus {
                state: self.get_port_config(p.node_id, p.port_id)?.autoneg,
            },
            DataRequest::FrontPanelPortInfo(_) => {
                DataResponse::FrontPanelPortInfo(FrontPanelPortInfo::default())
            }
            DataRequest::FecStatus(p) => DataResponse::FecStatus {
                mode: self.get_port_config(p.node_id, p.port_id)?.fec_mode,
            },
            DataRequest::LoopbackStatus(p) => DataResponse::LoopbackStatus {
                state: self.get_port_config(p.node_id, p.port_id)?.loopback_mode,
            },
            DataRequest::SdnPortId(p) => DataResponse::SdnPortId {
                port_id: self.get_sdk_port_id(p.node_id, p.port_id)?,
            },
            DataRequest::ForwardingViability(_) => DataResponse::ForwardingViability {
                state: TrunkMemberBlockState::Unknown,
            },
            DataRequest::HealthIndicator(_) => DataResponse::HealthIndicator {
                state: HealthState::Unknown,
            },
            DataRequest::NodeInfo { node_id } => {
                let unit = self.get_unit_from_node_id(node_id)?;
                DataResponse::NodeInfo {
                    vendor_name: VENDOR_NAME.to_string(),
                    chip_name: self.device().chip_type(unit)?,
                }
            }
        };

        Ok(response)
    }

    /// Answers a batch of requests, one result per request in order.
    fn retrieve_value(&self, requests: &[DataRequest]) -> Vec<ChassisResult<DataResponse>> {
        requests.iter().map(|r| self.get_port_data(r)).collect()
    }
}
