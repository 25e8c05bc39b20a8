//! Port and node data requests answered by the chassis manager.

use crate::generation::PortRef;
use chassis_device::{PortCounters, SdkPortId};
use chassis_types::{AdminState, FecMode, LoopbackState, MacAddress, PortState, TriState};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health of a port as shown by its indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Unknown,
    Good,
    Bad,
}

/// Whether a trunk member is allowed to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrunkMemberBlockState {
    #[default]
    Unknown,
    Forwarding,
    Blocked,
}

/// Front panel transceiver info. Not tracked; always empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FrontPanelPortInfo {
    pub vendor_name: String,
    pub part_number: String,
    pub serial_number: String,
}

/// A single data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRequest {
    OperStatus(PortRef),
    AdminStatus(PortRef),
    MacAddress(PortRef),
    PortSpeed(PortRef),
    NegotiatedPortSpeed(PortRef),
    LacpRouterMac(PortRef),
    PortCounters(PortRef),
    AutonegStatus(PortRef),
    FrontPanelPortInfo(PortRef),
    FecStatus(PortRef),
    LoopbackStatus(PortRef),
    SdnPortId(PortRef),
    ForwardingViability(PortRef),
    HealthIndicator(PortRef),
    NodeInfo { node_id: u64 },
}

impl DataRequest {
    /// Returns the port a request targets, if it is a port request.
    pub fn port(&self) -> Option<PortRef> {
        match *self {
            DataRequest::OperStatus(p)
            | DataRequest::AdminStatus(p)
            | DataRequest::MacAddress(p)
            | DataRequest::PortSpeed(p)
            | DataRequest::NegotiatedPortSpeed(p)
            | DataRequest::LacpRouterMac(p)
            | DataRequest::PortCounters(p)
            | DataRequest::AutonegStatus(p)
            | DataRequest::FrontPanelPortInfo(p)
            | DataRequest::FecStatus(p)
            | DataRequest::LoopbackStatus(p)
            | DataRequest::SdnPortId(p)
            | DataRequest::ForwardingViability(p)
            | DataRequest::HealthIndicator(p) => Some(p),
            DataRequest::NodeInfo { .. } => None,
        }
    }
}

/// Answer to a [`DataRequest`]; the variant always matches the request.
///
/// Optional fields are `None` when the port never reached that setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataResponse {
    OperStatus {
        state: PortState,
        time_last_changed: DateTime<Utc>,
    },
    AdminStatus {
        state: AdminState,
    },
    MacAddress {
        mac_address: MacAddress,
    },
    PortSpeed {
        speed_bps: Option<u64>,
    },
    NegotiatedPortSpeed {
        speed_bps: Option<u64>,
    },
    LacpRouterMac {
        mac_address: MacAddress,
    },
    PortCounters(PortCounters),
    AutonegStatus {
        state: TriState,
    },
    FrontPanelPortInfo(FrontPanelPortInfo),
    FecStatus {
        mode: Option<FecMode>,
    },
    LoopbackStatus {
        state: LoopbackState,
    },
    SdnPortId {
        port_id: SdkPortId,
    },
    ForwardingViability {
        state: TrunkMemberBlockState,
    },
    HealthIndicator {
        state: HealthState,
    },
    NodeInfo {
        vendor_name: String,
        chip_name: String,
    },
}
