mod common;

use chassis_device::{PortCounters, PortStatusEvent, SdkPortId, Unit};
use chassis_manager::defaults::{DUMMY_MAC_ADDRESS, VENDOR_NAME};
use chassis_manager::{
    ChassisError, ChassisEvent, ChassisQueries, DataRequest, DataResponse, ErrorCode,
    FrontPanelPortInfo, HealthState, PortRef, TrunkMemberBlockState,
};
use chassis_types::{AdminState, FecMode, LoopbackState, PortState, TriState};
use chrono::{TimeZone, Utc};
use common::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

const UNIT: Unit = Unit::new(0);

fn pushed() -> (Arc<chassis_device::SimDevice>, chassis_manager::ChassisManager) {
    let (device, manager) = setup();
    let mut tuned = port(2, AdminState::Disabled);
    tuned.config_params.autoneg = TriState::Enabled;
    tuned.config_params.loopback_mode = LoopbackState::Mac;
    push(
        &device,
        &manager,
        &config(vec![port(1, AdminState::Enabled), tuned]),
    );
    (device, manager)
}

#[test]
fn test_queries_before_push() {
    let (_device, manager) = setup();
    let chassis = manager.lock_read();

    assert!(!chassis.is_initialized());
    assert_eq!(chassis.get_unit_from_node_id(NODE_ID), Err(ChassisError::NotInitialized));
    assert_eq!(
        chassis.get_port_state(NODE_ID, 1).unwrap_err().code(),
        ErrorCode::NotInitialized
    );
    assert_eq!(
        chassis
            .get_port_data(&DataRequest::NodeInfo { node_id: NODE_ID })
            .unwrap_err(),
        ChassisError::NotInitialized
    );
}

#[test]
fn test_node_and_port_lookups() {
    let (_device, manager) = pushed();
    let chassis = manager.lock_read();

    assert_eq!(
        chassis.get_node_id_to_unit_map().unwrap(),
        BTreeMap::from([(NODE_ID, UNIT)])
    );
    assert_eq!(chassis.get_unit_from_node_id(NODE_ID).unwrap(), UNIT);
    assert_eq!(chassis.get_sdk_port_id(NODE_ID, 2).unwrap(), SdkPortId::new(4));
    assert_eq!(
        chassis.get_unit_from_node_id(1).unwrap_err().code(),
        ErrorCode::NotFound
    );
    assert_eq!(
        chassis.get_port_config(1, 1).unwrap_err().to_string(),
        "Node 1 is not configured or not known"
    );
    assert_eq!(
        chassis.get_port_config(NODE_ID, 9).unwrap_err().to_string(),
        format!("Port 9 in node {} is not configured or not known", NODE_ID)
    );
}

#[test]
fn test_port_state_falls_back_to_device_without_caching() {
    let (_device, manager) = pushed();
    let chassis = manager.lock_read();

    assert_eq!(chassis.get_port_state(NODE_ID, 1).unwrap(), PortState::Up);
    assert_eq!(chassis.get_port_state(NODE_ID, 2).unwrap(), PortState::Down);
    assert_eq!(chassis.port_record(NODE_ID, 1).unwrap().state, PortState::Unknown);
}

#[test]
fn test_status_events_update_cache_and_notify_writer() {
    let (device, manager) = setup();
    let mut device_events = device.subscribe();
    push(&device, &manager, &config(vec![port(1, AdminState::Enabled)]));

    let (tx, mut rx) = mpsc::unbounded_channel::<ChassisEvent>();
    manager.register_event_notify_writer(Arc::new(tx));

    let event = device_events.try_recv().unwrap();
    assert_eq!(event.sdk_port_id, SdkPortId::new(0));
    assert!(manager.handle_port_status_event(&event));

    assert_eq!(
        rx.try_recv().unwrap(),
        ChassisEvent::PortOperStateChanged {
            node_id: NODE_ID,
            port_id: 1,
            state: PortState::Up,
            time_last_changed: event.time_last_changed,
        }
    );

    // A cable pull is served from the cache once reported.
    device.set_link_state(UNIT, SdkPortId::new(0), PortState::Down);
    let down = device_events.try_recv().unwrap();
    assert!(manager.handle_port_status_event(&down));

    let chassis = manager.lock_read();
    assert_eq!(chassis.get_port_state(NODE_ID, 1).unwrap(), PortState::Down);
    assert_eq!(
        chassis.get_port_time_last_changed(NODE_ID, 1).unwrap(),
        down.time_last_changed
    );
    drop(chassis);

    manager.unregister_event_notify_writer();
    assert!(rx.try_recv().is_ok());
    assert!(manager.handle_port_status_event(&event));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_status_events_for_unknown_ports_are_ignored() {
    let (_device, manager) = pushed();
    let event = PortStatusEvent {
        unit: UNIT,
        sdk_port_id: SdkPortId::new(60),
        state: PortState::Up,
        time_last_changed: Utc::now(),
    };
    assert!(!manager.handle_port_status_event(&event));

    let other_unit = PortStatusEvent {
        unit: Unit::new(3),
        sdk_port_id: SdkPortId::new(0),
        ..event
    };
    assert!(!manager.handle_port_status_event(&other_unit));
}

#[test]
fn test_status_event_before_push_is_ignored() {
    let (_device, manager) = setup();
    let event = PortStatusEvent {
        unit: UNIT,
        sdk_port_id: SdkPortId::new(0),
        state: PortState::Up,
        time_last_changed: Utc::now(),
    };
    assert!(!manager.handle_port_status_event(&event));
}

#[test]
fn test_get_port_data_answers_every_port_request() {
    let (device, manager) = pushed();
    let counters = PortCounters {
        in_octets: 1500,
        out_octets: 3000,
        in_errors: 2,
        ..Default::default()
    };
    device.set_port_counters(UNIT, SdkPortId::new(4), counters);
    let when = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    manager.handle_port_status_event(&PortStatusEvent {
        unit: UNIT,
        sdk_port_id: SdkPortId::new(4),
        state: PortState::Down,
        time_last_changed: when,
    });

    let p = PortRef::new(NODE_ID, 2);
    let chassis = manager.lock_read();
    let cases = [
        (
            DataRequest::OperStatus(p),
            DataResponse::OperStatus {
                state: PortState::Down,
                time_last_changed: when,
            },
        ),
        (
            DataRequest::AdminStatus(p),
            DataResponse::AdminStatus {
                state: AdminState::Disabled,
            },
        ),
        (
            DataRequest::MacAddress(p),
            DataResponse::MacAddress {
                mac_address: DUMMY_MAC_ADDRESS,
            },
        ),
        (
            DataRequest::PortSpeed(p),
            DataResponse::PortSpeed {
                speed_bps: Some(SPEED_25G),
            },
        ),
        (
            DataRequest::NegotiatedPortSpeed(p),
            DataResponse::NegotiatedPortSpeed { speed_bps: None },
        ),
        (
            DataRequest::LacpRouterMac(p),
            DataResponse::LacpRouterMac {
                mac_address: DUMMY_MAC_ADDRESS,
            },
        ),
        (DataRequest::PortCounters(p), DataResponse::PortCounters(counters)),
        (
            DataRequest::AutonegStatus(p),
            DataResponse::AutonegStatus {
                state: TriState::Enabled,
            },
        ),
        (
            DataRequest::FrontPanelPortInfo(p),
            DataResponse::FrontPanelPortInfo(FrontPanelPortInfo::default()),
        ),
        (
            DataRequest::FecStatus(p),
            DataResponse::FecStatus {
                mode: Some(FecMode::Unknown),
            },
        ),
        (
            DataRequest::LoopbackStatus(p),
            DataResponse::LoopbackStatus {
                state: LoopbackState::Mac,
            },
        ),
        (
            DataRequest::SdnPortId(p),
            DataResponse::SdnPortId {
                port_id: SdkPortId::new(4),
            },
        ),
        (
            DataRequest::ForwardingViability(p),
            DataResponse::ForwardingViability {
                state: TrunkMemberBlockState::Unknown,
            },
        ),
        (
            DataRequest::HealthIndicator(p),
            DataResponse::HealthIndicator {
                state: HealthState::Unknown,
            },
        ),
    ];

    for (request, expected) in cases {
        assert_eq!(chassis.get_port_data(&request).unwrap(), expected, "{:?}", request);
    }
}

#[test]
fn test_negotiated_speed_reported_only_when_up() {
    let (_device, manager) = pushed();
    let chassis = manager.lock_read();

    assert_eq!(
        chassis
            .get_port_data(&DataRequest::NegotiatedPortSpeed(PortRef::new(NODE_ID, 1)))
            .unwrap(),
        DataResponse::NegotiatedPortSpeed {
            speed_bps: Some(SPEED_25G)
        }
    );
}

#[test]
fn test_node_info() {
    let (_device, manager) = pushed();
    let chassis = manager.lock_read();

    assert_eq!(
        chassis
            .get_port_data(&DataRequest::NodeInfo { node_id: NODE_ID })
            .unwrap(),
        DataResponse::NodeInfo {
            vendor_name: VENDOR_NAME.to_string(),
            chip_name: "SIMULATED".to_string(),
        }
    );
}

#[test]
fn test_retrieve_value_keeps_per_request_errors() {
    let (_device, manager) = pushed();
    let chassis = manager.lock_read();

    let results = chassis.retrieve_value(&[
        DataRequest::AdminStatus(PortRef::new(NODE_ID, 1)),
        DataRequest::AdminStatus(PortRef::new(NODE_ID, 42)),
        DataRequest::NodeInfo { node_id: 5 },
    ]);

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0],
        Ok(DataResponse::AdminStatus {
            state: AdminState::Enabled
        })
    );
    assert_eq!(results[1].as_ref().unwrap_err().code(), ErrorCode::NotFound);
    assert_eq!(results[2].as_ref().unwrap_err().code(), ErrorCode::NotFound);
}

#[test]
fn test_readers_share_the_lock() {
    let (_device, manager) = pushed();
    let manager = Arc::new(manager);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                let chassis = manager.lock_read();
                let speed = chassis.get_port_config(NODE_ID, 1).map(|c| c.speed_bps);
                speed
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(Some(SPEED_25G)));
    }
}
