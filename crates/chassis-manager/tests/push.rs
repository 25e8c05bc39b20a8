mod common;

use chassis_device::{
    DeviceError, DeviceInterface, DeviceOp, DevicePortParams, DeviceResult, FailureRule,
    PortCounters, SdkPortId, Unit,
};
use chassis_manager::{ChassisManager, ChassisQueries, ErrorCode, PortApplyState};
use chassis_types::{
    AdminState, FecMode, LoopbackState, PortKey, PortState, TriState,
};
use common::*;
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;

mock! {
    pub Device {}

    impl DeviceInterface for Device {
        fn resolve_port_key(&self, unit: Unit, key: &PortKey) -> DeviceResult<SdkPortId>;
        fn port_exists(&self, unit: Unit, port: SdkPortId) -> bool;
        fn create_port(
            &self,
            unit: Unit,
            port: SdkPortId,
            speed_bps: u64,
            params: &DevicePortParams,
            fec_mode: FecMode,
        ) -> DeviceResult<()>;
        fn delete_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()>;
        fn enable_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()>;
        fn disable_port(&self, unit: Unit, port: SdkPortId) -> DeviceResult<()>;
        fn set_autoneg_policy(&self, unit: Unit, port: SdkPortId, autoneg: TriState) -> DeviceResult<()>;
        fn set_loopback_mode(&self, unit: Unit, port: SdkPortId, mode: LoopbackState) -> DeviceResult<()>;
        fn set_mtu(&self, unit: Unit, port: SdkPortId, mtu: u32) -> DeviceResult<()>;
        fn get_port_state(&self, unit: Unit, port: SdkPortId) -> DeviceResult<PortState>;
        fn get_port_counters(&self, unit: Unit, port: SdkPortId) -> DeviceResult<PortCounters>;
        fn chip_type(&self, unit: Unit) -> DeviceResult<String>;
    }
}

#[test]
fn test_fresh_push_configures_every_port() {
    let (device, manager) = setup();
    let config = config(vec![
        port(1, AdminState::Enabled),
        port(2, AdminState::Disabled),
    ]);

    let mut chassis = manager.lock_write();
    chassis.push_chassis_config(&config).unwrap();

    assert!(chassis.is_initialized());
    assert_eq!(
        chassis.get_port_config(NODE_ID, 1).unwrap().state,
        PortApplyState::Enabled
    );
    assert_eq!(
        chassis.get_port_config(NODE_ID, 2).unwrap().state,
        PortApplyState::Disabled
    );
    assert_eq!(chassis.get_sdk_port_id(NODE_ID, 2).unwrap(), SdkPortId::new(4));
    assert_eq!(
        mutating_ops(&device),
        vec![DeviceOp::CreatePort, DeviceOp::EnablePort, DeviceOp::CreatePort]
    );
}

#[test]
fn test_fresh_push_rejects_unknown_admin_state() {
    let (_device, manager) = setup();
    let config = config(vec![
        port(1, AdminState::Enabled),
        port(2, AdminState::Unknown),
    ]);

    let mut chassis = manager.lock_write();
    let err = chassis.push_chassis_config(&config).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParam);
    assert!(!chassis.is_initialized());
    assert_eq!(
        chassis.get_port_config(NODE_ID, 1).unwrap_err().code(),
        ErrorCode::NotInitialized
    );
}

#[test]
fn test_fresh_push_rejects_diag_admin_state() {
    let (_device, manager) = setup();
    let config = config(vec![port(1, AdminState::Diag)]);

    let err = manager.lock_write().push_chassis_config(&config).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unimplemented);
}

#[test]
fn test_push_fails_when_port_does_not_resolve() {
    let (device, manager) = setup();
    let first = config(vec![port(1, AdminState::Enabled)]);
    push(&device, &manager, &first);

    let mut bad = config(vec![port(1, AdminState::Enabled), port(40, AdminState::Enabled)]);
    bad.description = "port 40 does not exist".to_string();

    let mut chassis = manager.lock_write();
    let err = chassis.push_chassis_config(&bad).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Device);
    assert!(mutating_ops(&device).is_empty());
    assert_eq!(chassis.get_port_config(NODE_ID, 40).unwrap_err().code(), ErrorCode::NotFound);
    assert_eq!(chassis.generation().unwrap().port_count(), 1);
}

#[test]
fn test_push_after_rejected_push_recreates_leftover_ports() {
    let (device, manager) = setup();
    let mut chassis = manager.lock_write();

    let err = chassis
        .push_chassis_config(&config(vec![
            port(1, AdminState::Enabled),
            port(2, AdminState::Unknown),
        ]))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParam);
    assert_eq!(device.created_ports(Unit::new(0)), vec![SdkPortId::new(0)]);
    device.clear_calls();

    chassis
        .push_chassis_config(&config(vec![
            port(1, AdminState::Enabled),
            port(2, AdminState::Enabled),
        ]))
        .unwrap();
    assert_eq!(
        mutating_ops(&device),
        vec![
            DeviceOp::DeletePort,
            DeviceOp::CreatePort,
            DeviceOp::EnablePort,
            DeviceOp::CreatePort,
            DeviceOp::EnablePort,
        ]
    );
    assert_eq!(
        device.created_ports(Unit::new(0)),
        vec![SdkPortId::new(0), SdkPortId::new(4)]
    );
    assert_eq!(
        chassis.get_port_config(NODE_ID, 1).unwrap().state,
        PortApplyState::Enabled
    );
}

#[test]
fn test_push_after_device_failure_recreates_leftover_ports() {
    let (device, manager) = setup();
    let mut with_tap = port(2, AdminState::Enabled);
    with_tap.config_params.control_port = Some("tap2".to_string());
    let config = config(vec![port(1, AdminState::Enabled), with_tap]);

    device.inject_failure(
        FailureRule::on(DeviceOp::EnablePort)
            .for_port(SdkPortId::new(4))
            .times(1),
    );
    let mut chassis = manager.lock_write();
    let err = chassis.push_chassis_config(&config).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Device);
    assert!(!chassis.is_initialized());
    device.clear_calls();

    chassis.push_chassis_config(&config).unwrap();
    assert_eq!(device.count(DeviceOp::DeletePort), 3);
    assert_eq!(device.count(DeviceOp::CreatePort), 3);
    assert!(device.is_enabled(Unit::new(0), SdkPortId::new(4)));
    assert!(device.port_exists(Unit::new(0), SdkPortId::new(4).control_port()));
    assert_eq!(
        chassis.get_port_config(NODE_ID, 2).unwrap().state,
        PortApplyState::Enabled
    );
}

#[test]
fn test_push_rejects_port_on_unknown_node() {
    let (_device, manager) = setup();
    let mut config = config(vec![port(1, AdminState::Enabled)]);
    config.singleton_ports[0].node = 42;

    let err = manager.lock_write().push_chassis_config(&config).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParam);
}

#[test]
fn test_identical_repush_is_idempotent() {
    let (device, manager) = setup();
    let mut tuned = port(3, AdminState::Enabled);
    tuned.config_params.mtu = Some(9000);
    tuned.config_params.autoneg = TriState::Enabled;
    tuned.config_params.loopback_mode = LoopbackState::None;
    tuned.config_params.control_port = Some("tap3".to_string());
    let config = config(vec![
        port(1, AdminState::Enabled),
        port(2, AdminState::Disabled),
        tuned,
    ]);
    push(&device, &manager, &config);

    let mut chassis = manager.lock_write();
    chassis.verify_chassis_config(&config).unwrap();
    chassis.push_chassis_config(&config).unwrap();
    assert!(device.mutating_calls().is_empty());
}

#[test]
fn test_speed_change_recreates_port() {
    let (device, manager) = setup();
    push(&device, &manager, &config(vec![port(1, AdminState::Enabled)]));

    let mut faster = port(1, AdminState::Enabled);
    faster.speed_bps = SPEED_100G;
    let mut chassis = manager.lock_write();
    chassis.push_chassis_config(&config(vec![faster])).unwrap();

    assert_eq!(device.count(DeviceOp::DeletePort), 1);
    assert_eq!(device.count(DeviceOp::CreatePort), 1);
    assert_eq!(
        device.port_speed(Unit::new(0), SdkPortId::new(0)).map(|(s, _)| s),
        Some(SPEED_100G)
    );
    assert_eq!(chassis.get_port_config(NODE_ID, 1).unwrap().speed_bps, Some(SPEED_100G));
}

#[test]
fn test_speed_change_failure_restores_old_port() {
    let (device, manager) = setup();
    let original = config(vec![port(1, AdminState::Enabled)]);
    push(&device, &manager, &original);

    let mut faster = port(1, AdminState::Enabled);
    faster.speed_bps = SPEED_100G;
    device.inject_failure(FailureRule::on(DeviceOp::CreatePort).times(1));

    let mut chassis = manager.lock_write();
    let err = chassis.push_chassis_config(&config(vec![faster])).unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidParam);
    assert_eq!(device.count(DeviceOp::DeletePort), 1);
    assert_eq!(device.count(DeviceOp::CreatePort), 2);
    assert_eq!(
        device.port_speed(Unit::new(0), SdkPortId::new(0)).map(|(s, _)| s),
        Some(SPEED_25G)
    );
    // The failed push left the previous generation live.
    assert_eq!(chassis.get_port_config(NODE_ID, 1).unwrap().speed_bps, Some(SPEED_25G));
}

#[test]
fn test_fec_change_is_unimplemented_without_device_calls() {
    let mut device = MockDevice::new();
    device
        .expect_resolve_port_key()
        .times(2)
        .returning(|_, _| Ok(SdkPortId::new(0)));
    device.expect_create_port().times(1).returning(|_, _, _, _, _| Ok(()));
    device.expect_enable_port().times(1).returning(|_, _| Ok(()));
    // The fresh push finds no leftovers of the port or its control port.
    let mut lookups = 0;
    device.expect_port_exists().times(3).returning(move |_, _| {
        lookups += 1;
        lookups > 2
    });
    device.expect_delete_port().never();
    device.expect_disable_port().never();
    device.expect_set_mtu().never();
    device.expect_set_autoneg_policy().never();
    device.expect_set_loopback_mode().never();

    let manager = ChassisManager::new(Arc::new(device));
    let mut chassis = manager.lock_write();
    chassis
        .push_chassis_config(&config(vec![port(1, AdminState::Enabled)]))
        .unwrap();

    let mut fec_on = port(1, AdminState::Enabled);
    fec_on.config_params.fec_mode = FecMode::On;
    let err = chassis.push_chassis_config(&config(vec![fec_on])).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Unimplemented);
}

#[test]
fn test_backend_errors_propagate_verbatim() {
    let mut device = MockDevice::new();
    device
        .expect_resolve_port_key()
        .returning(|_, _| Ok(SdkPortId::new(0)));
    device.expect_port_exists().return_const(false);
    device
        .expect_create_port()
        .returning(|_, _, _, _, _| Err(DeviceError::internal("pipeline not loaded")));

    let manager = ChassisManager::new(Arc::new(device));
    let err = manager
        .lock_write()
        .push_chassis_config(&config(vec![port(1, AdminState::Enabled)]))
        .unwrap_err();
    assert_eq!(
        err,
        chassis_manager::ChassisError::Device(DeviceError::internal("pipeline not loaded"))
    );
}

#[test]
fn test_admin_disabled_to_disabled_issues_nothing() {
    let (device, manager) = setup();
    let config = config(vec![port(1, AdminState::Disabled)]);
    push(&device, &manager, &config);

    manager.lock_write().push_chassis_config(&config).unwrap();
    assert!(device.mutating_calls().is_empty());
}

#[test]
fn test_admin_enabled_with_mtu_change_bounces_port() {
    let (device, manager) = setup();
    push(&device, &manager, &config(vec![port(1, AdminState::Enabled)]));

    let mut jumbo = port(1, AdminState::Enabled);
    jumbo.config_params.mtu = Some(9000);
    manager
        .lock_write()
        .push_chassis_config(&config(vec![jumbo]))
        .unwrap();

    assert_eq!(
        mutating_ops(&device),
        vec![DeviceOp::SetMtu, DeviceOp::DisablePort, DeviceOp::EnablePort]
    );
    assert_eq!(device.port_mtu(Unit::new(0), SdkPortId::new(0)), Some(9000));
}

#[test]
fn test_admin_disabled_to_enabled_enables_once() {
    let (device, manager) = setup();
    push(&device, &manager, &config(vec![port(1, AdminState::Disabled)]));

    let mut chassis = manager.lock_write();
    chassis
        .push_chassis_config(&config(vec![port(1, AdminState::Enabled)]))
        .unwrap();

    assert_eq!(mutating_ops(&device), vec![DeviceOp::EnablePort]);
    assert_eq!(
        chassis.get_port_config(NODE_ID, 1).unwrap().state,
        PortApplyState::Enabled
    );
}

#[test]
fn test_admin_enabled_to_disabled_disables_once() {
    let (device, manager) = setup();
    push(&device, &manager, &config(vec![port(1, AdminState::Enabled)]));

    manager
        .lock_write()
        .push_chassis_config(&config(vec![port(1, AdminState::Disabled)]))
        .unwrap();
    assert_eq!(mutating_ops(&device), vec![DeviceOp::DisablePort]);
}

#[test]
fn test_removed_ports_are_deleted_with_control_port() {
    let (device, manager) = setup();
    let mut with_tap = port(2, AdminState::Enabled);
    with_tap.config_params.control_port = Some("tap2".to_string());
    push(
        &device,
        &manager,
        &config(vec![port(1, AdminState::Enabled), with_tap]),
    );
    assert_eq!(device.created_ports(Unit::new(0)).len(), 3);

    let mut chassis = manager.lock_write();
    chassis
        .push_chassis_config(&config(vec![port(1, AdminState::Enabled)]))
        .unwrap();

    assert_eq!(device.count(DeviceOp::DeletePort), 2);
    assert_eq!(device.created_ports(Unit::new(0)), vec![SdkPortId::new(0)]);
    assert_eq!(chassis.get_sdk_port_id(NODE_ID, 2).unwrap_err().code(), ErrorCode::NotFound);
}

#[test]
fn test_push_recreates_port_broken_by_replay() {
    let (device, manager) = setup();
    let config = config(vec![port(1, AdminState::Enabled), port(2, AdminState::Enabled)]);
    push(&device, &manager, &config);

    device.reset();
    device.inject_failure(
        FailureRule::on(DeviceOp::EnablePort)
            .for_port(SdkPortId::new(4))
            .times(1),
    );
    assert!(manager.replay_ports_config(NODE_ID).is_err());
    assert_eq!(
        manager.lock_read().get_port_config(NODE_ID, 2).unwrap().state,
        PortApplyState::Broken
    );
    device.clear_calls();

    let mut chassis = manager.lock_write();
    chassis.push_chassis_config(&config).unwrap();

    // The half-replayed port is removed and added again; port 1 is untouched.
    assert_eq!(
        mutating_ops(&device),
        vec![DeviceOp::DeletePort, DeviceOp::CreatePort, DeviceOp::EnablePort]
    );
    assert_eq!(
        chassis.get_port_config(NODE_ID, 2).unwrap().state,
        PortApplyState::Enabled
    );
}
