//! Integration tests for CompositeStage.

mod common;

use chain_stage::driver::sim::{DriverCall, SimDevice, SimulatedChain};
use chain_stage::{
    parse_config, AxisError, AxisMap, CompositeStage, ConfigError, DeviceState, DriverOp, Error,
    Millimeters, Position3D, StageAxis,
};
use common::{addr, first_on_target, move_indices, open, SimSession, TOLERANCE};
use embedded_hal_mock::eh1::delay::NoopDelay;

fn stage(chain: &SimulatedChain) -> CompositeStage<SimulatedChain, NoopDelay> {
    let session: SimSession = open(chain).unwrap();
    CompositeStage::with_default_axes(session).unwrap()
}

#[test]
fn move_3d_reaches_target() {
    let chain = SimulatedChain::with_linear_stages(3).settle_polls(4);
    let mut stage = stage(&chain);

    stage.move_absolute_3d(Position3D::new(20.0, 20.0, 20.0), true).unwrap();

    let position = stage.position_3d().unwrap();
    assert!(position.approx_eq(&Position3D::new(20.0, 20.0, 20.0), TOLERANCE));
    for index in 0..3 {
        assert_eq!(stage.session().state(index).unwrap(), DeviceState::Ready);
    }
}

#[test]
fn move_3d_issues_all_moves_before_waiting() {
    let chain = SimulatedChain::with_linear_stages(3).settle_polls(2);
    let mut stage = stage(&chain);
    chain.clear_calls();

    stage.move_absolute_3d(Position3D::new(5.0, 10.0, 15.0), true).unwrap();

    let calls = chain.calls();
    let moves = move_indices(&calls);
    assert_eq!(moves, vec![0, 1, 2]);
    assert_eq!(
        &calls[..3],
        &[
            DriverCall::MoveAbsolute(addr(1), "1".to_string(), 5.0),
            DriverCall::MoveAbsolute(addr(2), "1".to_string(), 10.0),
            DriverCall::MoveAbsolute(addr(3), "1".to_string(), 15.0),
        ]
    );
    assert_eq!(first_on_target(&calls), Some(3));

    // Waits run X, then Y, then Z.
    let polled: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            DriverCall::OnTarget(a, _) => Some(*a),
            _ => None,
        })
        .collect();
    let first_y = polled.iter().position(|a| *a == addr(2)).unwrap();
    let first_z = polled.iter().position(|a| *a == addr(3)).unwrap();
    assert!(polled[..first_y].iter().all(|a| *a == addr(1)));
    assert!(polled[first_y..first_z].iter().all(|a| *a == addr(2)));
    assert!(polled[first_z..].iter().all(|a| *a == addr(3)));
}

#[test]
fn move_3d_without_wait_leaves_devices_moving() {
    let chain = SimulatedChain::with_linear_stages(3).settle_polls(2);
    let mut stage = stage(&chain);
    chain.clear_calls();

    stage.move_absolute_3d(Position3D::new(1.0, 2.0, 3.0), false).unwrap();

    assert_eq!(chain.count(DriverOp::MoveAbsolute), 3);
    assert_eq!(chain.count(DriverOp::OnTarget), 0);
    for index in 0..3 {
        assert_eq!(stage.session().state(index).unwrap(), DeviceState::Moving);
    }

    stage.wait_all().unwrap();
    let position = stage.position_3d().unwrap();
    assert!(position.approx_eq(&Position3D::new(1.0, 2.0, 3.0), TOLERANCE));
}

#[test]
fn relative_3d_move() {
    let chain = SimulatedChain::with_linear_stages(3);
    let mut stage = stage(&chain);

    stage.move_absolute_3d(Position3D::new(10.0, 20.0, 30.0), true).unwrap();
    stage.move_relative_3d(Position3D::new(1.5, -2.5, 0.0), true).unwrap();

    let position = stage.position_3d().unwrap();
    assert!(position.approx_eq(&Position3D::new(11.5, 17.5, 30.0), TOLERANCE));
}

#[test]
fn single_axis_operations() {
    let chain = SimulatedChain::with_linear_stages(3).settle_polls(1);
    let mut stage = stage(&chain);

    stage.move_absolute(StageAxis::Y, Millimeters(8.0), true).unwrap();
    stage.move_relative(StageAxis::Y, Millimeters(2.0), false).unwrap();
    stage.wait(StageAxis::Y).unwrap();

    assert_eq!(stage.position(StageAxis::Y).unwrap(), Millimeters(10.0));
    assert_eq!(stage.position(StageAxis::X).unwrap(), Millimeters(0.0));
    assert_eq!(chain.position_of(addr(2)), Some(10.0));
}

#[test]
fn custom_binding_from_config() {
    let config = parse_config(
        r#"
[stage.axes]
x = 2
y = 0
z = 1
"#,
    )
    .unwrap();
    let chain = SimulatedChain::with_linear_stages(3);
    let mut stage = CompositeStage::from_config(open(&chain).unwrap(), &config.stage).unwrap();

    assert_eq!(stage.device_index(StageAxis::X), 2);
    stage.move_absolute(StageAxis::X, Millimeters(7.0), true).unwrap();
    assert_eq!(chain.position_of(addr(3)), Some(7.0));
    assert_eq!(chain.position_of(addr(1)), Some(0.0));
}

#[test]
fn duplicate_binding_is_rejected() {
    assert!(matches!(
        AxisMap::new(0, 1, 1),
        Err(Error::Config(ConfigError::DuplicateAxisBinding(1)))
    ));
}

#[test]
fn too_few_devices() {
    let chain = SimulatedChain::with_linear_stages(2);
    let result = CompositeStage::with_default_axes(open(&chain).unwrap());

    assert_eq!(
        result.unwrap_err(),
        Error::InvalidDeviceIndex { index: 2, count: 2 }
    );
    // The session was dropped with the stage, releasing the chain.
    assert!(!chain.is_open());
}

#[test]
fn bound_device_with_several_axes() {
    let chain = SimulatedChain::new()
        .with_device(SimDevice::linear_stage("x", 0.0, 50.0))
        .with_device(SimDevice::with_axes("yz", &["1", "2"], 0.0, 50.0))
        .with_device(SimDevice::linear_stage("z", 0.0, 50.0));
    let result = CompositeStage::with_default_axes(open(&chain).unwrap());

    assert!(matches!(
        result,
        Err(Error::InvalidAxis(AxisError::Ambiguous { index: 1, count: 2 }))
    ));
}

#[test]
fn close_through_stage() {
    let chain = SimulatedChain::with_linear_stages(3);
    let mut stage = stage(&chain);

    stage.close().unwrap();
    assert!(!chain.is_open());
    assert_eq!(stage.position_3d().unwrap_err(), Error::SessionClosed);

    drop(stage);
    assert_eq!(chain.count(DriverOp::CloseChain), 1);
}

#[test]
fn into_session_keeps_chain_open() {
    let chain = SimulatedChain::with_linear_stages(3);
    let session = stage(&chain).into_session();

    assert!(chain.is_open());
    assert_eq!(session.len(), 3);
}

#[test]
fn rejected_binding_hands_session_back() {
    let chain = SimulatedChain::with_linear_stages(2);
    let session = open(&chain).unwrap();

    assert_eq!(
        CompositeStage::check_binding(&session, &AxisMap::default()).unwrap_err(),
        Error::InvalidDeviceIndex { index: 2, count: 2 }
    );

    let (err, mut session) = match CompositeStage::try_new(session, AxisMap::default()) {
        Ok(_) => panic!("binding to a missing device must fail"),
        Err(rejected) => rejected,
    };
    assert_eq!(err, Error::InvalidDeviceIndex { index: 2, count: 2 });
    assert!(chain.is_open());
    assert_eq!(chain.count(DriverOp::CloseChain), 0);

    session.move_absolute(1, Millimeters(4.0), None, true).unwrap();
    assert_eq!(chain.position_of(addr(2)), Some(4.0));
}
