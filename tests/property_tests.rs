//! Property tests for motion through the session and the composite stage.

mod common;

use chain_stage::driver::sim::{DriverCall, SimulatedChain};
use chain_stage::{CompositeStage, DeviceState, Millimeters, Position3D};
use common::{first_on_target, move_indices, open, TOLERANCE};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn waited_move_ends_on_target(target in 0.0f64..50.0, settle in 0u32..6) {
        let chain = SimulatedChain::with_linear_stages(1).settle_polls(settle);
        let mut session = open(&chain).unwrap();

        session.move_absolute(0, Millimeters(target), None, true).unwrap();

        prop_assert_eq!(session.state(0).unwrap(), DeviceState::Ready);
        prop_assert!(session.position(0, None).unwrap().approx_eq(Millimeters(target), TOLERANCE));
    }

    #[test]
    fn relative_moves_cancel(start in 10.0f64..40.0, delta in -10.0f64..10.0) {
        let chain = SimulatedChain::with_linear_stages(1).settle_polls(1);
        let mut session = open(&chain).unwrap();
        session.move_absolute(0, Millimeters(start), None, true).unwrap();

        session.move_relative(0, Millimeters(delta), None, true).unwrap();
        session.move_relative(0, Millimeters(-delta), None, true).unwrap();

        prop_assert!(session.position(0, None).unwrap().approx_eq(Millimeters(start), Millimeters(1e-9)));
    }

    #[test]
    fn moves_3d_are_issued_before_any_wait(
        x in 0.0f64..50.0,
        y in 0.0f64..50.0,
        z in 0.0f64..50.0,
        settle in 0u32..4,
    ) {
        let chain = SimulatedChain::with_linear_stages(3).settle_polls(settle);
        let mut stage = CompositeStage::with_default_axes(open(&chain).unwrap()).unwrap();
        chain.clear_calls();

        stage.move_absolute_3d(Position3D::new(x, y, z), true).unwrap();

        let calls = chain.calls();
        let moves = move_indices(&calls);
        prop_assert_eq!(moves.len(), 3);
        prop_assert!(moves.iter().all(|&i| Some(i) < first_on_target(&calls)));
        let targets: Vec<f64> = moves
            .iter()
            .filter_map(|&i| match &calls[i] {
                DriverCall::MoveAbsolute(_, _, t) => Some(*t),
                _ => None,
            })
            .collect();
        prop_assert_eq!(targets, vec![x, y, z]);
        prop_assert!(stage.position_3d().unwrap().approx_eq(&Position3D::new(x, y, z), TOLERANCE));
    }
}
