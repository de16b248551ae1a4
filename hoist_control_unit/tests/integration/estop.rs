//! Integration test: sticky e-stop and advisories.
//!
//! A jammed pivot must latch the e-stop, neutralize both axes and stay
//! latched until a human acknowledges it. Disconnects only raise advisories.

use hoist_common::superstructure::config::{RunMode, SuperstructureConfig};
use hoist_common::superstructure::fault::Advisory;
use hoist_common::superstructure::state::SuperstructureState as S;
use hoist_control_unit::axis::Overrides;

use super::common::Rig;

/// Stowed rig heading for L4 with the pivot jammed, ticked until latched.
fn latched_rig() -> (Rig, Advisory) {
    let mut rig = Rig::stowed();
    rig.pivot.set_frozen(true);
    rig.s.set_goal(S::L4Coral);
    assert!(rig.run_until(30, |s| s.is_estopped()), "e-stop never latched");
    let advisories = rig.s.advisories();
    (rig, advisories)
}

fn press_and_release_disable(rig: &mut Rig) {
    rig.s.set_overrides(Overrides {
        disable: true,
        ..Overrides::default()
    });
    rig.tick(2);
    rig.s.set_overrides(Overrides::default());
    rig.tick(1);
}

#[test]
fn jammed_pivot_latches_estop() {
    let (mut rig, advisories) = latched_rig();
    assert!(advisories.contains(Advisory::PIVOT_OUT_OF_TOLERANCE));
    assert!(advisories.contains(Advisory::ESTOP_LATCHED));
    assert!(!advisories.contains(Advisory::ELEVATOR_OUT_OF_TOLERANCE));

    rig.tick(1);
    assert!(rig.lift.is_neutral());
    assert!(rig.pivot.is_neutral());
    // The hop is not committed while the axes are held.
    assert_eq!(rig.s.current(), S::Stow);
    assert_eq!(rig.s.next(), Some(S::L4Coral));
}

#[test]
fn latch_holds_after_fault_clears() {
    let (mut rig, _) = latched_rig();
    rig.pivot.set_frozen(false);
    for _ in 0..50 {
        rig.tick(1);
        assert!(rig.s.is_estopped());
        assert!(rig.lift.is_neutral());
    }
    assert!(rig.s.advisories().contains(Advisory::ESTOP_LATCHED));
    assert!(!rig.s.advisories().contains(Advisory::PIVOT_OUT_OF_TOLERANCE));
}

#[test]
fn disable_override_release_clears_latch() {
    let (mut rig, _) = latched_rig();
    rig.pivot.set_frozen(false);
    rig.tick(10);

    rig.s.set_overrides(Overrides {
        disable: true,
        ..Overrides::default()
    });
    rig.tick(2);
    assert!(rig.s.is_estopped(), "cleared on press instead of release");
    assert!(rig.s.advisories().contains(Advisory::DISABLE_OVERRIDE));

    rig.s.set_overrides(Overrides::default());
    rig.tick(1);
    assert!(!rig.s.is_estopped());

    assert!(rig.run_until(400, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L4Coral);
    let pivot = rig.s.mechanisms().dispenser().pivot().position();
    assert!((pivot - (-48.0f64).to_radians()).abs() < 1e-3, "pivot at {pivot}");
}

#[test]
fn explicit_clear_resumes_motion() {
    let (mut rig, _) = latched_rig();
    rig.pivot.set_frozen(false);
    rig.tick(5);
    rig.s.clear_estop();
    assert!(!rig.s.is_estopped());

    assert!(rig.run_until(400, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L4Coral);
}

#[test]
fn relatches_if_still_jammed() {
    let (mut rig, _) = latched_rig();
    press_and_release_disable(&mut rig);
    assert!(rig.run_until(30, |s| s.is_estopped()), "jam not detected again");
}

#[test]
fn disabled_robot_never_trips() {
    let mut rig = Rig::stowed();
    rig.pivot.set_frozen(true);
    rig.s.set_goal(S::L4Coral);
    for _ in 0..50 {
        rig.s.tick(false);
    }
    assert!(!rig.s.is_estopped());
    assert!(!rig.s.advisories().contains(Advisory::PIVOT_OUT_OF_TOLERANCE));
}

#[test]
fn simulation_reports_but_never_latches() {
    let config = SuperstructureConfig {
        run_mode: RunMode::Sim,
        ..SuperstructureConfig::default()
    };
    let mut rig = Rig::stowed_with(&config);
    rig.pivot.set_frozen(true);
    rig.s.set_goal(S::L4Coral);
    assert!(rig.run_until(30, |s| {
        s.advisories().contains(Advisory::PIVOT_OUT_OF_TOLERANCE)
    }));
    rig.tick(20);
    assert!(!rig.s.is_estopped());
    assert!(!rig.pivot.is_neutral());
    assert!(rig.s.advisories().contains(Advisory::PIVOT_OUT_OF_TOLERANCE));
}

#[test]
fn disconnects_raise_advisories_only() {
    let mut rig = Rig::stowed();
    rig.tunnel.set_connected(false);
    rig.gripper.set_connected(false);
    rig.pivot.set_encoder_connected(false);
    rig.lift.set_motor_connected(false);
    rig.tick(20);

    let flags = rig.s.advisories();
    assert!(flags.contains(Advisory::TUNNEL_DISCONNECTED));
    assert!(flags.contains(Advisory::GRIPPER_DISCONNECTED));
    assert!(flags.contains(Advisory::PIVOT_ENCODER_DISCONNECTED));
    assert!(flags.contains(Advisory::ELEVATOR_DISCONNECTED));
    assert!(!flags.contains(Advisory::PIVOT_MOTOR_DISCONNECTED));
    assert!(!rig.s.is_estopped());
    assert_eq!(rig.s.current(), S::Stow);

    rig.tunnel.set_connected(true);
    rig.gripper.set_connected(true);
    rig.pivot.set_encoder_connected(true);
    rig.lift.set_motor_connected(true);
    rig.tick(2);
    let flags = rig.s.advisories();
    assert!(!flags.intersects(
        Advisory::TUNNEL_DISCONNECTED
            | Advisory::GRIPPER_DISCONNECTED
            | Advisory::PIVOT_ENCODER_DISCONNECTED
            | Advisory::ELEVATOR_DISCONNECTED
    ));
}
