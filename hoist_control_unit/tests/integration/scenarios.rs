//! Integration test: end-to-end goal scenarios.
//!
//! Validates single-hop scoring moves, gated goals that wait for the
//! held-piece signal and idempotent goal requests.

use hoist_common::superstructure::state::SuperstructureState as S;
use hoist_control_unit::axis::detector::DetectionOverride;

use super::common::Rig;

#[test]
fn stow_to_l4_is_one_hop() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L4Coral);
    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::L4Coral)));

    assert!(rig.run_until(300, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L4Coral);
    let lift = rig.s.mechanisms().elevator().axis().position();
    let pivot = rig.s.mechanisms().dispenser().pivot().position();
    assert!((lift - 1.45).abs() < 1e-3, "lift at {lift}");
    assert!((pivot - (-48.0f64).to_radians()).abs() < 1e-3, "pivot at {pivot}");
}

#[test]
fn scoring_applies_roller_extras() {
    let mut rig = Rig::stowed();
    rig.drive_to(S::L3Coral, 300);
    assert!(rig.tunnel.is_neutral());
    rig.drive_to(S::L3CoralEject, 100);
    assert_eq!(rig.tunnel.commanded_volts(), Some(6.0));
}

#[test]
fn goal_equal_to_current_starts_nothing() {
    let mut rig = Rig::stowed();
    for _ in 0..10 {
        rig.s.set_goal(S::Stow);
        rig.tick(1);
        assert_eq!(rig.s.next(), None);
        assert_eq!(rig.s.active_edge(), None);
    }
}

#[test]
fn repeated_goal_matches_single_goal() {
    let mut once = Rig::stowed();
    let mut twice = Rig::stowed();
    once.s.set_goal(S::L2Coral);
    twice.s.set_goal(S::L2Coral);
    twice.s.set_goal(S::L2Coral);
    assert_eq!(once.s.state(), twice.s.state());

    once.tick(3);
    twice.tick(3);
    once.s.set_goal(S::L3Coral);
    twice.s.set_goal(S::L3Coral);
    twice.s.set_goal(S::L3Coral);
    assert_eq!(once.s.state(), twice.s.state());
}

#[test]
fn algae_goal_waits_for_algae() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::AlgaeStow);
    rig.tick(100);
    assert_eq!(rig.s.current(), S::Stow);
    assert_eq!(rig.s.next(), None);
    assert!(!rig.s.at_goal());

    rig.s
        .set_detection_overrides(DetectionOverride::None, DetectionOverride::ForceTrue);
    rig.tick(1);
    assert!(rig.s.has_algae());
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::AlgaeStow)));
    assert!(rig.run_until(300, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::AlgaeStow);
}

#[test]
fn reversed_scoring_passes_through_sentinel() {
    let mut rig = Rig::stowed();
    rig.s
        .set_detection_overrides(DetectionOverride::None, DetectionOverride::ForceTrue);
    rig.drive_to(S::AlgaeStow, 300);

    rig.s.set_goal(S::L3CoralReversed);
    let mut visited = vec![rig.s.current()];
    for _ in 0..600 {
        rig.tick(1);
        if visited.last() != Some(&rig.s.current()) {
            visited.push(rig.s.current());
        }
        if rig.s.at_goal() {
            break;
        }
    }
    assert_eq!(visited, vec![S::AlgaeStow, S::Unreversed, S::L3CoralReversed]);

    let lift = rig.s.mechanisms().elevator().axis().position();
    let pivot = rig.s.mechanisms().dispenser().pivot().position();
    assert!((lift - 0.85).abs() < 1e-3, "lift at {lift}");
    assert!((pivot - (-145.0f64).to_radians()).abs() < 1e-3, "pivot at {pivot}");
}

#[test]
fn held_algae_limits_lift_speed_except_when_throwing() {
    let mut rig = Rig::stowed();
    rig.s
        .set_detection_overrides(DetectionOverride::None, DetectionOverride::ForceTrue);
    rig.drive_to(S::AlgaeStow, 300);

    let lift_speed = |rig: &Rig| {
        rig.s.mechanisms().elevator().axis().setpoint().velocity.abs()
    };

    let mut held_max: f64 = 0.0;
    rig.s.set_goal(S::PreThrown);
    for _ in 0..200 {
        rig.tick(1);
        held_max = held_max.max(lift_speed(&rig));
        if rig.s.at_goal() {
            break;
        }
    }
    assert_eq!(rig.s.current(), S::PreThrown);
    assert!(held_max <= 1.5 + 1e-6, "held max {held_max}");
    assert!(held_max > 1.0, "held max {held_max}");

    rig.s.set_goal(S::Thrown);
    let mut throw_max: f64 = 0.0;
    for _ in 0..60 {
        rig.tick(1);
        throw_max = throw_max.max(lift_speed(&rig));
    }
    assert_eq!(rig.s.current(), S::Thrown);
    assert!(throw_max > 1.6, "throw max {throw_max}");
    assert!(!rig.s.mechanisms().force_fast());
}

#[test]
fn goal_function_follows_operator_selection() {
    use hoist_common::superstructure::state::{ReefLevel, scoring_state};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    let eject = Arc::new(AtomicBool::new(false));
    let mut rig = Rig::stowed();
    let flag = Arc::clone(&eject);
    rig.s.set_goal_fn(Box::new(move || {
        scoring_state(ReefLevel::L2, false, flag.load(Ordering::Relaxed))
    }));

    assert!(rig.run_until(300, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L2Coral);

    eject.store(true, Ordering::Relaxed);
    assert!(rig.run_until(100, |s| s.current() == S::L2CoralEject));
    assert_eq!(rig.tunnel.commanded_volts(), Some(6.0));

    // A fixed goal replaces the function.
    rig.drive_to(S::Stow, 300);
    eject.store(false, Ordering::Relaxed);
    rig.tick(10);
    assert_eq!(rig.s.goal(), S::Stow);
}
