//! Integration test: live re-routing of in-flight transitions.
//!
//! Validates skip-ahead, back-out and keep decisions when the goal changes
//! mid-hop, and that heavy goal churn never leaves the scheduler pointing
//! at an edge the graph does not contain.

use hoist_common::superstructure::state::{AlgaeGate, SuperstructureState as S};
use hoist_control_unit::axis::detector::DetectionOverride;

use super::common::Rig;

#[test]
fn skip_ahead_to_new_scoring_level() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L2Coral);
    rig.tick(3);
    assert_eq!(rig.s.next(), Some(S::L2Coral));

    rig.s.set_goal(S::L3Coral);
    assert_eq!(rig.s.current(), S::Stow);
    assert_eq!(rig.s.next(), Some(S::L3Coral));
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::L3Coral)));

    assert!(rig.run_until(300, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L3Coral);
}

#[test]
fn back_out_when_waypoint_has_no_onward_edge() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::Intake);
    rig.tick(2);
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::Intake)));

    // INTAKE only links back to STOW, so the hop is reversed.
    rig.s.set_goal(S::L1Coral);
    assert_eq!(rig.s.current(), S::Intake);
    assert_eq!(rig.s.next(), Some(S::Stow));
    assert_eq!(rig.s.active_edge(), Some((S::Intake, S::Stow)));

    let mut visited = vec![rig.s.current()];
    for _ in 0..400 {
        rig.tick(1);
        if visited.last() != Some(&rig.s.current()) {
            visited.push(rig.s.current());
        }
        if rig.s.at_goal() {
            break;
        }
    }
    assert_eq!(visited, vec![S::Intake, S::Stow, S::L1Coral]);
}

#[test]
fn keep_hop_that_already_serves_new_goal() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L4Coral);
    rig.tick(2);
    let before = *rig.s.state();

    rig.s.set_goal(S::L4CoralEject);
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::L4Coral)));
    assert_eq!(rig.s.current(), before.current);
    assert_eq!(rig.s.next(), before.next);

    assert!(rig.run_until(400, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L4CoralEject);
}

#[test]
fn finished_hop_is_committed_before_rerouting() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L1Coral);
    assert!(rig.run_until(300, |s| s.current() == S::L1Coral));

    rig.s.set_goal(S::L2Coral);
    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::L1Coral, S::L2Coral)));
}

#[test]
fn losing_algae_mid_hop_skips_ahead_over_recovery_edge() {
    let mut rig = Rig::stowed();
    rig.s
        .set_detection_overrides(DetectionOverride::None, DetectionOverride::ForceTrue);
    rig.s.set_goal(S::AlgaeStow);
    rig.tick(2);
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::AlgaeStow)));

    rig.s
        .set_detection_overrides(DetectionOverride::None, DetectionOverride::ForceFalse);
    rig.tick(1);
    assert!(!rig.s.has_algae());
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::AlgaeStow)));

    // ALGAE_STOW -> STOW is open without algae, and the recovery edge
    // ALGAE_STOW -> L2_CORAL continues from the waypoint.
    let recovery = rig.s.graph().edge(S::AlgaeStow, S::L2Coral).unwrap();
    assert_eq!(recovery.gate, AlgaeGate::NoAlgae);
    rig.s.set_goal(S::L2Coral);
    assert_eq!(rig.s.current(), S::Stow);
    assert_eq!(rig.s.next(), Some(S::L2Coral));
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::L2Coral)));

    let mut visited = vec![rig.s.current()];
    for _ in 0..400 {
        rig.tick(1);
        if visited.last() != Some(&rig.s.current()) {
            visited.push(rig.s.current());
        }
        if rig.s.at_goal() {
            break;
        }
    }
    assert_eq!(visited, vec![S::Stow, S::L2Coral]);
    assert_eq!(rig.s.current(), S::L2Coral);
    assert_eq!(rig.s.active_edge(), None);
}

#[test]
fn goal_churn_keeps_scheduler_consistent() {
    let goals = [
        S::L4Coral,
        S::Intake,
        S::L1Coral,
        S::Stow,
        S::L3Coral,
        S::GoodbyeCoral,
        S::AlgaeL2Intake,
        S::L2CoralEject,
    ];
    let mut rig = Rig::stowed();
    for i in 0..400 {
        rig.s.set_goal(goals[(i / 3) % goals.len()]);
        rig.tick(1);
    }
    rig.s.set_goal(S::L4Coral);
    assert!(rig.run_until(600, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::L4Coral);
    assert!(!rig.s.is_estopped());
}

#[test]
fn goal_change_while_idle_is_recorded_only() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L2Coral);
    assert_eq!(rig.s.goal(), S::L2Coral);
    assert_eq!(rig.s.next(), None);
    assert_eq!(rig.s.active_edge(), None);
}

#[test]
fn disable_abandons_hop_and_resumes_from_current() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L4Coral);
    rig.tick(3);
    assert_eq!(rig.s.next(), Some(S::L4Coral));

    for _ in 0..5 {
        rig.s.tick(false);
    }
    assert_eq!(rig.s.current(), S::Stow);
    assert_eq!(rig.s.next(), None);
    assert_eq!(rig.s.active_edge(), None);
    assert!(rig.lift.is_neutral());

    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Stow, S::L4Coral)));
    assert!(rig.run_until(400, |s| s.at_goal()));
}
