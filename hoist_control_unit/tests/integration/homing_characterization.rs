//! Integration test: start-up paths, static characterization and the
//! shipped configuration file.

use std::path::Path;

use hoist_common::superstructure::config::{
    AxisConfig, HomingConfig, RunMode, SuperstructureConfig,
};
use hoist_common::superstructure::state::SuperstructureState as S;
use hoist_control_unit::axis::detector::DetectionOverride;
use hoist_control_unit::axis::homing::HomingState;
use hoist_control_unit::config::load_config;
use hoist_control_unit::mechanism::CharacterizationTarget;

use super::common::Rig;

#[test]
fn homes_from_raised_lift() {
    let mut rig = Rig::new(&SuperstructureConfig::default());
    rig.lift.teleport(0.5);
    assert_eq!(rig.s.current(), S::Start);

    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Start, S::Stow)));
    assert!(rig.run_until(500, |s| s.at_goal()), "homing never finished");
    assert_eq!(rig.s.current(), S::Stow);
    assert_eq!(
        rig.s.mechanisms().elevator().homing_state(),
        HomingState::Done
    );

    // Home is the physical hard stop.
    let offset = rig.lift.physical_position() - rig.lift.position();
    assert!(offset.abs() < 0.01, "offset {offset}");
    // Stowed below the rest height, the lift sits on the stop unpowered.
    rig.tick(5);
    assert!(rig.lift.is_neutral());
    assert!(rig.s.mechanisms().elevator().axis().is_resting());
}

#[test]
fn lift_is_idle_until_homed() {
    let mut rig = Rig::new(&SuperstructureConfig::default());
    rig.lift.teleport(0.5);
    for _ in 0..10 {
        rig.s.tick(false);
    }
    assert!(rig.lift.is_neutral());
    assert!((rig.lift.physical_position() - 0.5).abs() < 1e-9);
    assert!(!rig.s.mechanisms().elevator().axis().is_homed());
}

#[test]
fn homing_can_be_requested_again() {
    let mut rig = Rig::stowed();
    rig.s.request_homing();
    assert_eq!(rig.s.current(), S::Start);
    assert_eq!(rig.s.next(), None);

    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Start, S::Stow)));
    assert!(rig.run_until(500, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::Stow);
}

#[test]
fn auto_start_homes_in_place_with_coral() {
    let mut rig = Rig::new(&SuperstructureConfig::default());
    rig.lift.teleport(0.3);
    rig.s.auto_start();
    assert_eq!(rig.s.current(), S::AutoStart);

    assert!(rig.run_until(200, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::Stow);
    assert!(rig.s.has_coral());

    // No hard-stop search: wherever the lift was is now zero.
    let offset = rig.lift.physical_position() - rig.lift.position();
    assert!((offset - 0.3).abs() < 0.01, "offset {offset}");
    assert_eq!(
        rig.s.mechanisms().elevator().homing_state(),
        HomingState::Idle
    );
}

#[test]
fn pivot_characterization_finds_breakaway() {
    let mut rig = Rig::stowed();
    rig.s.start_characterization(CharacterizationTarget::Pivot);
    assert_eq!(rig.s.current(), S::Characterization);

    rig.tick(100);
    assert_eq!(rig.s.current(), S::Characterization);
    assert_eq!(rig.s.next(), None);
    assert!(rig.s.mechanisms().characterization_running());

    let result = rig.s.stop_characterization().unwrap();
    assert_eq!(result.axis, "pivot");
    let breakaway = result.breakaway_output.unwrap();
    assert!(breakaway > 0.05 && breakaway < 0.2, "breakaway {breakaway}");
    assert!(rig.s.mechanisms().characterization_mode());

    rig.s.set_characterization_mode(false);
    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Characterization, S::Stow)));
    assert!(rig.run_until(300, |s| s.at_goal()));
    assert_eq!(rig.s.current(), S::Stow);
    let pivot = rig.s.mechanisms().dispenser().pivot().position();
    assert!((pivot - (-18.0f64).to_radians()).abs() < 1e-3, "pivot at {pivot}");
}

#[test]
fn characterization_preempts_a_running_hop() {
    let mut rig = Rig::stowed();
    rig.s.set_goal(S::L4Coral);
    rig.tick(3);
    assert_eq!(rig.s.next(), Some(S::L4Coral));

    rig.s.set_characterization_mode(true);
    assert_eq!(rig.s.current(), S::Characterization);
    assert_eq!(rig.s.active_edge(), None);
    rig.tick(20);
    assert_eq!(rig.s.current(), S::Characterization);
    assert_eq!(rig.s.next(), None);

    // Leaving resumes toward the goal through STOW.
    rig.s.set_characterization_mode(false);
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
    assert_eq!(visited, vec![S::Characterization, S::Stow, S::L4Coral]);
}

#[test]
fn leaving_characterization_before_homing_finishes_rehomes_lift() {
    let mut rig = Rig::new(&SuperstructureConfig::default());
    rig.lift.teleport(0.5);
    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Start, S::Stow)));

    // Cuts the homing edge short.
    rig.s.set_characterization_mode(true);
    rig.tick(10);
    assert!(!rig.s.mechanisms().elevator().axis().is_homed());
    assert!(rig.lift.is_neutral());

    rig.s.set_characterization_mode(false);
    rig.s.set_goal(S::L4Coral);
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
    assert_eq!(visited, vec![S::Characterization, S::Stow, S::L4Coral]);
    assert_eq!(
        rig.s.mechanisms().elevator().homing_state(),
        HomingState::Done
    );
    let offset = rig.lift.physical_position() - rig.lift.position();
    assert!(offset.abs() < 0.01, "offset {offset}");
    assert!((rig.lift.physical_position() - 1.45).abs() < 1e-3);
}

fn pivot_homing_config() -> SuperstructureConfig {
    let mut config = SuperstructureConfig::default();
    config.pivot.homing = Some(HomingConfig::pivot_default());
    config
}

fn pivot_rehome_finished(s: &hoist_control_unit::superstructure::Superstructure) -> bool {
    let dispenser = s.mechanisms().dispenser();
    !dispenser.is_homing() && dispenser.pivot().at_goal()
}

#[test]
fn start_edge_homes_pivot_alongside_lift() {
    let config = pivot_homing_config();
    let mut rig = Rig::new(&config);
    rig.lift.teleport(0.3);
    rig.pivot.set_encoder_offset(0.3);

    rig.tick(1);
    assert_eq!(rig.s.active_edge(), Some((S::Start, S::Stow)));
    assert!(rig.s.mechanisms().elevator().is_homing());
    assert!(rig.s.mechanisms().dispenser().is_homing());

    assert!(rig.run_until(500, |s| s.current() == S::Stow));
    assert_eq!(
        rig.s.mechanisms().elevator().homing_state(),
        HomingState::Done
    );
    // The hop only finished once the pivot stop had been found.
    let error = rig.pivot.physical_position() - rig.pivot.position();
    assert!(error.abs() < 1e-9, "pivot frame error {error}");
    let stow = (-18.0f64).to_radians();
    assert!((rig.pivot.physical_position() - stow).abs() < 1e-3);
}

#[test]
fn pivot_rehomes_when_settling_empty_in_stow() {
    let config = pivot_homing_config();
    let mut rig = Rig::stowed_with(&config);
    assert!(rig.run_until(200, pivot_rehome_finished));
    let stow = (-18.0f64).to_radians();

    // Encoder slips; a coral in the tunnel blocks the re-home.
    rig.pivot.set_encoder_offset(0.2);
    rig.s
        .set_detection_overrides(DetectionOverride::ForceTrue, DetectionOverride::None);
    rig.drive_to(S::L2Coral, 300);
    rig.drive_to(S::Stow, 300);
    rig.tick(5);
    assert!(!rig.s.mechanisms().dispenser().is_homing());
    let error = rig.pivot.physical_position() - rig.pivot.position();
    assert!((error - 0.2).abs() < 1e-9, "pivot frame error {error}");

    // Empty again: the pivot finds its stop and comes back to STOW.
    rig.s
        .set_detection_overrides(DetectionOverride::None, DetectionOverride::None);
    rig.tick(1);
    assert!(rig.s.mechanisms().dispenser().is_homing());
    assert!(rig.run_until(200, pivot_rehome_finished));
    let error = rig.pivot.physical_position() - rig.pivot.position();
    assert!(error.abs() < 1e-9, "pivot frame error {error}");
    assert!((rig.pivot.physical_position() - stow).abs() < 1e-3);
    assert_eq!(rig.s.current(), S::Stow);
}

#[test]
fn shipped_config_matches_reference_values() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/superstructure.toml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.run_mode, RunMode::Sim);
    assert_eq!(config.elevator, AxisConfig::elevator_default());

    let pivot = AxisConfig::pivot_default();
    assert!((config.pivot.min_position - pivot.min_position).abs() < 1e-6);
    assert!((config.pivot.max_position - pivot.max_position).abs() < 1e-6);
    assert!(
        (config.pivot.constraints.max_velocity - pivot.constraints.max_velocity).abs() < 1e-6
    );
    assert_eq!(config.cycle.period_s, 0.02);
    assert!(config.poses.is_empty());

    let rig = Rig::stowed_with(&config);
    assert_eq!(rig.s.current(), S::Stow);
}
