//! Superstructure mechanisms.
//!
//! [`Mechanisms`] owns the lift and the end effector and is the only
//! [`Actuators`] implementation: edge tasks reach the hardware exclusively
//! through it. It also owns the optional slam mechanism goal, the
//! force-fast flag and the static characterization session.

pub mod dispenser;
pub mod elevator;

use hoist_common::hal::{AxisIo, RollerIo};
use hoist_common::superstructure::config::{CharacterizationConfig, SuperstructureConfig};
use hoist_common::superstructure::state::{GripperGoal, SlamGoal, TunnelGoal};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::axis::AxisContext;
use crate::axis::characterization::{CharacterizationResult, StaticCharacterization};
use crate::axis::profiled::{GoalSource, ProfiledAxis};
use crate::task::runner::Actuators;
use dispenser::Dispenser;
use elevator::Elevator;

/// Errors raised while assembling the mechanisms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MechanismError {
    /// The named axis needs a homing section.
    #[error("Axis {0} has no homing configuration")]
    MissingHoming(&'static str),
}

/// Axis targeted by static characterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterizationTarget {
    Elevator,
    Pivot,
}

struct CharacterizationSession {
    target: CharacterizationTarget,
    run: StaticCharacterization,
}

pub struct Mechanisms {
    elevator: Elevator,
    dispenser: Dispenser,
    elevator_characterization: CharacterizationConfig,
    pivot_characterization: CharacterizationConfig,
    characterization: Option<CharacterizationSession>,
    characterization_mode: bool,
    slam_installed: bool,
    slam_goal: SlamGoal,
    force_fast: bool,
}

impl Mechanisms {
    pub fn new(
        elevator: Box<dyn AxisIo>,
        pivot: Box<dyn AxisIo>,
        tunnel: Box<dyn RollerIo>,
        gripper: Box<dyn RollerIo>,
        config: &SuperstructureConfig,
    ) -> Result<Self, MechanismError> {
        Ok(Self {
            elevator: Elevator::new(elevator, config)?,
            dispenser: Dispenser::new(pivot, tunnel, gripper, config),
            elevator_characterization: config.elevator.characterization,
            pivot_characterization: config.pivot.characterization,
            characterization: None,
            characterization_mode: false,
            slam_installed: config.slam_installed,
            slam_goal: SlamGoal::Retract,
            force_fast: false,
        })
    }

    /// Tick both mechanisms and any running characterization.
    pub fn tick(&mut self, ctx: &AxisContext) {
        self.elevator.tick(ctx);
        self.dispenser.tick(ctx);
        if let Some(session) = self.characterization.as_mut() {
            let axis = match session.target {
                CharacterizationTarget::Elevator => self.elevator.axis_mut(),
                CharacterizationTarget::Pivot => self.dispenser.pivot_mut(),
            };
            session.run.tick(axis, ctx);
        }
    }

    /// Start static characterization of `target`, ending any previous run.
    pub fn start_characterization(&mut self, target: CharacterizationTarget) {
        self.stop_characterization();
        let (config, axis) = match target {
            CharacterizationTarget::Elevator => {
                (self.elevator_characterization, self.elevator.axis_mut())
            }
            CharacterizationTarget::Pivot => {
                (self.pivot_characterization, self.dispenser.pivot_mut())
            }
        };
        let run = StaticCharacterization::start(config, axis);
        self.characterization = Some(CharacterizationSession { target, run });
    }

    /// End the running characterization and restore closed-loop control.
    pub fn stop_characterization(&mut self) -> Option<CharacterizationResult> {
        let session = self.characterization.take()?;
        let axis = match session.target {
            CharacterizationTarget::Elevator => self.elevator.axis_mut(),
            CharacterizationTarget::Pivot => self.dispenser.pivot_mut(),
        };
        Some(session.run.finish(axis))
    }

    pub fn characterization_running(&self) -> bool {
        self.characterization.is_some()
    }

    pub fn set_characterization_mode(&mut self, on: bool) {
        if on != self.characterization_mode {
            info!("Characterization mode {}", if on { "on" } else { "off" });
        }
        self.characterization_mode = on;
    }

    pub fn characterization_mode(&self) -> bool {
        self.characterization_mode
    }

    /// Forward the aggregated e-stop to both axes.
    pub fn set_estopped(&mut self, estopped: bool) {
        self.elevator.axis_mut().set_estopped(estopped);
        self.dispenser.pivot_mut().set_estopped(estopped);
    }

    /// True when either axis has debounced an out-of-tolerance condition.
    pub fn should_estop(&self) -> bool {
        self.elevator.axis().should_estop() || self.dispenser.pivot().should_estop()
    }

    pub fn force_fast(&self) -> bool {
        self.force_fast
    }

    pub fn slam_goal(&self) -> SlamGoal {
        self.slam_goal
    }

    pub fn elevator(&self) -> &Elevator {
        &self.elevator
    }

    pub fn elevator_mut(&mut self) -> &mut Elevator {
        &mut self.elevator
    }

    pub fn dispenser(&self) -> &Dispenser {
        &self.dispenser
    }

    pub fn dispenser_mut(&mut self) -> &mut Dispenser {
        &mut self.dispenser
    }

    fn lift(&mut self) -> &mut ProfiledAxis {
        self.elevator.axis_mut()
    }
}

impl Actuators for Mechanisms {
    fn set_lift_goal(&mut self, goal: GoalSource) {
        self.lift().set_goal(goal);
    }

    fn set_pivot_goal(&mut self, goal: f64) {
        self.dispenser.pivot_mut().set_goal(GoalSource::Fixed(goal));
    }

    fn at_goal(&self) -> bool {
        self.elevator.axis().at_goal() && self.dispenser.pivot().at_goal()
    }

    fn apply_extras(&mut self, tunnel: TunnelGoal, gripper: GripperGoal) {
        self.dispenser.set_roller_goals(tunnel, gripper);
    }

    fn stop_rollers(&mut self) {
        self.dispenser
            .set_roller_goals(TunnelGoal::Idle, GripperGoal::Idle);
    }

    fn start_homing(&mut self, only_unhomed: bool) {
        if !only_unhomed || !self.elevator.axis().is_homed() {
            self.elevator.start_homing();
        }
        if !only_unhomed || !self.dispenser.pivot().is_homed() {
            self.dispenser.start_homing();
        }
    }

    fn homing_complete(&self) -> bool {
        !self.elevator.is_homing()
            && !self.dispenser.is_homing()
            && self.elevator.axis().is_homed()
            && self.dispenser.pivot().is_homed()
    }

    fn cancel_homing(&mut self) {
        self.elevator.cancel_homing();
        self.dispenser.cancel_homing();
    }

    fn set_home_here(&mut self) {
        self.elevator.set_home_here();
    }

    fn mark_coral_held(&mut self) {
        self.dispenser.mark_coral_held();
    }

    fn set_force_fast(&mut self, force: bool) {
        if force != self.force_fast {
            debug!("Force fast: {force}");
        }
        self.force_fast = force;
    }

    fn characterization_active(&self) -> bool {
        self.characterization_mode
    }

    fn set_slam_goal(&mut self, goal: SlamGoal) {
        if self.slam_installed {
            self.slam_goal = goal;
        } else {
            debug!("Slam not installed, ignoring {goal:?}");
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::characterization::CharacterizationPhase;
    use crate::axis::homing::HomingState;
    use hoist_common::superstructure::config::HomingConfig;
    use hoist_hal::{SimAxis, SimAxisHandle, SimAxisParams, SimRoller, SimRollerParams};

    const DT: f64 = 0.02;

    fn mechanisms(config: &SuperstructureConfig) -> (Mechanisms, SimAxisHandle, SimAxisHandle) {
        let (lift, lift_handle) =
            SimAxis::new(SimAxisParams::from_axis_config("elevator", &config.elevator, DT));
        let (pivot, pivot_handle) =
            SimAxis::new(SimAxisParams::from_axis_config("pivot", &config.pivot, DT));
        let (tunnel, _) = SimRoller::new(SimRollerParams::new("tunnel"));
        let (gripper, _) = SimRoller::new(SimRollerParams::new("gripper"));
        let m = Mechanisms::new(
            Box::new(lift),
            Box::new(pivot),
            Box::new(tunnel),
            Box::new(gripper),
            config,
        )
        .unwrap();
        (m, lift_handle, pivot_handle)
    }

    #[test]
    fn at_goal_needs_both_axes() {
        let config = SuperstructureConfig::default();
        let (mut m, _, _) = mechanisms(&config);
        let ctx = AxisContext::enabled(DT);
        m.set_home_here();
        m.set_lift_goal(GoalSource::Fixed(0.3));
        m.set_pivot_goal(0.2);
        assert!(!m.at_goal());
        for _ in 0..100 {
            m.tick(&ctx);
        }
        assert!(m.at_goal());
        m.set_pivot_goal(0.0);
        assert!(!m.at_goal());
    }

    #[test]
    fn slam_goal_ignored_when_not_installed() {
        let mut config = SuperstructureConfig::default();
        let (mut m, _, _) = mechanisms(&config);
        m.set_slam_goal(SlamGoal::HalfOut);
        assert_eq!(m.slam_goal(), SlamGoal::Retract);

        config.slam_installed = true;
        let (mut m, _, _) = mechanisms(&config);
        m.set_slam_goal(SlamGoal::HalfOut);
        assert_eq!(m.slam_goal(), SlamGoal::HalfOut);
    }

    #[test]
    fn pivot_characterization_session() {
        let config = SuperstructureConfig::default();
        let (mut m, _, pivot) = mechanisms(&config);
        let ctx = AxisContext::enabled(DT);
        m.start_characterization(CharacterizationTarget::Pivot);
        assert!(m.dispenser().pivot().is_suspended());
        for _ in 0..100 {
            m.tick(&ctx);
        }
        let session = m.characterization.as_ref().unwrap();
        assert_eq!(session.run.phase(), CharacterizationPhase::Holding);
        assert!(pivot.is_neutral());

        let result = m.stop_characterization().unwrap();
        assert_eq!(result.axis, "pivot");
        assert!(result.breakaway_output.is_some());
        assert!(!m.dispenser().pivot().is_suspended());
        assert!(m.stop_characterization().is_none());
    }

    #[test]
    fn homing_covers_both_axes() {
        let mut config = SuperstructureConfig::default();
        config.pivot.homing = Some(HomingConfig::pivot_default());
        let (mut m, lift, _) = mechanisms(&config);
        let ctx = AxisContext::enabled(DT);
        lift.teleport(0.2);
        assert!(!m.homing_complete());

        m.start_homing(false);
        assert!(m.elevator().is_homing());
        assert!(m.dispenser().is_homing());
        for _ in 0..200 {
            m.tick(&ctx);
            if m.homing_complete() {
                break;
            }
        }
        assert!(m.homing_complete());
        assert_eq!(m.elevator().homing_state(), HomingState::Done);
        assert_eq!(m.dispenser().homing_state(), Some(HomingState::Done));
    }

    #[test]
    fn only_unhomed_axes_are_rehomed() {
        let mut config = SuperstructureConfig::default();
        config.pivot.homing = Some(HomingConfig::pivot_default());
        let (mut m, _, _) = mechanisms(&config);
        // Lift starts un-homed, the pivot runs from power-on.
        m.start_homing(true);
        assert!(m.elevator().is_homing());
        assert!(!m.dispenser().is_homing());

        m.cancel_homing();
        m.set_home_here();
        m.start_homing(true);
        assert!(!m.elevator().is_homing());
        assert!(m.homing_complete());
    }

    #[test]
    fn estop_forwarded_to_both_axes() {
        let config = SuperstructureConfig::default();
        let (mut m, _, _) = mechanisms(&config);
        m.set_estopped(true);
        assert!(m.elevator().axis().is_estopped());
        assert!(m.dispenser().pivot().is_estopped());
    }
}
