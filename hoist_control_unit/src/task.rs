//! Edge tasks.
//!
//! A task is a flat list of [`Step`]s built once when the graph is built.
//! Steps are plain data: the [`runner::TaskRunner`] interprets them against
//! an [`runner::Actuators`] implementation, one tick at a time. Instant steps
//! fall through within a tick; waiting steps hold the runner until their
//! condition is met.

pub mod builder;
pub mod runner;

use hoist_common::superstructure::state::{GripperGoal, SlamGoal, TunnelGoal};
use serde::Serialize;

use crate::axis::profiled::GoalSource;

/// Index of a task in the graph's task table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId(pub u16);

impl TaskId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One step of an edge task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Set both axis goals.
    SetPose { lift: GoalSource, pivot: f64 },
    /// Set only the pivot goal [rad].
    SetPivot(f64),
    /// Hold the lift at its measured height, clamped into `[min, max]`.
    ClampLift { min: f64, max: f64 },
    /// Wait until both axes report at-goal.
    WaitAtGoal,
    /// Wait a fixed time [s].
    WaitSeconds(f64),
    /// Command the rollers of the destination state.
    ApplyExtras {
        tunnel: TunnelGoal,
        gripper: GripperGoal,
    },
    /// Stop both rollers.
    StopRollers,
    /// Home every axis that has a homing sequence; wait for all of them.
    Home,
    /// Home only the axes that are not homed; complete at once if none.
    EnsureHomed,
    /// Declare the current lift position home without moving.
    SetHomeHere,
    /// Mark a pre-loaded coral as held.
    MarkCoralHeld,
    /// Override held-piece constraints with the fast ones.
    SetForceFast(bool),
    /// Wait until characterization mode is switched off.
    WaitCharacterizationOff,
    /// Command the slam mechanism; no-op when it is not installed.
    Slam(SlamGoal),
}

impl Step {
    /// True when the step completes in the tick it is entered.
    pub fn is_instant(&self) -> bool {
        !matches!(
            self,
            Self::WaitAtGoal
                | Self::WaitSeconds(_)
                | Self::Home
                | Self::EnsureHomed
                | Self::WaitCharacterizationOff
        )
    }
}

/// Ordered steps run by one edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Task {
    steps: Vec<Step>,
}

impl Task {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
