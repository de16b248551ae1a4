//! Cooperative task runner.
//!
//! Runs at most one task. Each tick executes instant steps back to back
//! until a waiting step is not yet satisfied. Cancellation drops the task
//! between steps, resets the force-fast flag and aborts homing; it is a
//! no-op when nothing is running and safe to repeat.

use hoist_common::consts::EPSILON;
use hoist_common::superstructure::state::{GripperGoal, SlamGoal, TunnelGoal};
use serde::Serialize;
use tracing::debug;

use super::{Step, Task, TaskId};
use crate::axis::profiled::GoalSource;

/// What a task may command. Implemented by the mechanisms.
pub trait Actuators {
    fn set_lift_goal(&mut self, goal: GoalSource);
    /// Pivot goal [rad].
    fn set_pivot_goal(&mut self, goal: f64);
    /// Both axes have reached their goals.
    fn at_goal(&self) -> bool;
    fn apply_extras(&mut self, tunnel: TunnelGoal, gripper: GripperGoal);
    fn stop_rollers(&mut self);
    /// Start homing; with `only_unhomed`, skip axes that are already homed.
    fn start_homing(&mut self, only_unhomed: bool);
    /// No homing in progress and every axis homed.
    fn homing_complete(&self) -> bool;
    fn cancel_homing(&mut self);
    fn set_home_here(&mut self);
    fn mark_coral_held(&mut self);
    fn set_force_fast(&mut self, force: bool);
    fn characterization_active(&self) -> bool;
    fn set_slam_goal(&mut self, goal: SlamGoal);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerStatus {
    #[default]
    Idle,
    Running,
    Finished,
}

/// Interpreter for [`Task`] step lists.
#[derive(Debug, Clone, Default)]
pub struct TaskRunner {
    active: Option<TaskId>,
    status: RunnerStatus,
    step: usize,
    entered: bool,
    waited: f64,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task`, replacing any previous one without cleanup.
    pub fn start(&mut self, task: TaskId) {
        self.active = Some(task);
        self.status = RunnerStatus::Running;
        self.step = 0;
        self.entered = false;
        self.waited = 0.0;
    }

    /// Abort the running task, if any.
    pub fn cancel(&mut self, act: &mut impl Actuators) {
        if let Some(task) = self.active.take() {
            debug!("Task {} cancelled at step {}", task.0, self.step);
        }
        act.set_force_fast(false);
        act.cancel_homing();
        self.status = RunnerStatus::Idle;
    }

    /// Advance the running task by one period.
    pub fn tick(&mut self, tasks: &[Task], act: &mut impl Actuators, dt: f64) -> RunnerStatus {
        let Some(id) = self.active else {
            return self.status;
        };
        let steps = tasks.get(id.index()).map(Task::steps).unwrap_or_default();

        while let Some(&step) = steps.get(self.step) {
            let entering = !self.entered;
            self.entered = true;
            if !self.execute(step, entering, act, dt) {
                return self.status;
            }
            self.step += 1;
            self.entered = false;
            self.waited = 0.0;
        }

        debug!("Task {} finished", id.0);
        self.active = None;
        self.status = RunnerStatus::Finished;
        self.status
    }

    /// Run `step`; true once it is complete.
    fn execute(&mut self, step: Step, entering: bool, act: &mut impl Actuators, dt: f64) -> bool {
        match step {
            Step::SetPose { lift, pivot } => {
                act.set_lift_goal(lift);
                act.set_pivot_goal(pivot);
                true
            }
            Step::SetPivot(pivot) => {
                act.set_pivot_goal(pivot);
                true
            }
            Step::ClampLift { min, max } => {
                act.set_lift_goal(GoalSource::ClampMeasured { min, max });
                true
            }
            Step::WaitAtGoal => act.at_goal(),
            Step::WaitSeconds(seconds) => {
                self.waited += dt;
                self.waited >= seconds - EPSILON
            }
            Step::ApplyExtras { tunnel, gripper } => {
                act.apply_extras(tunnel, gripper);
                true
            }
            Step::StopRollers => {
                act.stop_rollers();
                true
            }
            Step::Home | Step::EnsureHomed => {
                if entering {
                    act.start_homing(step == Step::EnsureHomed);
                }
                act.homing_complete()
            }
            Step::SetHomeHere => {
                act.set_home_here();
                true
            }
            Step::MarkCoralHeld => {
                act.mark_coral_held();
                true
            }
            Step::SetForceFast(force) => {
                act.set_force_fast(force);
                true
            }
            Step::WaitCharacterizationOff => !act.characterization_active(),
            Step::Slam(goal) => {
                act.set_slam_goal(goal);
                true
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<TaskId> {
        self.active
    }

    pub fn status(&self) -> RunnerStatus {
        self.status
    }

    /// Index of the current step of the running task.
    pub fn step_index(&self) -> usize {
        self.step
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
