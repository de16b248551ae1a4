//! Step lists for graph edges.
//!
//! Generic edges move to the destination pose, wait for both axes and
//! apply the destination's roller goals. Edges touching the pass-through
//! sentinel sequence the axes so the pivot only crosses while the lift is
//! high enough:
//!
//! | Edge | Steps |
//! |------|-------|
//! | sentinel -> reversed | pivot, wait, pose, wait, extras |
//! | reversed -> sentinel | clamp lift, wait, pivot, wait |
//! | other -> sentinel | clamp lift, pivot, wait, extras |
//!
//! Leaving characterization re-homes any axis whose homing was cut short
//! before moving to STOW.
//!
//! Edges crossing between the bottom height band and any higher band are
//! prefixed with a half-out slam step unless the destination extends it.

use hoist_common::superstructure::config::SuperstructureConfig;
use hoist_common::superstructure::state::{Height, SlamGoal, SuperstructureState};

use super::{Step, Task};
use crate::graph::GraphError;
use crate::graph::data::{Pose, StateTable};

use SuperstructureState as S;

/// Build the task run by the edge `from -> to`.
pub fn edge_task(
    from: SuperstructureState,
    to: SuperstructureState,
    table: &StateTable,
    config: &SuperstructureConfig,
) -> Result<Task, GraphError> {
    let geo = &config.geometry;
    let steps = match (from, to) {
        (S::Start, S::Stow) => {
            let stow = pose_of(table, S::Stow)?;
            vec![
                Step::StopRollers,
                Step::Home,
                set_pose(stow),
                Step::WaitAtGoal,
                extras(table, S::Stow),
            ]
        }
        (S::AutoStart, S::Stow) => {
            let stow = pose_of(table, S::Stow)?;
            vec![
                Step::SetHomeHere,
                Step::MarkCoralHeld,
                set_pose(stow),
                Step::WaitAtGoal,
                extras(table, S::Stow),
            ]
        }
        (S::Characterization, S::Stow) => {
            let stow = pose_of(table, S::Stow)?;
            vec![
                Step::WaitCharacterizationOff,
                Step::EnsureHomed,
                set_pose(stow),
                Step::WaitAtGoal,
                extras(table, S::Stow),
            ]
        }
        (S::PreThrown, S::Thrown) => {
            let thrown = pose_of(table, S::Thrown)?;
            vec![
                Step::SetForceFast(true),
                set_pose(thrown),
                Step::WaitSeconds(geo.throw_eject_time_s),
                extras(table, S::Thrown),
                Step::SetForceFast(false),
            ]
        }
        _ => {
            let target = pose_of(table, to)?;
            let from_data = table.get(from);
            let to_data = table.get(to);
            let clamp = Step::ClampLift {
                min: geo.pass_through_min_height,
                max: geo.elevator_max_travel,
            };

            if from == S::Unreversed && to_data.reversed {
                vec![
                    Step::SetPivot(target.pivot),
                    Step::WaitAtGoal,
                    set_pose(target),
                    Step::WaitAtGoal,
                    extras(table, to),
                ]
            } else if from_data.reversed && to == S::Unreversed {
                vec![
                    clamp,
                    Step::WaitAtGoal,
                    Step::SetPivot(target.pivot),
                    Step::WaitAtGoal,
                ]
            } else {
                let mut steps = Vec::with_capacity(6);
                let crosses_bottom = from_data.height.at_or_below(Height::Bottom)
                    != to_data.height.at_or_below(Height::Bottom);
                if crosses_bottom && to_data.slam != SlamGoal::Extend {
                    steps.push(Step::Slam(SlamGoal::HalfOut));
                }
                if to == S::Unreversed {
                    steps.extend([clamp, Step::SetPivot(target.pivot), Step::WaitAtGoal]);
                } else {
                    steps.extend([set_pose(target), Step::WaitAtGoal]);
                }
                steps.push(extras(table, to));
                steps
            }
        }
    };
    Ok(Task::new(steps))
}

fn pose_of(table: &StateTable, state: SuperstructureState) -> Result<Pose, GraphError> {
    table.pose(state).ok_or(GraphError::MissingPose(state))
}

fn set_pose(pose: Pose) -> Step {
    Step::SetPose {
        lift: pose.lift,
        pivot: pose.pivot,
    }
}

fn extras(table: &StateTable, state: SuperstructureState) -> Step {
    let data = table.get(state);
    Step::ApplyExtras {
        tunnel: data.tunnel,
        gripper: data.gripper,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
