//! Static data attached to every superstructure state.
//!
//! Reference poses are in meters (lift) and degrees (pivot); the table
//! converts pivot angles to radians and applies geometry and per-state
//! overrides from the configuration once, at build time.

use hoist_common::consts::STATE_COUNT;
use hoist_common::superstructure::config::SuperstructureConfig;
use hoist_common::superstructure::state::{
    GripperGoal, Height, SlamGoal, SuperstructureState, TunnelGoal,
};

use crate::axis::profiled::GoalSource;

/// Lift and pivot goals of a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub lift: GoalSource,
    /// Pivot angle [rad].
    pub pivot: f64,
}

/// Immutable data of one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateData {
    /// `None` for pseudo-states.
    pub pose: Option<Pose>,
    pub tunnel: TunnelGoal,
    pub gripper: GripperGoal,
    pub height: Height,
    /// Pivot beyond the pass-through point.
    pub reversed: bool,
    pub slam: SlamGoal,
}

impl StateData {
    const PSEUDO: Self = Self {
        pose: None,
        tunnel: TunnelGoal::Idle,
        gripper: GripperGoal::Idle,
        height: Height::Bottom,
        reversed: false,
        slam: SlamGoal::Retract,
    };

    fn at(lift: GoalSource, pivot_deg: f64, height: Height) -> Self {
        Self {
            pose: Some(Pose {
                lift,
                pivot: pivot_deg.to_radians(),
            }),
            ..Self::PSEUDO
        }
        .with_height(height)
    }

    fn with_height(mut self, height: Height) -> Self {
        self.height = height;
        self
    }

    fn tunnel(mut self, tunnel: TunnelGoal) -> Self {
        self.tunnel = tunnel;
        self
    }

    fn gripper(mut self, gripper: GripperGoal) -> Self {
        self.gripper = gripper;
        self
    }

    fn reversed(mut self) -> Self {
        self.reversed = true;
        self.gripper = GripperGoal::Grip;
        self
    }

    fn slam(mut self, slam: SlamGoal) -> Self {
        self.slam = slam;
        self
    }
}

/// Data of every state, indexed by discriminant.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTable {
    data: [StateData; STATE_COUNT],
}

impl StateTable {
    /// Reference table adjusted by `config`.
    pub fn new(config: &SuperstructureConfig) -> Self {
        let mut data = [StateData::PSEUDO; STATE_COUNT];
        for state in SuperstructureState::ALL {
            data[state.index()] = reference(state, config);
        }

        for (state, ov) in &config.poses {
            if let Some(pose) = data[state.index()].pose.as_mut() {
                if let Some(height) = ov.height {
                    pose.lift = match pose.lift {
                        GoalSource::Fixed(_) => GoalSource::Fixed(height),
                        GoalSource::Wiggle {
                            amplitude, rate, ..
                        } => GoalSource::Wiggle {
                            baseline: height,
                            amplitude,
                            rate,
                        },
                        GoalSource::ClampMeasured { max, .. } => {
                            GoalSource::ClampMeasured { min: height, max }
                        }
                    };
                }
                if let Some(deg) = ov.pivot_deg {
                    pose.pivot = deg.to_radians();
                }
            }
        }
        Self { data }
    }

    #[inline]
    pub fn get(&self, state: SuperstructureState) -> &StateData {
        &self.data[state.index()]
    }

    pub fn pose(&self, state: SuperstructureState) -> Option<Pose> {
        self.get(state).pose
    }
}

fn reference(state: SuperstructureState, config: &SuperstructureConfig) -> StateData {
    use GripperGoal as G;
    use Height::{Bottom, FirstStage, SecondStage};
    use SuperstructureState as S;
    use TunnelGoal as T;

    let geo = &config.geometry;
    let fixed = GoalSource::Fixed;

    let l1 = StateData::at(fixed(0.25), 20.0, Bottom);
    let l2 = StateData::at(fixed(0.45), -20.0, FirstStage);
    let l3 = StateData::at(fixed(0.85), -35.0, FirstStage);
    let l4 = StateData::at(fixed(1.45), -48.0, SecondStage);
    let l1_rev = StateData::at(fixed(0.25), -200.0, Bottom).reversed();
    let l2_rev = StateData::at(fixed(0.45), -160.0, FirstStage).reversed();
    let l3_rev = StateData::at(fixed(0.85), -145.0, FirstStage).reversed();
    let l4_rev = StateData::at(fixed(1.45), -132.0, SecondStage).reversed();
    let goodbye = StateData::at(fixed(0.04), 18.0, Bottom);
    let algae_stow = StateData::at(fixed(0.15), 0.0, Bottom).gripper(G::Grip);
    let processor = StateData::at(fixed(0.15), -40.0, Bottom).gripper(G::Grip);
    let toss = StateData::at(fixed(0.15), 30.0, Bottom).gripper(G::Grip);

    match state {
        S::Start | S::AutoStart | S::Characterization => StateData::PSEUDO,
        S::Stow => StateData::at(fixed(0.04), -18.0, Bottom),
        S::Intake => StateData::at(
            GoalSource::Wiggle {
                baseline: geo.intake_height,
                amplitude: geo.intake_wiggle_amplitude,
                rate: geo.intake_wiggle_rate,
            },
            -18.0,
            Bottom,
        )
        .tunnel(T::Intake),
        S::GoodbyeCoral => goodbye,
        S::GoodbyeCoralEject => goodbye.tunnel(T::Dispense),

        S::L1Coral => l1,
        S::L2Coral => l2,
        S::L3Coral => l3,
        S::L4Coral => l4,
        S::L1CoralEject => l1.tunnel(T::L1Dispense).gripper(G::L1Eject),
        S::L2CoralEject => l2.tunnel(T::Dispense).gripper(G::L1Eject),
        S::L3CoralEject => l3.tunnel(T::Dispense),
        S::L4CoralEject => l4.tunnel(T::Dispense).gripper(G::Eject),

        S::L1CoralReversed => l1_rev,
        S::L2CoralReversed => l2_rev,
        S::L3CoralReversed => l3_rev,
        S::L4CoralReversed => l4_rev,
        S::L1CoralReversedEject => l1_rev.tunnel(T::L1Dispense),
        S::L2CoralReversedEject => l2_rev.tunnel(T::Dispense),
        S::L3CoralReversedEject => l3_rev.tunnel(T::Dispense),
        S::L4CoralReversedEject => l4_rev.tunnel(T::Dispense),

        S::AlgaeFloorIntake => StateData::at(fixed(0.1), -45.0, Bottom)
            .gripper(G::Grip)
            .slam(SlamGoal::Extend),
        S::AlgaeStowIntake | S::AlgaeStow => algae_stow,
        S::AlgaeL2Intake => StateData::at(fixed(0.75), 0.0, FirstStage).gripper(G::Grip),
        S::AlgaeL3Intake => StateData::at(fixed(1.15), 0.0, FirstStage).gripper(G::Grip),
        S::Unreversed => StateData::at(
            GoalSource::ClampMeasured {
                min: geo.pass_through_min_height,
                max: geo.elevator_max_travel,
            },
            0.0,
            FirstStage,
        )
        .gripper(G::Grip),
        S::PostPreProcessor => processor,
        S::Processed => processor.gripper(G::Eject),
        S::PreToss => toss,
        S::Toss => toss.gripper(G::Eject),
        S::PreThrown => StateData::at(fixed(1.0), 20.0, SecondStage).gripper(G::Grip),
        S::Thrown => StateData::at(fixed(geo.elevator_max_travel), 20.0, SecondStage)
            .gripper(G::Eject),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
