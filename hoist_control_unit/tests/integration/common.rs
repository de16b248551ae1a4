//! Shared rig: a superstructure wired to simulated hardware.

use hoist_common::superstructure::config::SuperstructureConfig;
use hoist_common::superstructure::state::SuperstructureState;
use hoist_control_unit::superstructure::Superstructure;
use hoist_hal::{
    SimAxis, SimAxisHandle, SimAxisParams, SimRoller, SimRollerHandle, SimRollerParams,
};

pub struct Rig {
    pub s: Superstructure,
    pub lift: SimAxisHandle,
    pub pivot: SimAxisHandle,
    pub tunnel: SimRollerHandle,
    pub gripper: SimRollerHandle,
}

impl Rig {
    pub fn new(config: &SuperstructureConfig) -> Self {
        let dt = config.cycle.period_s;
        let (lift, lift_handle) =
            SimAxis::new(SimAxisParams::from_axis_config("elevator", &config.elevator, dt));
        let (pivot, pivot_handle) =
            SimAxis::new(SimAxisParams::from_axis_config("pivot", &config.pivot, dt));
        let (tunnel, tunnel_handle) = SimRoller::new(SimRollerParams::new("tunnel"));
        let (gripper, gripper_handle) = SimRoller::new(SimRollerParams::new("gripper"));
        let s = Superstructure::new(
            config,
            Box::new(lift),
            Box::new(pivot),
            Box::new(tunnel),
            Box::new(gripper),
        )
        .unwrap();
        Self {
            s,
            lift: lift_handle,
            pivot: pivot_handle,
            tunnel: tunnel_handle,
            gripper: gripper_handle,
        }
    }

    /// Reference configuration, homed and settled in `STOW`.
    pub fn stowed() -> Self {
        Self::stowed_with(&SuperstructureConfig::default())
    }

    pub fn stowed_with(config: &SuperstructureConfig) -> Self {
        let mut rig = Self::new(config);
        assert!(rig.run_until(500, |s| s.at_goal()), "never reached STOW");
        assert_eq!(rig.s.current(), SuperstructureState::Stow);
        rig
    }

    /// Tick enabled `n` times, checking scheduler consistency every tick.
    pub fn tick(&mut self, n: usize) {
        for _ in 0..n {
            self.s.tick(true);
            assert_consistent(&self.s);
        }
    }

    /// Tick enabled until `done` holds. Returns false on timeout.
    pub fn run_until(&mut self, max_ticks: usize, done: impl Fn(&Superstructure) -> bool) -> bool {
        for _ in 0..max_ticks {
            self.s.tick(true);
            assert_consistent(&self.s);
            if done(&self.s) {
                return true;
            }
        }
        false
    }

    /// Set `goal` and run until settled there.
    pub fn drive_to(&mut self, goal: SuperstructureState, max_ticks: usize) {
        self.s.set_goal(goal);
        assert!(
            self.run_until(max_ticks, |s| s.at_goal()),
            "did not reach {goal}: current={} next={:?}",
            self.s.current(),
            self.s.next()
        );
    }
}

/// The active edge, when present, is the graph edge `(current, next)`.
pub fn assert_consistent(s: &Superstructure) {
    match (s.next(), s.active_edge()) {
        (Some(next), Some((from, to))) => {
            assert_eq!(from, s.current(), "active edge source");
            assert_eq!(to, next, "active edge target");
            assert!(s.graph().edge(from, to).is_some(), "{from} -> {to} not in graph");
        }
        (None, None) => {}
        (next, edge) => panic!("next={next:?} but active_edge={edge:?}"),
    }
}
