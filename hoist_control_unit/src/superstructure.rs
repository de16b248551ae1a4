//! Superstructure facade.
//!
//! [`Superstructure`] is what the cycle runner and callers outside the core
//! talk to. It owns the graph-driven [`TransitionScheduler`], the
//! [`Mechanisms`] it commands, the sticky [`EStopLatch`] and telemetry, and
//! runs them in a fixed order every period:
//!
//! | Step | Action |
//! |------|--------|
//! | 1 | tick lift, end effector and any characterization |
//! | 2 | evaluate the goal function, re-route if the goal changed |
//! | 3 | tick the scheduler (commit, search, run the edge task) |
//! | 4 | propagate stowed / held-piece constraints to the lift, re-home an idle pivot |
//! | 5 | latch and forward the e-stop |
//! | 6 | recompute advisories, publish telemetry |

use hoist_common::hal::{AxisIo, RollerIo};
use hoist_common::superstructure::config::SuperstructureConfig;
use hoist_common::superstructure::fault::{Advisory, AxisFault};
use hoist_common::superstructure::state::SuperstructureState;
use thiserror::Error;
use tracing::{debug, info};

use crate::axis::characterization::CharacterizationResult;
use crate::axis::detector::DetectionOverride;
use crate::axis::{AxisContext, Overrides};
use crate::graph::{GraphError, StateGraph};
use crate::mechanism::{CharacterizationTarget, MechanismError, Mechanisms};
use crate::safety::estop::EStopLatch;
use crate::state::{SchedulerInputs, TransitionScheduler, TransitionState};
use crate::telemetry::{AxisSnapshot, Snapshot, Telemetry, TelemetrySink, TracingSink};

/// Goal re-evaluated every tick.
pub type GoalFn = Box<dyn FnMut() -> SuperstructureState + Send>;

/// Errors raised while assembling the superstructure.
#[derive(Debug, Error)]
pub enum SuperstructureError {
    #[error("State graph: {0}")]
    Graph(#[from] GraphError),

    #[error("Mechanism: {0}")]
    Mechanism(#[from] MechanismError),
}

pub struct Superstructure {
    scheduler: TransitionScheduler,
    mechanisms: Mechanisms,
    estop: EStopLatch,
    telemetry: Telemetry,
    overrides: Overrides,
    goal_fn: Option<GoalFn>,
    advisories: Advisory,
    last_state: SuperstructureState,
    source_state: SuperstructureState,
    pivot_rehomed: bool,
    enabled: bool,
    period_s: f64,
    cycle: u64,
}

impl Superstructure {
    /// Build the graph and the mechanisms around the given hardware.
    pub fn new(
        config: &SuperstructureConfig,
        elevator: Box<dyn AxisIo>,
        pivot: Box<dyn AxisIo>,
        tunnel: Box<dyn RollerIo>,
        gripper: Box<dyn RollerIo>,
    ) -> Result<Self, SuperstructureError> {
        let graph = StateGraph::build(config)?;
        let mechanisms = Mechanisms::new(elevator, pivot, tunnel, gripper, config)?;
        info!(
            "Superstructure ready: run_mode={:?}, period={}s, slam_installed={}",
            config.run_mode, config.cycle.period_s, config.slam_installed
        );
        Ok(Self {
            scheduler: TransitionScheduler::new(graph),
            mechanisms,
            estop: EStopLatch::new(config.run_mode),
            telemetry: Telemetry::new(Box::new(TracingSink), config.cycle.telemetry_interval),
            overrides: Overrides::default(),
            goal_fn: None,
            advisories: Advisory::empty(),
            last_state: SuperstructureState::Start,
            source_state: SuperstructureState::Start,
            pivot_rehomed: false,
            enabled: false,
            period_s: config.cycle.period_s,
            cycle: 0,
        })
    }

    /// Run one control period. `enabled` is the externally owned enable.
    pub fn tick(&mut self, enabled: bool) {
        if enabled != self.enabled {
            info!("Robot {}", if enabled { "enabled" } else { "disabled" });
            self.enabled = enabled;
        }
        let ctx = AxisContext {
            enabled,
            overrides: self.overrides,
            dt: self.period_s,
        };

        self.mechanisms.tick(&ctx);
        let has_algae = self.mechanisms.dispenser().has_algae();

        if let Some(goal_fn) = self.goal_fn.as_mut() {
            let goal = goal_fn();
            self.scheduler
                .set_goal(goal, &mut self.mechanisms, has_algae);
        }

        let inputs = SchedulerInputs {
            enabled,
            characterization: self.mechanisms.characterization_mode(),
            has_algae,
        };
        self.scheduler.tick(&mut self.mechanisms, inputs, ctx.dt);

        let stowed = self.scheduler.current() == SuperstructureState::Stow;
        let held = has_algae && !self.mechanisms.force_fast();
        let lift = self.mechanisms.elevator_mut().axis_mut();
        lift.set_stowed(stowed);
        lift.use_held_constraints(held);
        if enabled {
            self.rehome_idle_pivot();
        }

        let estopped = self
            .estop
            .update(self.mechanisms.should_estop(), self.overrides.disable);
        self.mechanisms.set_estopped(estopped);

        self.advisories = self.collect_advisories();
        let snapshot = self.snapshot();
        self.telemetry.tick(|| snapshot);
        self.cycle += 1;
    }

    /// Home the pivot once each time the mechanism settles empty in STOW,
    /// unless it came straight from INTAKE.
    fn rehome_idle_pivot(&mut self) {
        let current = self.scheduler.current();
        if current != self.last_state {
            self.source_state = self.last_state;
            self.last_state = current;
        }

        let idle = current == SuperstructureState::Stow
            && self.scheduler.goal() == SuperstructureState::Stow
            && self.source_state != SuperstructureState::Intake
            && !self.mechanisms.dispenser().has_coral();
        if !idle {
            self.pivot_rehomed = false;
        } else if !self.pivot_rehomed {
            self.pivot_rehomed = true;
            if self.mechanisms.dispenser_mut().start_homing() {
                debug!("Re-homing pivot in {current} (from {})", self.source_state);
            }
        }
    }

    fn collect_advisories(&self) -> Advisory {
        let lift = self.mechanisms.elevator().axis().faults();
        let pivot = self.mechanisms.dispenser().pivot().faults();
        let dispenser = self.mechanisms.dispenser();

        let mut flags = Advisory::empty();
        flags.set(
            Advisory::ELEVATOR_DISCONNECTED,
            lift.intersects(AxisFault::MOTOR_DISCONNECTED | AxisFault::ENCODER_DISCONNECTED),
        );
        flags.set(
            Advisory::PIVOT_MOTOR_DISCONNECTED,
            pivot.contains(AxisFault::MOTOR_DISCONNECTED),
        );
        flags.set(
            Advisory::PIVOT_ENCODER_DISCONNECTED,
            pivot.contains(AxisFault::ENCODER_DISCONNECTED),
        );
        flags.set(Advisory::TUNNEL_DISCONNECTED, !dispenser.tunnel_connected());
        flags.set(Advisory::GRIPPER_DISCONNECTED, !dispenser.gripper_connected());
        flags.set(
            Advisory::ELEVATOR_OUT_OF_TOLERANCE,
            self.mechanisms.elevator().axis().should_estop(),
        );
        flags.set(
            Advisory::PIVOT_OUT_OF_TOLERANCE,
            dispenser.pivot().should_estop(),
        );
        flags.set(Advisory::ESTOP_LATCHED, self.estop.is_latched());
        flags.set(Advisory::DISABLE_OVERRIDE, self.overrides.disable);

        if flags != self.advisories {
            debug!("Advisories: {flags:?}");
        }
        flags
    }

    // ─── Goal ───────────────────────────────────────────────────────

    /// Set a fixed goal, re-routing an in-flight hop when possible.
    ///
    /// Replaces any goal function.
    pub fn set_goal(&mut self, goal: SuperstructureState) {
        self.goal_fn = None;
        let has_algae = self.mechanisms.dispenser().has_algae();
        self.scheduler
            .set_goal(goal, &mut self.mechanisms, has_algae);
    }

    /// Re-evaluate `goal_fn` at the start of every tick.
    pub fn set_goal_fn(&mut self, goal_fn: GoalFn) {
        self.goal_fn = Some(goal_fn);
    }

    /// Stop re-evaluating; the last goal stays.
    pub fn clear_goal_fn(&mut self) {
        self.goal_fn = None;
    }

    // ─── Requests ───────────────────────────────────────────────────

    /// Restart from `START`; the next enabled tick homes the lift.
    pub fn request_homing(&mut self) {
        self.scheduler.request_homing(&mut self.mechanisms);
    }

    /// Restart from `AUTO_START`: home in place with a pre-loaded coral.
    pub fn auto_start(&mut self) {
        self.scheduler.auto_start(&mut self.mechanisms);
    }

    /// Enter or leave diagnostic mode. Leaving it ends any running
    /// static characterization.
    pub fn set_characterization_mode(&mut self, on: bool) {
        self.mechanisms.set_characterization_mode(on);
        if on {
            self.scheduler.enter_characterization(&mut self.mechanisms);
        } else if let Some(result) = self.mechanisms.stop_characterization() {
            info!("Characterization ended: {result:?}");
        }
    }

    /// Start static characterization of `target`. Enters diagnostic mode.
    pub fn start_characterization(&mut self, target: CharacterizationTarget) {
        self.set_characterization_mode(true);
        info!("Static characterization of {target:?}");
        self.mechanisms.start_characterization(target);
    }

    /// Stop the running characterization, staying in diagnostic mode.
    pub fn stop_characterization(&mut self) -> Option<CharacterizationResult> {
        self.mechanisms.stop_characterization()
    }

    pub fn set_overrides(&mut self, overrides: Overrides) {
        if overrides != self.overrides {
            info!("Overrides: {overrides:?}");
        }
        self.overrides = overrides;
    }

    pub fn set_detection_overrides(&mut self, coral: DetectionOverride, algae: DetectionOverride) {
        self.mechanisms
            .dispenser_mut()
            .set_detection_overrides(coral, algae);
    }

    /// Acknowledge and clear the sticky e-stop.
    pub fn clear_estop(&mut self) {
        self.estop.clear();
        self.mechanisms.set_estopped(false);
    }

    pub fn set_telemetry_sink(&mut self, sink: Box<dyn TelemetrySink>) {
        self.telemetry.set_sink(sink);
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn state(&self) -> &TransitionState {
        self.scheduler.state()
    }

    pub fn current(&self) -> SuperstructureState {
        self.scheduler.current()
    }

    pub fn next(&self) -> Option<SuperstructureState> {
        self.scheduler.next()
    }

    pub fn goal(&self) -> SuperstructureState {
        self.scheduler.goal()
    }

    /// `(from, to)` of the running edge.
    pub fn active_edge(&self) -> Option<(SuperstructureState, SuperstructureState)> {
        self.scheduler.active_edge().map(|id| {
            let edge = self.scheduler.graph().edge_by_id(id);
            (edge.from, edge.to)
        })
    }

    /// Settled at the goal with nothing in flight.
    pub fn at_goal(&self) -> bool {
        self.scheduler.at_goal()
    }

    pub fn has_coral(&self) -> bool {
        self.mechanisms.dispenser().has_coral()
    }

    pub fn has_algae(&self) -> bool {
        self.mechanisms.dispenser().has_algae()
    }

    pub fn is_estopped(&self) -> bool {
        self.estop.is_latched()
    }

    pub fn advisories(&self) -> Advisory {
        self.advisories
    }

    pub fn overrides(&self) -> Overrides {
        self.overrides
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn graph(&self) -> &StateGraph {
        self.scheduler.graph()
    }

    pub fn mechanisms(&self) -> &Mechanisms {
        &self.mechanisms
    }

    /// Current telemetry record.
    pub fn snapshot(&self) -> Snapshot {
        let TransitionState {
            current,
            next,
            goal,
            ..
        } = *self.scheduler.state();
        Snapshot {
            cycle: self.cycle,
            current,
            next,
            goal,
            active_edge: self.active_edge(),
            estopped: self.estop.is_latched(),
            advisories: self.advisories.bits(),
            has_coral: self.has_coral(),
            has_algae: self.has_algae(),
            elevator: AxisSnapshot::of(self.mechanisms.elevator().axis()),
            pivot: AxisSnapshot::of(self.mechanisms.dispenser().pivot()),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
