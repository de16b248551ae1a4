//! Profiled position axis.
//!
//! Each tick, when motion is permitted, the goal is re-evaluated, wrapped
//! and clamped into range, the trapezoidal profile advances one period from
//! the previous setpoint, and the hardware tracks the new setpoint with a
//! banded feedforward. When motion is not permitted the setpoint follows the
//! measurement so nothing accumulates while stopped.
//!
//! | Condition | Output |
//! |-----------|--------|
//! | running | `run_position(setpoint, ff)` |
//! | running, stowed and resting | neutral |
//! | suspended (homing, characterization) | owned by the suspending task |
//! | otherwise | neutral |

use hoist_common::consts::EPSILON;
use hoist_common::hal::{AxisInputs, AxisIo};
use hoist_common::superstructure::config::{AxisConfig, ProfileConstraints, WrapRange};
use hoist_common::superstructure::fault::AxisFault;
use tracing::{debug, info, trace, warn};

use super::AxisContext;
use crate::control::debounce::Debouncer;
use crate::control::feedforward::AxisFeedforward;
use crate::control::math::{epsilon_equals, input_modulus};
use crate::control::profile::{ProfileState, TrapezoidProfile};

// ─── Goal Source ────────────────────────────────────────────────────

/// Goal of an axis, re-evaluated every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalSource {
    /// Constant position.
    Fixed(f64),
    /// Hold the measured position, clamped into `[min, max]`.
    ClampMeasured { min: f64, max: f64 },
    /// Sinusoid of `amplitude` around `baseline` at `rate` rad/s.
    Wiggle {
        baseline: f64,
        amplitude: f64,
        rate: f64,
    },
}

impl GoalSource {
    /// Raw goal given the measured position and axis time.
    pub fn evaluate(&self, measured: f64, time: f64) -> f64 {
        match *self {
            Self::Fixed(position) => position,
            Self::ClampMeasured { min, max } => measured.clamp(min, max),
            Self::Wiggle {
                baseline,
                amplitude,
                rate,
            } => baseline + amplitude * (rate * time).sin(),
        }
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Closed-loop, trapezoid-profiled position axis.
pub struct ProfiledAxis {
    name: &'static str,
    io: Box<dyn AxisIo>,
    inputs: AxisInputs,
    min_position: f64,
    max_position: f64,
    wrap: Option<WrapRange>,
    tolerance: f64,
    profile: TrapezoidProfile,
    constraints: ProfileConstraints,
    held_constraints: Option<ProfileConstraints>,
    feedforward: AxisFeedforward,
    tolerance_debounce: Debouncer,
    goal_source: GoalSource,
    goal: f64,
    setpoint: ProfileState,
    acceleration: f64,
    at_goal: bool,
    should_estop: bool,
    running: bool,
    estopped: bool,
    suspended: bool,
    homed: bool,
    stowed: bool,
    rest_height: Option<f64>,
    resting: bool,
    brake: Option<bool>,
    faults: AxisFault,
    time: f64,
}

impl ProfiledAxis {
    /// Build an axis around `io`.
    ///
    /// Axes with a homing configuration start un-homed and never run their
    /// profile until homed.
    pub fn new(name: &'static str, io: Box<dyn AxisIo>, config: &AxisConfig) -> Self {
        Self {
            name,
            io,
            inputs: AxisInputs::default(),
            min_position: config.min_position,
            max_position: config.max_position,
            wrap: config.wrap,
            tolerance: config.tolerance,
            profile: TrapezoidProfile::new(config.constraints),
            constraints: config.constraints,
            held_constraints: config.held_constraints,
            feedforward: AxisFeedforward::from_config(config),
            tolerance_debounce: Debouncer::rising(config.estop_debounce_s),
            goal_source: GoalSource::Fixed(0.0_f64.clamp(config.min_position, config.max_position)),
            goal: 0.0,
            setpoint: ProfileState::default(),
            acceleration: 0.0,
            at_goal: false,
            should_estop: false,
            running: false,
            estopped: false,
            suspended: false,
            homed: config.homing.is_none(),
            stowed: false,
            rest_height: None,
            resting: false,
            brake: None,
            faults: AxisFault::empty(),
            time: 0.0,
        }
    }

    /// Limit the upper goal (e.g. lift travel below the mechanical stop).
    pub fn limit_max_position(&mut self, max_position: f64) {
        self.max_position = self.max_position.min(max_position);
    }

    /// Rest on the hard stop when stowed with a setpoint at or below `height`.
    pub fn set_rest_height(&mut self, height: Option<f64>) {
        self.rest_height = height;
    }

    /// Run one control period.
    pub fn tick(&mut self, ctx: &AxisContext) {
        self.time += ctx.dt;
        self.read_inputs();
        self.apply_brake_mode(!ctx.overrides.coast);

        let should_run =
            !self.suspended && self.homed && !self.estopped && ctx.output_permitted();
        let out_of_tolerance = (self.inputs.position - self.setpoint.position).abs() > self.tolerance;
        self.faults
            .set(AxisFault::OUT_OF_TOLERANCE, out_of_tolerance && should_run);
        let should_estop = self
            .tolerance_debounce
            .calculate(out_of_tolerance && should_run, ctx.dt);
        if should_estop && !self.should_estop {
            warn!(
                "{}: out of tolerance (measured={:.3}, setpoint={:.3})",
                self.name, self.inputs.position, self.setpoint.position
            );
        }
        self.should_estop = should_estop;
        self.running = should_run;

        if should_run {
            self.run_profile(ctx.dt);
        } else {
            self.setpoint = ProfileState::at_rest(self.inputs.position);
            self.acceleration = 0.0;
            self.at_goal = false;
            self.resting = false;
            if !self.suspended || self.estopped {
                self.io.stop();
            }
        }
    }

    fn read_inputs(&mut self) {
        match self.io.update_inputs(&mut self.inputs) {
            Ok(()) => {
                self.faults
                    .set(AxisFault::MOTOR_DISCONNECTED, !self.inputs.motor_connected);
                self.faults
                    .set(AxisFault::ENCODER_DISCONNECTED, !self.inputs.encoder_connected);
            }
            Err(e) => {
                if !self.faults.contains(AxisFault::MOTOR_DISCONNECTED) {
                    warn!("{}: {e}", self.name);
                }
                self.inputs.motor_connected = false;
                self.faults.insert(AxisFault::MOTOR_DISCONNECTED);
            }
        }
    }

    fn apply_brake_mode(&mut self, enabled: bool) {
        if self.brake != Some(enabled) {
            debug!("{}: brake mode {}", self.name, enabled);
            self.brake = Some(enabled);
            self.io.set_brake_mode(enabled);
        }
    }

    fn run_profile(&mut self, dt: f64) {
        let raw = self.goal_source.evaluate(self.inputs.position, self.time);
        let wrapped = match self.wrap {
            Some(w) => input_modulus(raw, w.lower, w.upper),
            None => raw,
        };
        self.goal = wrapped.clamp(self.min_position, self.max_position);

        let previous_velocity = self.setpoint.velocity;
        let mut next = self
            .profile
            .calculate(dt, self.setpoint, ProfileState::at_rest(self.goal));
        if next.position < self.min_position || next.position > self.max_position {
            next = ProfileState::at_rest(next.position.clamp(self.min_position, self.max_position));
        }
        self.acceleration = (next.velocity - previous_velocity) / dt;
        self.setpoint = next;

        self.at_goal = match self.goal_source {
            GoalSource::Wiggle {
                baseline,
                amplitude,
                ..
            } => {
                let centre = baseline.clamp(self.min_position, self.max_position);
                (self.setpoint.position - centre).abs() <= amplitude.abs() + EPSILON
            }
            _ => {
                epsilon_equals(self.setpoint.position, self.goal)
                    && epsilon_equals(self.setpoint.velocity, 0.0)
            }
        };

        let resting = self.stowed
            && self.at_goal
            && self
                .rest_height
                .is_some_and(|h| self.setpoint.position <= h);
        if resting != self.resting {
            debug!("{}: resting={}", self.name, resting);
        }
        self.resting = resting;

        if resting {
            self.io.stop();
        } else {
            let ff = self.feedforward.calculate(
                self.setpoint.position,
                self.setpoint.velocity,
                self.acceleration,
                self.inputs.position,
            );
            self.io.run_position(self.setpoint.position, ff);
        }
        trace!(
            "{}: goal={:.4} setpoint=({:.4}, {:.4}) measured={:.4}",
            self.name, self.goal, self.setpoint.position, self.setpoint.velocity, self.inputs.position
        );
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Replace the goal; clears the at-goal flag until the next tick.
    pub fn set_goal(&mut self, source: GoalSource) {
        self.goal_source = source;
        self.at_goal = false;
    }

    /// Forward the aggregated e-stop.
    pub fn set_estopped(&mut self, estopped: bool) {
        self.estopped = estopped;
    }

    /// Tell the axis the mechanism is in its stowed state.
    pub fn set_stowed(&mut self, stowed: bool) {
        self.stowed = stowed;
    }

    /// Switch between normal and held-piece profile limits.
    pub fn use_held_constraints(&mut self, held: bool) {
        let target = match (held, self.held_constraints) {
            (true, Some(c)) => c,
            _ => self.constraints,
        };
        if self.profile.constraints() != target {
            debug!(
                "{}: constraints v={:.3} a={:.3}",
                self.name, target.max_velocity, target.max_acceleration
            );
            self.profile.set_constraints(target);
        }
    }

    /// Stop the profile; the caller owns the output until [`Self::resume`].
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Return to closed-loop control.
    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Mark the axis homed or not.
    pub fn set_homed(&mut self, homed: bool) {
        if homed != self.homed {
            info!("{}: homed={}", self.name, homed);
        }
        self.homed = homed;
    }

    /// Drive a raw open-loop output. Neutral if outputs are not permitted.
    pub fn run_open_loop(&mut self, output: f64, ctx: &AxisContext) {
        if ctx.output_permitted() && !self.estopped {
            self.io.run_open_loop(output);
        } else {
            self.io.stop();
        }
    }

    /// Neutral output.
    pub fn stop(&mut self) {
        self.io.stop();
    }

    /// Declare the current mechanism position to be `position`.
    pub fn reset_position(&mut self, position: f64) {
        info!(
            "{}: position reset {:.4} -> {:.4}",
            self.name, self.inputs.position, position
        );
        self.io.reset_position(position);
        self.inputs.position = position;
        self.setpoint = ProfileState::at_rest(position);
    }

    // ─── Queries ────────────────────────────────────────────────────

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn inputs(&self) -> &AxisInputs {
        &self.inputs
    }

    /// Measured position.
    pub fn position(&self) -> f64 {
        self.inputs.position
    }

    /// Measured velocity.
    pub fn velocity(&self) -> f64 {
        self.inputs.velocity
    }

    /// Last clamped goal position.
    pub fn goal(&self) -> f64 {
        self.goal
    }

    pub fn goal_source(&self) -> GoalSource {
        self.goal_source
    }

    pub fn setpoint(&self) -> ProfileState {
        self.setpoint
    }

    /// Setpoint reached the goal and stopped.
    pub fn at_goal(&self) -> bool {
        self.at_goal
    }

    /// Debounced out-of-tolerance signal.
    pub fn should_estop(&self) -> bool {
        self.should_estop
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_homed(&self) -> bool {
        self.homed
    }

    pub fn is_resting(&self) -> bool {
        self.resting
    }

    pub fn is_estopped(&self) -> bool {
        self.estopped
    }

    pub fn faults(&self) -> AxisFault {
        self.faults
    }

    /// Allowed tracking error.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
