//! Axis physics simulator.
//!
//! A position command is followed at a bounded tracking rate, so a profiled
//! setpoint that moves slower than that rate is reproduced exactly. Open-loop
//! output moves the axis once it overcomes static friction. Hard stops clamp
//! the physical position and zero any velocity pushing into them.

use hoist_common::hal::{AxisInputs, AxisIo, HalError};
use hoist_common::superstructure::config::AxisConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Physical parameters of a simulated axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimAxisParams {
    /// Device name reported through `AxisIo::name`.
    pub name: &'static str,
    /// Physics step per `update_inputs()` [s].
    pub dt: f64,
    /// Lower hard stop (physical frame).
    pub hard_stop_min: f64,
    /// Upper hard stop (physical frame).
    pub hard_stop_max: f64,
    /// Fastest rate a position command is followed [unit/s].
    pub tracking_velocity: f64,
    /// Open-loop velocity gain above static friction [unit/s per V].
    pub velocity_per_volt: f64,
    /// Open-loop output needed to break away [V].
    pub static_friction_volts: f64,
    /// Current drawn per applied volt [A/V].
    pub amps_per_volt: f64,
    /// Physical position at power-on.
    pub initial_position: f64,
}

impl SimAxisParams {
    /// Derive a simulation from the controller's axis configuration.
    ///
    /// Tracking is four times faster than the profile limit so a healthy
    /// simulated axis never lags its setpoint.
    pub fn from_axis_config(name: &'static str, config: &AxisConfig, dt: f64) -> Self {
        Self {
            name,
            dt,
            hard_stop_min: config.min_position,
            hard_stop_max: config.max_position,
            tracking_velocity: config.constraints.max_velocity * 4.0,
            velocity_per_volt: config.constraints.max_velocity / 12.0,
            static_friction_volts: 0.05,
            amps_per_volt: 4.0,
            initial_position: config.min_position.max(0.0).min(config.max_position),
        }
    }
}

/// Last output command received by a simulated axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    /// Neutral output.
    Neutral,
    /// Closed-loop position tracking.
    Position {
        /// Target in the measured frame.
        target: f64,
        /// Additive feedforward [V].
        feedforward: f64,
    },
    /// Raw open-loop output [V].
    OpenLoop(f64),
}

#[derive(Debug)]
struct SimAxisState {
    params: SimAxisParams,
    position: f64,
    velocity: f64,
    offset: f64,
    command: SimCommand,
    brake: bool,
    frozen: bool,
    motor_connected: bool,
    encoder_connected: bool,
    applied_volts: f64,
    steps: u64,
}

impl SimAxisState {
    fn step(&mut self) {
        let dt = self.params.dt;
        if self.frozen {
            self.velocity = 0.0;
            return;
        }

        match self.command {
            SimCommand::Position {
                target,
                feedforward,
            } => {
                let goal = (target + self.offset)
                    .clamp(self.params.hard_stop_min, self.params.hard_stop_max);
                let max_step = self.params.tracking_velocity * dt;
                let delta = (goal - self.position).clamp(-max_step, max_step);
                self.position += delta;
                self.velocity = delta / dt;
                self.applied_volts = feedforward;
            }
            SimCommand::OpenLoop(output) => {
                let friction = self.params.static_friction_volts;
                let effective = if output.abs() <= friction {
                    0.0
                } else {
                    output - friction * output.signum()
                };
                self.velocity = effective * self.params.velocity_per_volt;
                self.position += self.velocity * dt;
                self.applied_volts = output;
            }
            SimCommand::Neutral => {
                if self.brake {
                    self.velocity = 0.0;
                } else {
                    self.velocity *= 0.5;
                }
                self.position += self.velocity * dt;
                self.applied_volts = 0.0;
            }
        }

        if self.position < self.params.hard_stop_min {
            self.position = self.params.hard_stop_min;
            self.velocity = self.velocity.max(0.0);
        }
        if self.position > self.params.hard_stop_max {
            self.position = self.params.hard_stop_max;
            self.velocity = self.velocity.min(0.0);
        }

        self.steps += 1;
        trace!(
            "Sim axis {}: pos={:.4}, vel={:.4}, cmd={:?}",
            self.params.name, self.position, self.velocity, self.command
        );
    }
}

/// Simulated position axis implementing [`AxisIo`].
pub struct SimAxis {
    state: Arc<Mutex<SimAxisState>>,
}

/// Shared inspection and fault-injection handle for a [`SimAxis`].
#[derive(Clone)]
pub struct SimAxisHandle {
    state: Arc<Mutex<SimAxisState>>,
}

impl SimAxis {
    /// Create a simulated axis and its handle.
    pub fn new(params: SimAxisParams) -> (Self, SimAxisHandle) {
        let state = Arc::new(Mutex::new(SimAxisState {
            params,
            position: params.initial_position,
            velocity: 0.0,
            offset: 0.0,
            command: SimCommand::Neutral,
            brake: true,
            frozen: false,
            motor_connected: true,
            encoder_connected: true,
            applied_volts: 0.0,
            steps: 0,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimAxisHandle { state },
        )
    }
}

impl AxisIo for SimAxis {
    fn name(&self) -> &'static str {
        self.state.lock().params.name
    }

    fn update_inputs(&mut self, inputs: &mut AxisInputs) -> Result<(), HalError> {
        let mut s = self.state.lock();
        if !s.motor_connected {
            return Err(HalError::Disconnected(s.params.name));
        }
        s.step();
        inputs.motor_connected = true;
        inputs.encoder_connected = s.encoder_connected;
        inputs.position = s.position - s.offset;
        inputs.velocity = s.velocity;
        inputs.applied_volts = s.applied_volts;
        inputs.torque_current = s.applied_volts * s.params.amps_per_volt;
        Ok(())
    }

    fn run_position(&mut self, position: f64, feedforward: f64) {
        self.state.lock().command = SimCommand::Position {
            target: position,
            feedforward,
        };
    }

    fn run_open_loop(&mut self, output: f64) {
        self.state.lock().command = SimCommand::OpenLoop(output);
    }

    fn stop(&mut self) {
        self.state.lock().command = SimCommand::Neutral;
    }

    fn set_brake_mode(&mut self, enabled: bool) {
        let mut s = self.state.lock();
        if s.brake != enabled {
            debug!(
                "Sim axis {}: {} mode",
                s.params.name,
                if enabled { "brake" } else { "coast" }
            );
        }
        s.brake = enabled;
    }

    fn reset_position(&mut self, position: f64) {
        let mut s = self.state.lock();
        s.offset = s.position - position;
        debug!(
            "Sim axis {}: position redefined as {:.4} (offset {:.4})",
            s.params.name, position, s.offset
        );
    }
}

impl SimAxisHandle {
    /// Position in the measured frame.
    pub fn position(&self) -> f64 {
        let s = self.state.lock();
        s.position - s.offset
    }

    /// Position in the physical frame (hard stops live here).
    pub fn physical_position(&self) -> f64 {
        self.state.lock().position
    }

    /// Current velocity.
    pub fn velocity(&self) -> f64 {
        self.state.lock().velocity
    }

    /// Last command received.
    pub fn command(&self) -> SimCommand {
        self.state.lock().command
    }

    /// True when the last command was neutral.
    pub fn is_neutral(&self) -> bool {
        matches!(self.command(), SimCommand::Neutral)
    }

    /// True when brake mode is selected.
    pub fn brake_enabled(&self) -> bool {
        self.state.lock().brake
    }

    /// Number of physics steps taken.
    pub fn steps(&self) -> u64 {
        self.state.lock().steps
    }

    /// Freeze the mechanism in place (jammed axis).
    pub fn set_frozen(&self, frozen: bool) {
        self.state.lock().frozen = frozen;
    }

    /// Simulate the motor controller dropping off the bus.
    pub fn set_motor_connected(&self, connected: bool) {
        self.state.lock().motor_connected = connected;
    }

    /// Simulate the position sensor dropping out.
    pub fn set_encoder_connected(&self, connected: bool) {
        self.state.lock().encoder_connected = connected;
    }

    /// Shift the measured frame against the physical one, as a relative
    /// encoder that slipped or lost its count would.
    pub fn set_encoder_offset(&self, offset: f64) {
        self.state.lock().offset = offset;
    }

    /// Move the mechanism to a physical position without dynamics.
    pub fn teleport(&self, physical_position: f64) {
        let mut s = self.state.lock();
        s.position = physical_position;
        s.velocity = 0.0;
    }
}
