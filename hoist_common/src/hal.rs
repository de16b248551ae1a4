//! Hardware IO traits and error types.
//!
//! This module defines the seam between the control unit and the motor
//! controllers:
//! - `AxisIo` - a closed-loop position axis (lift, pivot)
//! - `RollerIo` - an open-loop roller (tunnel, gripper)
//! - `AxisInputs` / `RollerInputs` - per-tick measurements
//! - `HalError` - errors reported while reading inputs
//!
//! # Lifecycle
//!
//! Every control tick the owning mechanism calls `update_inputs()` exactly
//! once, then issues at most one output command. Commands are
//! fire-and-forget; a device that cannot accept them reports it through the
//! connectivity flags on the next read.
//!
//! | Operation | RT Constraint |
//! |-----------|---------------|
//! | `update_inputs()` | **HARD**, no blocking I/O |
//! | command methods | **HARD**, no allocation |

use thiserror::Error;

/// Error types for hardware reads.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Device did not answer within the cycle.
    #[error("Device disconnected: {0}")]
    Disconnected(&'static str),

    /// Device answered with unusable data.
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),
}

/// Measurements of one position-controlled axis.
///
/// Units are native to the axis: meters for the lift, radians for the pivot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisInputs {
    /// Motor controller is reporting.
    pub motor_connected: bool,
    /// Position sensor is reporting.
    pub encoder_connected: bool,
    /// Measured position.
    pub position: f64,
    /// Measured velocity [unit/s].
    pub velocity: f64,
    /// Applied output voltage [V].
    pub applied_volts: f64,
    /// Torque-producing current [A].
    pub torque_current: f64,
}

/// Measurements of one roller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollerInputs {
    /// Motor controller is reporting.
    pub connected: bool,
    /// Roller velocity [rad/s].
    pub velocity: f64,
    /// Applied output voltage [V].
    pub applied_volts: f64,
    /// Torque-producing current [A].
    pub torque_current: f64,
}

/// A closed-loop position axis.
pub trait AxisIo: Send {
    /// Device name used in advisories and logs.
    fn name(&self) -> &'static str;

    /// Refresh `inputs` with the latest measurements.
    ///
    /// # Errors
    /// `HalError::Disconnected` when the device did not report this cycle;
    /// `inputs` is left untouched in that case.
    fn update_inputs(&mut self, inputs: &mut AxisInputs) -> Result<(), HalError>;

    /// Track `position` with an additive feedforward output [V].
    fn run_position(&mut self, position: f64, feedforward: f64);

    /// Apply a raw open-loop output [V].
    fn run_open_loop(&mut self, output: f64);

    /// Command neutral output.
    fn stop(&mut self);

    /// Select brake (true) or coast (false) when neutral.
    fn set_brake_mode(&mut self, enabled: bool);

    /// Redefine the current measured position as `position`.
    fn reset_position(&mut self, position: f64);
}

/// An open-loop roller.
pub trait RollerIo: Send {
    /// Device name used in advisories and logs.
    fn name(&self) -> &'static str;

    /// Refresh `inputs` with the latest measurements.
    ///
    /// # Errors
    /// `HalError::Disconnected` when the device did not report this cycle.
    fn update_inputs(&mut self, inputs: &mut RollerInputs) -> Result<(), HalError>;

    /// Apply a voltage [V].
    fn run_volts(&mut self, volts: f64);

    /// Apply a torque current [A].
    fn run_torque_current(&mut self, amps: f64);

    /// Command neutral output.
    fn stop(&mut self);
}
