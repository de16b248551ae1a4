//! Roller physics simulator.
//!
//! A free roller spins at a speed proportional to its command and draws
//! only friction current (voltage-saturated in torque mode). A roller in
//! contact with a game piece reports the contact's velocity and the full
//! commanded current, which is what the detectors key on.

use hoist_common::hal::{HalError, RollerInputs, RollerIo};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Physical parameters of a simulated roller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimRollerParams {
    /// Device name reported through `RollerIo::name`.
    pub name: &'static str,
    /// Free speed per applied volt [rad/s per V].
    pub velocity_per_volt: f64,
    /// Free speed per commanded amp in torque mode [rad/s per A].
    pub velocity_per_amp: f64,
    /// Current drawn while spinning free [A].
    pub free_current: f64,
    /// Current per applied volt while loaded [A/V].
    pub loaded_amps_per_volt: f64,
}

impl SimRollerParams {
    /// Reference roller named `name`.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            velocity_per_volt: 10.0,
            velocity_per_amp: 2.0,
            free_current: 1.0,
            loaded_amps_per_volt: 3.0,
        }
    }
}

/// A game piece touching the roller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceContact {
    /// Roller velocity while the piece is in contact [rad/s].
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RollerCommand {
    Neutral,
    Volts(f64),
    Current(f64),
}

#[derive(Debug)]
struct SimRollerState {
    params: SimRollerParams,
    command: RollerCommand,
    contact: Option<PieceContact>,
    connected: bool,
}

impl SimRollerState {
    fn sample(&self, inputs: &mut RollerInputs) {
        let p = &self.params;
        let (applied, free_velocity, loaded_current) = match self.command {
            RollerCommand::Neutral => (0.0, 0.0, 0.0),
            RollerCommand::Volts(v) => (v, v * p.velocity_per_volt, v * p.loaded_amps_per_volt),
            RollerCommand::Current(a) => (0.0, a * p.velocity_per_amp, a),
        };

        inputs.connected = true;
        inputs.applied_volts = applied;
        match self.contact {
            Some(contact) if self.command != RollerCommand::Neutral => {
                inputs.velocity = contact.velocity;
                inputs.torque_current = loaded_current;
            }
            _ => {
                inputs.velocity = free_velocity;
                inputs.torque_current = if free_velocity == 0.0 {
                    0.0
                } else {
                    p.free_current * free_velocity.signum()
                };
            }
        }
        trace!(
            "Sim roller {}: vel={:.2}, current={:.2}",
            p.name, inputs.velocity, inputs.torque_current
        );
    }
}

/// Simulated roller implementing [`RollerIo`].
pub struct SimRoller {
    state: Arc<Mutex<SimRollerState>>,
}

/// Shared inspection and fault-injection handle for a [`SimRoller`].
#[derive(Clone)]
pub struct SimRollerHandle {
    state: Arc<Mutex<SimRollerState>>,
}

impl SimRoller {
    /// Create a simulated roller and its handle.
    pub fn new(params: SimRollerParams) -> (Self, SimRollerHandle) {
        let state = Arc::new(Mutex::new(SimRollerState {
            params,
            command: RollerCommand::Neutral,
            contact: None,
            connected: true,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            SimRollerHandle { state },
        )
    }
}

impl RollerIo for SimRoller {
    fn name(&self) -> &'static str {
        self.state.lock().params.name
    }

    fn update_inputs(&mut self, inputs: &mut RollerInputs) -> Result<(), HalError> {
        let s = self.state.lock();
        if !s.connected {
            return Err(HalError::Disconnected(s.params.name));
        }
        s.sample(inputs);
        Ok(())
    }

    fn run_volts(&mut self, volts: f64) {
        self.state.lock().command = if volts == 0.0 {
            RollerCommand::Neutral
        } else {
            RollerCommand::Volts(volts)
        };
    }

    fn run_torque_current(&mut self, amps: f64) {
        self.state.lock().command = if amps == 0.0 {
            RollerCommand::Neutral
        } else {
            RollerCommand::Current(amps)
        };
    }

    fn stop(&mut self) {
        self.state.lock().command = RollerCommand::Neutral;
    }
}

impl SimRollerHandle {
    /// Put a game piece in contact with the roller, or remove it.
    pub fn set_contact(&self, contact: Option<PieceContact>) {
        let mut s = self.state.lock();
        debug!(
            "Sim roller {}: contact {}",
            s.params.name,
            if contact.is_some() { "made" } else { "released" }
        );
        s.contact = contact;
    }

    /// True when the last command was neutral.
    pub fn is_neutral(&self) -> bool {
        self.state.lock().command == RollerCommand::Neutral
    }

    /// Last commanded voltage, if running in voltage mode.
    pub fn commanded_volts(&self) -> Option<f64> {
        match self.state.lock().command {
            RollerCommand::Volts(v) => Some(v),
            _ => None,
        }
    }

    /// Last commanded current, if running in torque mode.
    pub fn commanded_current(&self) -> Option<f64> {
        match self.state.lock().command {
            RollerCommand::Current(a) => Some(a),
            _ => None,
        }
    }

    /// Simulate the roller dropping off the bus.
    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }
}
