//! Simulation module.
//!
//! Software stand-ins for the superstructure motor controllers. Each device
//! advances its physics by one control period per `update_inputs()` call,
//! so a simulation stays in lock-step with the control loop that reads it.

mod axis;
mod roller;

pub use axis::{SimAxis, SimAxisHandle, SimAxisParams, SimCommand};
pub use roller::{PieceContact, SimRoller, SimRollerHandle, SimRollerParams};
