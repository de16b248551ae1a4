//! # Hoist HAL Library
//!
//! Simulated hardware collaborators for the hoist control unit. The
//! simulation implements the `AxisIo` and `RollerIo` traits from
//! `hoist_common::hal` so the control unit runs unchanged against it.
//!
//! # Module Structure
//!
//! - [`sim`] - simulated axes and rollers with shared inspection handles
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐        ┌───────────────────────────┐
//! │  hoist_control_unit    │  IO    │  SimAxis / SimRoller      │
//! │  (Elevator, Dispenser) │◄──────►│  (physics per tick)       │
//! └────────────────────────┘ traits └─────────────┬─────────────┘
//!                                                 │ Arc<Mutex<..>>
//!                                    ┌────────────▼─────────────┐
//!                                    │  SimAxisHandle / ...     │
//!                                    │  (tests, fault injection)│
//!                                    └──────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod sim;

pub use crate::sim::{
    PieceContact, SimAxis, SimAxisHandle, SimAxisParams, SimCommand, SimRoller, SimRollerHandle,
    SimRollerParams,
};
