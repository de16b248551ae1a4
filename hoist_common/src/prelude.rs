//! Prelude module for common re-exports.
//!
//! ```rust
//! use hoist_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};
pub use crate::superstructure::config::{
    AxisConfig, RunMode, SuperstructureConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{EPSILON, LOOP_PERIOD_S, STATE_COUNT};

// ─── Hardware IO ────────────────────────────────────────────────────
pub use crate::hal::{AxisInputs, AxisIo, HalError, RollerInputs, RollerIo};

// ─── Superstructure ─────────────────────────────────────────────────
pub use crate::superstructure::fault::{Advisory, AxisFault};
pub use crate::superstructure::state::{
    AlgaeGate, GripperGoal, Height, ReefLevel, SlamGoal, SuperstructureState, TunnelGoal,
    scoring_state,
};
