//! System-wide constants for the hoist workspace.
//!
//! Single source of truth for numeric limits and default paths.

use std::time::Duration;

/// Fixed control period in seconds (50 Hz).
pub const LOOP_PERIOD_S: f64 = 0.02;

/// Fixed control period as `Duration`.
pub const LOOP_PERIOD: Duration = Duration::from_millis(20);

/// Number of named superstructure states.
pub const STATE_COUNT: usize = 35;

/// Upper bound on graph edges (every ordered pair of distinct states).
pub const MAX_EDGES: usize = STATE_COUNT * (STATE_COUNT - 1);

/// Numeric epsilon used for "setpoint equals goal" checks.
pub const EPSILON: f64 = 1e-9;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/superstructure.toml";
