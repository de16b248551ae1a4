//! Single-axis controllers.
//!
//! - [`profiled::ProfiledAxis`]: closed-loop trapezoidal position control
//!   with debounced out-of-tolerance detection.
//! - [`detector::PieceDetector`]: current-gated, debounced game-piece sensing.
//! - [`homing::Homing`]: open-loop hard-stop homing.
//! - [`characterization::StaticCharacterization`]: breakaway output ramp.
//!
//! All of them are ticked by their owning mechanism once per control
//! period with an [`AxisContext`].

pub mod characterization;
pub mod detector;
pub mod homing;
pub mod profiled;

use serde::{Deserialize, Serialize};

/// Operator override switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overrides {
    /// Force every output neutral. Its falling edge clears the e-stop.
    pub disable: bool,
    /// Neutral outputs with brakes released.
    pub coast: bool,
    /// Ignore the roller detectors: coral held, no algae.
    pub disable_detection: bool,
}

/// Per-tick inputs shared by every axis of the superstructure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisContext {
    /// Robot enabled by the external scheduler.
    pub enabled: bool,
    /// Active operator overrides.
    pub overrides: Overrides,
    /// Control period [s].
    pub dt: f64,
}

impl AxisContext {
    /// Enabled context with no overrides.
    pub fn enabled(dt: f64) -> Self {
        Self {
            enabled: true,
            overrides: Overrides::default(),
            dt,
        }
    }

    /// True when outputs may be driven at all.
    #[inline]
    pub fn output_permitted(&self) -> bool {
        self.enabled && !self.overrides.disable && !self.overrides.coast
    }
}
