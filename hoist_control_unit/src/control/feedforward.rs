//! Axis feedforward.
//!
//! ```text
//! ff = ks × sign(v_setpoint) + kg × g(measured) + ka × a_setpoint
//! ```
//!
//! `g` is 1 for a lift and `cos(measured)` for a pivot. Gains are picked per
//! height band from the setpoint position, so a multi-stage lift uses the
//! gravity term of the stage it is commanded into.

use hoist_common::superstructure::config::{AxisConfig, FeedforwardGains, GravityModel};

use super::math::sign;

/// Banded static/gravity/acceleration feedforward.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisFeedforward {
    gravity: GravityModel,
    gains: Vec<FeedforwardGains>,
    thresholds: Vec<f64>,
}

impl AxisFeedforward {
    /// Build from an axis configuration. An empty gain table yields zero.
    pub fn from_config(cfg: &AxisConfig) -> Self {
        Self {
            gravity: cfg.gravity,
            gains: cfg.gains.clone(),
            thresholds: cfg.stage_thresholds.clone(),
        }
    }

    /// Index of the band that contains `setpoint_position`.
    pub fn band(&self, setpoint_position: f64) -> usize {
        self.thresholds
            .iter()
            .take_while(|&&t| setpoint_position >= t)
            .count()
            .min(self.gains.len().saturating_sub(1))
    }

    /// Feedforward output [V].
    pub fn calculate(
        &self,
        setpoint_position: f64,
        setpoint_velocity: f64,
        setpoint_acceleration: f64,
        measured_position: f64,
    ) -> f64 {
        let Some(g) = self.gains.get(self.band(setpoint_position)) else {
            return 0.0;
        };
        let gravity = match self.gravity {
            GravityModel::Constant => 1.0,
            GravityModel::Cosine => measured_position.cos(),
        };
        g.ks * sign(setpoint_velocity) + g.kg * gravity + g.ka * setpoint_acceleration
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
