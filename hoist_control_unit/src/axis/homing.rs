//! Hard-stop homing.
//!
//! Suspends the profile, drives the axis open-loop into a hard stop and
//! waits until the speed stays under a threshold for the debounce window.
//! The stall position is then declared the home position and closed-loop
//! control resumes. The sign of the configured output picks the stop.
//!
//! Cancelling keeps whatever calibration the axis had before homing began.

use hoist_common::superstructure::config::{AxisConfig, HomingConfig};
use tracing::info;

use super::AxisContext;
use super::profiled::ProfiledAxis;
use crate::control::debounce::Debouncer;

/// Homing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingState {
    Idle,
    Seeking,
    Done,
}

/// Open-loop hard-stop homing of one axis.
#[derive(Debug, Clone)]
pub struct Homing {
    config: HomingConfig,
    home_position: f64,
    debounce: Debouncer,
    state: HomingState,
    was_homed: bool,
}

impl Homing {
    /// Homing that declares the stall position `home_position`.
    pub fn new(config: HomingConfig, home_position: f64) -> Self {
        Self {
            config,
            home_position,
            debounce: Debouncer::rising(config.debounce_s),
            state: HomingState::Idle,
            was_homed: false,
        }
    }

    /// Homing for an axis, if it has one. The home position is the travel
    /// limit the configured output drives toward.
    pub fn for_axis(config: &AxisConfig) -> Option<Self> {
        config.homing.map(|homing| {
            let home = if homing.volts < 0.0 {
                config.min_position
            } else {
                config.max_position
            };
            Self::new(homing, home)
        })
    }

    /// Begin seeking. The axis is suspended and marked un-homed.
    pub fn start(&mut self, axis: &mut ProfiledAxis) {
        info!("{}: homing started", axis.name());
        self.was_homed = axis.is_homed();
        axis.suspend();
        axis.set_homed(false);
        self.debounce.reset();
        self.state = HomingState::Seeking;
    }

    /// Advance one tick; call after the axis has read its inputs.
    pub fn tick(&mut self, axis: &mut ProfiledAxis, ctx: &AxisContext) {
        if self.state != HomingState::Seeking {
            return;
        }
        // No output, no evidence: do not count a stopped axis as stalled.
        if !ctx.output_permitted() || axis.is_estopped() {
            self.debounce.reset();
            return;
        }

        axis.run_open_loop(self.config.volts, ctx);
        let stalled = self
            .debounce
            .calculate(axis.velocity().abs() <= self.config.velocity_threshold, ctx.dt);
        if stalled {
            axis.reset_position(self.home_position);
            axis.set_homed(true);
            axis.resume();
            self.state = HomingState::Done;
            info!("{}: homing complete", axis.name());
        }
    }

    /// Abort seeking and hand control back to the profile.
    pub fn cancel(&mut self, axis: &mut ProfiledAxis) {
        if self.state == HomingState::Seeking {
            info!("{}: homing cancelled", axis.name());
            axis.stop();
            axis.set_homed(self.was_homed);
            axis.resume();
            self.state = HomingState::Idle;
        }
    }

    pub fn state(&self) -> HomingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == HomingState::Seeking
    }

    pub fn home_position(&self) -> f64 {
        self.home_position
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
