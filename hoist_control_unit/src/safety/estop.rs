//! Sticky superstructure e-stop.
//!
//! Latched by the OR of the axes' debounced out-of-tolerance signals and
//! held until a human acknowledges it: the falling edge of the disable
//! override, or an explicit [`EStopLatch::clear`]. In pure simulation the
//! latch never sets.

use hoist_common::superstructure::config::RunMode;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EStopLatch {
    latched: bool,
    suppressed: bool,
    disable_override: bool,
}

impl EStopLatch {
    pub fn new(run_mode: RunMode) -> Self {
        Self {
            latched: false,
            suppressed: run_mode == RunMode::Sim,
            disable_override: false,
        }
    }

    /// Update with this tick's trip signal and disable override state.
    /// Returns the latched flag.
    pub fn update(&mut self, trip: bool, disable_override: bool) -> bool {
        if self.disable_override && !disable_override && self.latched {
            info!("E-stop cleared by disable override release");
            self.latched = false;
        }
        self.disable_override = disable_override;

        if trip && !self.suppressed && !self.latched {
            warn!("E-stop latched: axis out of tolerance");
            self.latched = true;
        }
        self.latched
    }

    pub fn clear(&mut self) {
        if self.latched {
            info!("E-stop cleared");
        }
        self.latched = false;
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }
}
