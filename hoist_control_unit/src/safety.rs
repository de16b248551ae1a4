//! Safety module root.
//!
//! Sticky e-stop latch aggregated from the per-axis tolerance monitors.

pub mod estop;
