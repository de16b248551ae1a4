//! Control primitives.
//!
//! Time-optimal trapezoidal profile, per-band feedforward, time-windowed
//! debounce and the small numeric helpers they share. Nothing here touches
//! hardware; axis controllers compose these each tick.

pub mod debounce;
pub mod feedforward;
pub mod math;
pub mod profile;
