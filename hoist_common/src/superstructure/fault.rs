//! Advisory and fault bitflags for the superstructure.
//!
//! Disconnection flags are advisories only: they never stop motion by
//! themselves. Flags marked CRITICAL correspond to the sticky e-stop path.

use bitflags::bitflags;

bitflags! {
    /// Superstructure advisories, recomputed every tick.
    ///
    /// CRITICAL flags: ELEVATOR_OUT_OF_TOLERANCE, PIVOT_OUT_OF_TOLERANCE, ESTOP_LATCHED.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Advisory: u16 {
        /// Lift motor controller not reporting.
        const ELEVATOR_DISCONNECTED      = 0x0001;
        /// Pivot motor controller not reporting.
        const PIVOT_MOTOR_DISCONNECTED   = 0x0002;
        /// Pivot absolute encoder not reporting.
        const PIVOT_ENCODER_DISCONNECTED = 0x0004;
        /// Tunnel roller not reporting.
        const TUNNEL_DISCONNECTED        = 0x0008;
        /// Gripper roller not reporting.
        const GRIPPER_DISCONNECTED       = 0x0010;
        /// Lift tracking error debounced past tolerance. **CRITICAL**.
        const ELEVATOR_OUT_OF_TOLERANCE  = 0x0020;
        /// Pivot tracking error debounced past tolerance. **CRITICAL**.
        const PIVOT_OUT_OF_TOLERANCE     = 0x0040;
        /// Sticky e-stop is latched. **CRITICAL**.
        const ESTOP_LATCHED              = 0x0080;
        /// Operator force-disable override is held.
        const DISABLE_OVERRIDE           = 0x0100;
    }
}

impl Advisory {
    /// Mask of all CRITICAL flags.
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::ELEVATOR_OUT_OF_TOLERANCE.bits()
            | Self::PIVOT_OUT_OF_TOLERANCE.bits()
            | Self::ESTOP_LATCHED.bits(),
    );

    /// Mask of all disconnection advisories.
    pub const DISCONNECTED_MASK: Self = Self::from_bits_truncate(
        Self::ELEVATOR_DISCONNECTED.bits()
            | Self::PIVOT_MOTOR_DISCONNECTED.bits()
            | Self::PIVOT_ENCODER_DISCONNECTED.bits()
            | Self::TUNNEL_DISCONNECTED.bits()
            | Self::GRIPPER_DISCONNECTED.bits(),
    );

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }

    /// Returns true if any device is not reporting.
    #[inline]
    pub const fn any_disconnected(&self) -> bool {
        self.intersects(Self::DISCONNECTED_MASK)
    }
}

impl Default for Advisory {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Per-axis fault flags reported by an axis controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisFault: u8 {
        /// Motor controller not reporting.
        const MOTOR_DISCONNECTED   = 0x01;
        /// Position sensor not reporting.
        const ENCODER_DISCONNECTED = 0x02;
        /// Debounced tracking error past tolerance.
        const OUT_OF_TOLERANCE     = 0x04;
    }
}

impl Default for AxisFault {
    fn default() -> Self {
        Self::empty()
    }
}
