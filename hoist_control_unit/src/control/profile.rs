//! Trapezoidal motion profile.
//!
//! Computes the time-optimal, velocity- and acceleration-bounded state at
//! time `t` along a profile from `current` to `goal`. Axis controllers call
//! it once per tick with `t = period`, feeding back the previous result, so
//! each setpoint is at most one period of constrained motion away from the
//! last.
//!
//! A current or goal velocity that is nonzero is handled by extending the
//! profile as if it began and ended at rest, then truncating.

use hoist_common::superstructure::config::ProfileConstraints;

/// Position and velocity on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProfileState {
    /// Position [unit].
    pub position: f64,
    /// Velocity [unit/s].
    pub velocity: f64,
}

impl ProfileState {
    /// State at rest at `position`.
    #[inline]
    pub const fn at_rest(position: f64) -> Self {
        Self {
            position,
            velocity: 0.0,
        }
    }

    #[inline]
    fn scaled(self, direction: f64) -> Self {
        Self {
            position: self.position * direction,
            velocity: self.velocity * direction,
        }
    }
}

/// Trapezoidal profile generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidProfile {
    constraints: ProfileConstraints,
}

impl TrapezoidProfile {
    /// Create a profile with the given limits.
    pub const fn new(constraints: ProfileConstraints) -> Self {
        Self { constraints }
    }

    /// Active limits.
    #[inline]
    pub const fn constraints(&self) -> ProfileConstraints {
        self.constraints
    }

    /// Replace the limits.
    pub fn set_constraints(&mut self, constraints: ProfileConstraints) {
        self.constraints = constraints;
    }

    /// State at time `t` after `current` on the profile toward `goal`.
    pub fn calculate(&self, t: f64, current: ProfileState, goal: ProfileState) -> ProfileState {
        let max_v = self.constraints.max_velocity;
        let max_a = self.constraints.max_acceleration;

        // Work in a frame where the goal is ahead.
        let direction = if current.position > goal.position {
            -1.0
        } else {
            1.0
        };
        let mut start = current.scaled(direction);
        let goal = goal.scaled(direction);

        if start.velocity.abs() > max_v {
            start.velocity = max_v.copysign(start.velocity);
        }

        let cutoff_begin = start.velocity / max_a;
        let cutoff_dist_begin = cutoff_begin * cutoff_begin * max_a / 2.0;
        let cutoff_end = goal.velocity / max_a;
        let cutoff_dist_end = cutoff_end * cutoff_end * max_a / 2.0;

        let full_trapezoid_dist =
            (cutoff_dist_begin + (goal.position - start.position) + cutoff_dist_end).max(0.0);
        let mut acceleration_time = max_v / max_a;
        let mut full_speed_dist =
            full_trapezoid_dist - acceleration_time * acceleration_time * max_a;

        // Triangle profile: never reaches max velocity.
        if full_speed_dist < 0.0 {
            acceleration_time = (full_trapezoid_dist / max_a).sqrt();
            full_speed_dist = 0.0;
        }

        let end_accel = acceleration_time - cutoff_begin;
        let end_full_speed = end_accel + full_speed_dist / max_v;
        let end_decel = end_full_speed + acceleration_time - cutoff_end;

        let mut result = start;
        if t < end_accel {
            result.velocity += t * max_a;
            result.position += (start.velocity + t * max_a / 2.0) * t;
        } else if t < end_full_speed {
            result.velocity = max_v;
            result.position += (start.velocity + end_accel * max_a / 2.0) * end_accel
                + max_v * (t - end_accel);
        } else if t <= end_decel {
            let time_left = end_decel - t;
            result.velocity = goal.velocity + time_left * max_a;
            result.position = goal.position - (goal.velocity + time_left * max_a / 2.0) * time_left;
        } else {
            result = goal;
        }

        result.scaled(direction)
    }

    /// Total time from `current` to `goal` (both assumed at rest).
    pub fn total_time(&self, current: f64, goal: f64) -> f64 {
        let max_v = self.constraints.max_velocity;
        let max_a = self.constraints.max_acceleration;
        let distance = (goal - current).abs();
        let accel_time = max_v / max_a;
        let accel_dist = accel_time * accel_time * max_a;
        if distance < accel_dist {
            2.0 * (distance / max_a).sqrt()
        } else {
            2.0 * accel_time + (distance - accel_dist) / max_v
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
