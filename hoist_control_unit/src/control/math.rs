//! Numeric helpers shared by the controllers.

use hoist_common::consts::EPSILON;

/// True when `a` and `b` differ by at most [`EPSILON`].
#[inline]
pub fn epsilon_equals(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

/// Sign of `x` with `0.0` mapping to `0.0` (unlike `f64::signum`).
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Wrap `input` into `[lower, upper)` by whole periods of `upper - lower`.
pub fn input_modulus(input: f64, lower: f64, upper: f64) -> f64 {
    let modulus = upper - lower;
    let mut value = input;
    let above = ((value - lower) / modulus).trunc();
    value -= above * modulus;
    let below = ((value - upper) / modulus).trunc();
    value -= below * modulus;
    value
}
