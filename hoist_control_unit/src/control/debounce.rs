//! Boolean debouncer.
//!
//! Suppresses changes from the baseline until the input has held the
//! non-baseline value for a continuous `time`. Time advances by the
//! caller-supplied `dt`, so behavior is deterministic under test.

use hoist_common::consts::EPSILON;

/// Which edges are debounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceKind {
    /// Baseline `false`; a `true` input must persist.
    #[default]
    Rising,
    /// Baseline `true`; a `false` input must persist.
    Falling,
    /// The baseline follows the last accepted value.
    Both,
}

/// Debounces a boolean signal sampled at a fixed period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debouncer {
    time: f64,
    kind: DebounceKind,
    baseline: bool,
    elapsed: f64,
}

impl Debouncer {
    /// Debouncer requiring `time` seconds of persistence.
    pub fn new(time: f64, kind: DebounceKind) -> Self {
        Self {
            time,
            kind,
            baseline: kind == DebounceKind::Falling,
            elapsed: 0.0,
        }
    }

    /// Rising-edge debouncer.
    pub fn rising(time: f64) -> Self {
        Self::new(time, DebounceKind::Rising)
    }

    /// Feed one sample taken `dt` seconds after the previous one.
    pub fn calculate(&mut self, input: bool, dt: f64) -> bool {
        if input == self.baseline {
            self.elapsed = 0.0;
            return self.baseline;
        }

        self.elapsed += dt;
        if self.elapsed >= self.time - EPSILON {
            if self.kind == DebounceKind::Both {
                self.baseline = input;
                self.elapsed = 0.0;
            }
            input
        } else {
            self.baseline
        }
    }

    /// Forget any partial persistence.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.baseline = self.kind == DebounceKind::Falling;
    }

    /// Start from an already accepted `value`, as if it had persisted.
    pub fn prime(&mut self, value: bool) {
        match self.kind {
            DebounceKind::Both => {
                self.baseline = value;
                self.elapsed = 0.0;
            }
            _ => {
                self.reset();
                if value != self.baseline {
                    self.elapsed = self.time;
                }
            }
        }
    }

    /// Required persistence [s].
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
