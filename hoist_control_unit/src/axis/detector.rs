//! Sensorless game-piece detection.
//!
//! A roller holding a piece draws current well above its free-spinning
//! level. Only then is the velocity signature meaningful, so the debounce
//! is updated with the signature while the current is above the floor and
//! fed its own previous output otherwise. The detected flag therefore holds
//! through quiescent periods.

use hoist_common::superstructure::config::{DetectorConfig, VelocitySignature};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::control::debounce::Debouncer;

/// Operator override of a single detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOverride {
    #[default]
    None,
    ForceTrue,
    ForceFalse,
}

/// Current-gated, debounced piece detector.
#[derive(Debug, Clone)]
pub struct PieceDetector {
    name: &'static str,
    current_floor: f64,
    signature: VelocitySignature,
    debounce: Debouncer,
    detected: bool,
    override_: DetectionOverride,
}

impl PieceDetector {
    pub fn new(name: &'static str, config: &DetectorConfig) -> Self {
        Self {
            name,
            current_floor: config.current_floor,
            signature: config.signature,
            debounce: Debouncer::rising(config.debounce_s),
            detected: false,
            override_: DetectionOverride::None,
        }
    }

    /// Feed one roller sample.
    pub fn update(&mut self, torque_current: f64, velocity: f64, dt: f64) {
        let detected = if torque_current.abs() >= self.current_floor {
            self.debounce
                .calculate(self.signature.matches(velocity), dt)
        } else {
            self.debounce.calculate(self.detected, dt);
            self.detected
        };
        if detected != self.detected {
            debug!("{}: detected={}", self.name, detected);
        }
        self.detected = detected;
    }

    /// Detected flag after applying the override.
    pub fn detected(&self) -> bool {
        match self.override_ {
            DetectionOverride::None => self.detected,
            DetectionOverride::ForceTrue => true,
            DetectionOverride::ForceFalse => false,
        }
    }

    /// Raw debounced flag, ignoring the override.
    pub fn raw_detected(&self) -> bool {
        self.detected
    }

    /// Force the detected flag, e.g. for a pre-loaded piece.
    pub fn set_detected(&mut self, detected: bool) {
        self.detected = detected;
        self.debounce.prime(detected);
    }

    pub fn set_override(&mut self, value: DetectionOverride) {
        self.override_ = value;
    }

    pub fn override_value(&self) -> DetectionOverride {
        self.override_
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
