//! Superstructure configuration structs.
//!
//! Loaded from a single TOML file. Every top-level section has a default
//! equal to the reference constants, so an empty file yields a complete
//! configuration. A section that is present must be complete except for
//! fields marked optional.
//!
//! Units: lift values in meters, pivot values in radians, time in seconds.
//! Pose overrides take the pivot angle in degrees.
//!
//! # TOML Example
//!
//! ```toml
//! run_mode = "sim"
//!
//! [shared]
//! service_name = "hoist-cu"
//!
//! [cycle]
//! period_s = 0.02
//! telemetry_interval = 5
//!
//! [poses.L4_CORAL]
//! height = 1.42
//! pivot_deg = -47.0
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{ConfigError, SharedConfig, Validate, require_positive};
use crate::consts::LOOP_PERIOD_S;
use crate::superstructure::state::SuperstructureState;

// ─── Run Mode ───────────────────────────────────────────────────────

/// Execution mode of the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Real hardware.
    #[default]
    Real,
    /// Pure physics simulation; the sticky e-stop is suppressed.
    Sim,
    /// Replay of recorded inputs.
    Replay,
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Trapezoidal profile limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileConstraints {
    /// Maximum velocity [unit/s].
    pub max_velocity: f64,
    /// Maximum acceleration [unit/s²].
    pub max_acceleration: f64,
}

impl ProfileConstraints {
    fn validate(&self, axis: &str) -> Result<(), ConfigError> {
        require_positive(&format!("{axis}.max_velocity"), self.max_velocity)?;
        require_positive(&format!("{axis}.max_acceleration"), self.max_acceleration)
    }
}

/// Feedforward gains for one height band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeedforwardGains {
    /// Static friction [V], signed by setpoint velocity.
    #[serde(default)]
    pub ks: f64,
    /// Gravity / holding [V].
    #[serde(default)]
    pub kg: f64,
    /// Acceleration [V per unit/s²].
    #[serde(default)]
    pub ka: f64,
}

/// How the gravity term varies with position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityModel {
    /// Constant holding term (vertical lift).
    Constant,
    /// Scaled by the cosine of the measured angle (pivot).
    Cosine,
}

/// Half-open wrap range applied to goals before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WrapRange {
    /// Inclusive lower bound.
    pub lower: f64,
    /// Exclusive upper bound.
    pub upper: f64,
}

/// Static characterization ramp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterizationConfig {
    /// Output ramp rate [V/s].
    pub ramp_rate: f64,
    /// Velocity that marks breakaway [unit/s].
    pub velocity_threshold: f64,
}

impl Default for CharacterizationConfig {
    fn default() -> Self {
        Self {
            ramp_rate: 0.2,
            velocity_threshold: 0.1,
        }
    }
}

/// Hard-stop homing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomingConfig {
    /// Open-loop output while seeking the hard stop [V].
    pub volts: f64,
    /// Speed below which the axis counts as stalled [unit/s].
    pub velocity_threshold: f64,
    /// How long the stall must persist [s].
    pub debounce_s: f64,
}

impl HomingConfig {
    /// Lift: down into the bottom stop.
    pub fn elevator_default() -> Self {
        Self {
            volts: -2.0,
            velocity_threshold: 0.05,
            debounce_s: 0.25,
        }
    }

    /// Pivot: up into the stop at its maximum angle.
    pub fn pivot_default() -> Self {
        Self {
            volts: 3.0,
            velocity_threshold: 0.1,
            debounce_s: 0.2,
        }
    }
}

/// One closed-loop axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Lowest reachable goal.
    pub min_position: f64,
    /// Highest reachable goal.
    pub max_position: f64,
    /// Goals are wrapped into this range before clamping.
    #[serde(default)]
    pub wrap: Option<WrapRange>,
    /// Default profile limits.
    pub constraints: ProfileConstraints,
    /// Slower limits used while algae is held.
    #[serde(default)]
    pub held_constraints: Option<ProfileConstraints>,
    /// Allowed |measured - setpoint| before the e-stop debounce runs.
    pub tolerance: f64,
    /// Rising debounce on the out-of-tolerance signal [s].
    #[serde(default = "default_estop_debounce")]
    pub estop_debounce_s: f64,
    /// Gravity term shape.
    pub gravity: GravityModel,
    /// Feedforward gains per height band; one entry means no banding.
    pub gains: Vec<FeedforwardGains>,
    /// Setpoint positions separating consecutive bands.
    #[serde(default)]
    pub stage_thresholds: Vec<f64>,
    /// Static characterization ramp.
    #[serde(default)]
    pub characterization: CharacterizationConfig,
    /// Hard-stop homing; `None` for absolute-encoder axes. Negative output
    /// homes to `min_position`, positive output to `max_position`.
    #[serde(default)]
    pub homing: Option<HomingConfig>,
}

fn default_estop_debounce() -> f64 {
    0.25
}

impl AxisConfig {
    /// Reference lift: 1.7 m travel, three stages.
    pub fn elevator_default() -> Self {
        Self {
            min_position: 0.0,
            max_position: 1.7,
            wrap: None,
            constraints: ProfileConstraints {
                max_velocity: 2.5,
                max_acceleration: 8.0,
            },
            held_constraints: Some(ProfileConstraints {
                max_velocity: 1.5,
                max_acceleration: 4.0,
            }),
            tolerance: 0.5,
            estop_debounce_s: default_estop_debounce(),
            gravity: GravityModel::Constant,
            gains: vec![
                FeedforwardGains { ks: 0.1, kg: 0.30, ka: 0.02 },
                FeedforwardGains { ks: 0.1, kg: 0.45, ka: 0.03 },
                FeedforwardGains { ks: 0.1, kg: 0.60, ka: 0.04 },
            ],
            stage_thresholds: vec![0.6, 1.1],
            characterization: CharacterizationConfig::default(),
            homing: Some(HomingConfig::elevator_default()),
        }
    }

    /// Reference pivot: goals wrapped into [-270°, 90°).
    pub fn pivot_default() -> Self {
        Self {
            min_position: (-235.0f64).to_radians(),
            max_position: 35.0f64.to_radians(),
            wrap: Some(WrapRange {
                lower: -1.5 * std::f64::consts::PI,
                upper: 0.5 * std::f64::consts::PI,
            }),
            constraints: ProfileConstraints {
                max_velocity: 2000.0f64.to_radians(),
                max_acceleration: 8000.0f64.to_radians(),
            },
            held_constraints: None,
            tolerance: 0.1,
            estop_debounce_s: default_estop_debounce(),
            gravity: GravityModel::Cosine,
            gains: vec![FeedforwardGains { ks: 0.15, kg: 0.25, ka: 0.0 }],
            stage_thresholds: Vec::new(),
            characterization: CharacterizationConfig::default(),
            homing: None,
        }
    }

    /// Validate limits and gain banding for the axis called `name`.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !(self.min_position < self.max_position) {
            return Err(ConfigError::ValidationError(format!(
                "{name}: min_position {} must be below max_position {}",
                self.min_position, self.max_position
            )));
        }
        if let Some(wrap) = self.wrap {
            if !(wrap.lower < wrap.upper) {
                return Err(ConfigError::ValidationError(format!(
                    "{name}: wrap range is inverted"
                )));
            }
        }
        self.constraints.validate(name)?;
        if let Some(held) = &self.held_constraints {
            held.validate(name)?;
        }
        require_positive(&format!("{name}.tolerance"), self.tolerance)?;
        require_positive(&format!("{name}.estop_debounce_s"), self.estop_debounce_s)?;
        if self.gains.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{name}: at least one gains entry is required"
            )));
        }
        if self.stage_thresholds.len() + 1 != self.gains.len() {
            return Err(ConfigError::ValidationError(format!(
                "{name}: {} gains entries need {} stage thresholds, got {}",
                self.gains.len(),
                self.gains.len() - 1,
                self.stage_thresholds.len()
            )));
        }
        if self.stage_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::ValidationError(format!(
                "{name}: stage thresholds must increase"
            )));
        }
        require_positive(
            &format!("{name}.characterization.ramp_rate"),
            self.characterization.ramp_rate,
        )?;
        if let Some(homing) = &self.homing {
            if homing.volts == 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.homing.volts must not be zero"
                )));
            }
            require_positive(&format!("{name}.homing.debounce_s"), homing.debounce_s)?;
            require_positive(
                &format!("{name}.homing.velocity_threshold"),
                homing.velocity_threshold,
            )?;
        }
        Ok(())
    }
}

// ─── Rollers ────────────────────────────────────────────────────────

/// Roller velocity signature that indicates a held game piece.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VelocitySignature {
    /// Piece held when |velocity| <= threshold (stalled on the piece).
    Below { velocity: f64 },
    /// Piece held when |velocity| >= threshold (spinning with the piece).
    Above { velocity: f64 },
}

impl VelocitySignature {
    /// Evaluate the signature against a measured roller velocity.
    #[inline]
    pub fn matches(&self, velocity: f64) -> bool {
        match *self {
            Self::Below { velocity: limit } => velocity.abs() <= limit,
            Self::Above { velocity: limit } => velocity.abs() >= limit,
        }
    }
}

/// Current-gated, debounced game-piece detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Detection only runs above this |current| [A].
    pub current_floor: f64,
    /// Velocity signature of a held piece.
    pub signature: VelocitySignature,
    /// Rising debounce [s].
    pub debounce_s: f64,
}

/// Tunnel (coral) roller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TunnelConfig {
    pub intake_volts: f64,
    pub dispense_volts: f64,
    pub l1_dispense_volts: f64,
    pub detector: DetectorConfig,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            intake_volts: 3.0,
            dispense_volts: 6.0,
            l1_dispense_volts: 4.0,
            detector: DetectorConfig {
                current_floor: 5.0,
                signature: VelocitySignature::Below { velocity: 3.0 },
                debounce_s: 0.1,
            },
        }
    }
}

/// Gripper (algae) roller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GripperConfig {
    pub grip_current: f64,
    pub eject_current: f64,
    pub l1_eject_current: f64,
    pub detector: DetectorConfig,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            grip_current: 30.0,
            eject_current: -30.0,
            l1_eject_current: -15.0,
            detector: DetectorConfig {
                current_floor: 5.0,
                signature: VelocitySignature::Above { velocity: 1.0 },
                debounce_s: 0.1,
            },
        }
    }
}

// ─── Geometry ───────────────────────────────────────────────────────

/// Mechanism geometry shared by poses and edge tasks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Highest lift goal any pose may request [m].
    pub elevator_max_travel: f64,
    /// Lowest lift height at which the pivot may cross [m].
    pub pass_through_min_height: f64,
    /// Lift height of the coral intake posture [m].
    pub intake_height: f64,
    /// Amplitude of the intake wiggle [m].
    pub intake_wiggle_amplitude: f64,
    /// Angular rate of the intake wiggle [rad/s].
    pub intake_wiggle_rate: f64,
    /// Time the throw edge waits before applying extras [s].
    pub throw_eject_time_s: f64,
    /// Below this setpoint a stowed lift rests on its hard stop [m].
    pub stowed_rest_height: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            elevator_max_travel: 1.7,
            pass_through_min_height: 0.6,
            intake_height: 0.04,
            intake_wiggle_amplitude: 0.008,
            intake_wiggle_rate: 25.0,
            throw_eject_time_s: 0.25,
            stowed_rest_height: 0.05,
        }
    }
}

// ─── Cycle ──────────────────────────────────────────────────────────

/// Fixed-rate loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Control period [s].
    pub period_s: f64,
    /// Telemetry snapshot interval [cycles].
    pub telemetry_interval: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_s: LOOP_PERIOD_S,
            telemetry_interval: 5,
        }
    }
}

// ─── Poses ──────────────────────────────────────────────────────────

/// Replace part of a state's reference pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PoseOverride {
    /// Lift height [m].
    #[serde(default)]
    pub height: Option<f64>,
    /// Pivot angle [deg].
    #[serde(default)]
    pub pivot_deg: Option<f64>,
}

// ─── Root ───────────────────────────────────────────────────────────

/// Complete superstructure configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperstructureConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub run_mode: RunMode,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default = "AxisConfig::elevator_default")]
    pub elevator: AxisConfig,
    #[serde(default = "AxisConfig::pivot_default")]
    pub pivot: AxisConfig,
    #[serde(default)]
    pub tunnel: TunnelConfig,
    #[serde(default)]
    pub gripper: GripperConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Slam mechanism fitted on this hardware revision.
    #[serde(default)]
    pub slam_installed: bool,
    /// Per-state pose overrides keyed by state name.
    #[serde(default)]
    pub poses: BTreeMap<SuperstructureState, PoseOverride>,
}

impl Default for SuperstructureConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            run_mode: RunMode::default(),
            cycle: CycleConfig::default(),
            elevator: AxisConfig::elevator_default(),
            pivot: AxisConfig::pivot_default(),
            tunnel: TunnelConfig::default(),
            gripper: GripperConfig::default(),
            geometry: GeometryConfig::default(),
            slam_installed: false,
            poses: BTreeMap::new(),
        }
    }
}

impl Validate for SuperstructureConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        require_positive("cycle.period_s", self.cycle.period_s)?;
        if self.cycle.telemetry_interval == 0 {
            return Err(ConfigError::ValidationError(
                "cycle.telemetry_interval must be at least 1".to_string(),
            ));
        }
        self.elevator.validate("elevator")?;
        self.pivot.validate("pivot")?;
        if self.elevator.homing.is_none() {
            return Err(ConfigError::ValidationError(
                "elevator.homing is required".to_string(),
            ));
        }
        for (name, detector) in [
            ("tunnel", &self.tunnel.detector),
            ("gripper", &self.gripper.detector),
        ] {
            require_positive(&format!("{name}.detector.debounce_s"), detector.debounce_s)?;
            if detector.current_floor < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.detector.current_floor must not be negative"
                )));
            }
        }

        let g = &self.geometry;
        if g.elevator_max_travel > self.elevator.max_position {
            return Err(ConfigError::ValidationError(format!(
                "geometry.elevator_max_travel {} exceeds elevator.max_position {}",
                g.elevator_max_travel, self.elevator.max_position
            )));
        }
        if !(g.pass_through_min_height >= self.elevator.min_position
            && g.pass_through_min_height <= g.elevator_max_travel)
        {
            return Err(ConfigError::ValidationError(
                "geometry.pass_through_min_height must lie within lift travel".to_string(),
            ));
        }
        require_positive("geometry.throw_eject_time_s", g.throw_eject_time_s)?;

        for (state, pose) in &self.poses {
            if state.is_pseudo() {
                return Err(ConfigError::ValidationError(format!(
                    "poses.{state}: pseudo-states have no pose"
                )));
            }
            if let Some(height) = pose.height {
                if !(self.elevator.min_position..=g.elevator_max_travel).contains(&height) {
                    return Err(ConfigError::ValidationError(format!(
                        "poses.{state}.height {height} is outside lift travel"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
