//! Superstructure state identifiers and the small enums attached to them.
//!
//! All enums use `#[repr(u8)]` for compact layout; `SuperstructureState`
//! doubles as the vertex index of the state graph.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use std::fmt;
use std::str::FromStr;

use crate::consts::STATE_COUNT;

// ─── Named States ───────────────────────────────────────────────────

/// A named mechanical configuration of the lift and pivot.
///
/// `Start`, `AutoStart` and `Characterization` are pseudo-states with no
/// pose; each has a single outgoing edge to `Stow`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SuperstructureState {
    /// Power-on state; left only through the homing edge.
    Start = 0,
    /// Autonomous start with a pre-loaded coral; lift is assumed homed.
    AutoStart = 1,
    /// Diagnostic mode preempting all motion.
    Characterization = 2,
    /// Lift down, pivot tucked.
    Stow = 3,
    /// Coral intake from the funnel.
    Intake = 4,
    /// Drop a coral without scoring.
    GoodbyeCoral = 5,
    /// `GoodbyeCoral` with the tunnel running out.
    GoodbyeCoralEject = 6,
    L1Coral = 7,
    L2Coral = 8,
    L3Coral = 9,
    L4Coral = 10,
    L1CoralEject = 11,
    L2CoralEject = 12,
    L3CoralEject = 13,
    L4CoralEject = 14,
    /// Coral scoring with the pivot past the pass-through point.
    L1CoralReversed = 15,
    L2CoralReversed = 16,
    L3CoralReversed = 17,
    L4CoralReversed = 18,
    L1CoralReversedEject = 19,
    L2CoralReversedEject = 20,
    L3CoralReversedEject = 21,
    L4CoralReversedEject = 22,
    AlgaeFloorIntake = 23,
    /// Keep gripping while stowed with algae.
    AlgaeStowIntake = 24,
    AlgaeL2Intake = 25,
    AlgaeL3Intake = 26,
    /// Holding algae, lift low.
    AlgaeStow = 27,
    /// Pass-through sentinel: pivot crossing, lift at a safe height.
    Unreversed = 28,
    /// Lined up with the processor.
    PostPreProcessor = 29,
    /// Algae ejected into the processor.
    Processed = 30,
    PreToss = 31,
    Toss = 32,
    /// Lift raised for a net throw.
    PreThrown = 33,
    /// Net throw in progress.
    Thrown = 34,
}

const_assert!(SuperstructureState::Thrown as usize + 1 == STATE_COUNT);

impl SuperstructureState {
    /// Every state in discriminant order.
    pub const ALL: [Self; STATE_COUNT] = [
        Self::Start,
        Self::AutoStart,
        Self::Characterization,
        Self::Stow,
        Self::Intake,
        Self::GoodbyeCoral,
        Self::GoodbyeCoralEject,
        Self::L1Coral,
        Self::L2Coral,
        Self::L3Coral,
        Self::L4Coral,
        Self::L1CoralEject,
        Self::L2CoralEject,
        Self::L3CoralEject,
        Self::L4CoralEject,
        Self::L1CoralReversed,
        Self::L2CoralReversed,
        Self::L3CoralReversed,
        Self::L4CoralReversed,
        Self::L1CoralReversedEject,
        Self::L2CoralReversedEject,
        Self::L3CoralReversedEject,
        Self::L4CoralReversedEject,
        Self::AlgaeFloorIntake,
        Self::AlgaeStowIntake,
        Self::AlgaeL2Intake,
        Self::AlgaeL3Intake,
        Self::AlgaeStow,
        Self::Unreversed,
        Self::PostPreProcessor,
        Self::Processed,
        Self::PreToss,
        Self::Toss,
        Self::PreThrown,
        Self::Thrown,
    ];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < STATE_COUNT {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Vertex index in the state graph.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Upper-case identifier used in logs, telemetry and config keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::AutoStart => "AUTO_START",
            Self::Characterization => "CHARACTERIZATION",
            Self::Stow => "STOW",
            Self::Intake => "INTAKE",
            Self::GoodbyeCoral => "GOODBYE_CORAL",
            Self::GoodbyeCoralEject => "GOODBYE_CORAL_EJECT",
            Self::L1Coral => "L1_CORAL",
            Self::L2Coral => "L2_CORAL",
            Self::L3Coral => "L3_CORAL",
            Self::L4Coral => "L4_CORAL",
            Self::L1CoralEject => "L1_CORAL_EJECT",
            Self::L2CoralEject => "L2_CORAL_EJECT",
            Self::L3CoralEject => "L3_CORAL_EJECT",
            Self::L4CoralEject => "L4_CORAL_EJECT",
            Self::L1CoralReversed => "L1_CORAL_REVERSED",
            Self::L2CoralReversed => "L2_CORAL_REVERSED",
            Self::L3CoralReversed => "L3_CORAL_REVERSED",
            Self::L4CoralReversed => "L4_CORAL_REVERSED",
            Self::L1CoralReversedEject => "L1_CORAL_REVERSED_EJECT",
            Self::L2CoralReversedEject => "L2_CORAL_REVERSED_EJECT",
            Self::L3CoralReversedEject => "L3_CORAL_REVERSED_EJECT",
            Self::L4CoralReversedEject => "L4_CORAL_REVERSED_EJECT",
            Self::AlgaeFloorIntake => "ALGAE_FLOOR_INTAKE",
            Self::AlgaeStowIntake => "ALGAE_STOW_INTAKE",
            Self::AlgaeL2Intake => "ALGAE_L2_INTAKE",
            Self::AlgaeL3Intake => "ALGAE_L3_INTAKE",
            Self::AlgaeStow => "ALGAE_STOW",
            Self::Unreversed => "UNREVERSED",
            Self::PostPreProcessor => "POST_PRE_PROCESSOR",
            Self::Processed => "PROCESSED",
            Self::PreToss => "PRE_TOSS",
            Self::Toss => "TOSS",
            Self::PreThrown => "PRE_THROWN",
            Self::Thrown => "THROWN",
        }
    }

    /// True for the pseudo-states that carry no pose.
    #[inline]
    pub const fn is_pseudo(self) -> bool {
        matches!(
            self,
            Self::Start | Self::AutoStart | Self::Characterization
        )
    }
}

impl Default for SuperstructureState {
    fn default() -> Self {
        Self::Start
    }
}

impl fmt::Display for SuperstructureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown superstructure state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for SuperstructureState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

// ─── Static State Tags ──────────────────────────────────────────────

/// Coarse lift height band, used only for pass-through safety checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Height {
    /// At or below the lowest safety band.
    Bottom = 0,
    /// Within the first lift stage.
    FirstStage = 1,
    /// Second stage and above.
    SecondStage = 2,
}

impl Height {
    /// True when this band is at or below `other`.
    #[inline]
    pub fn at_or_below(self, other: Self) -> bool {
        self <= other
    }
}

impl Default for Height {
    fn default() -> Self {
        Self::Bottom
    }
}

/// Goal of the slam mechanism that obstructs the lift's lowest band.
///
/// The mechanism is absent on the current hardware revision; the tag is
/// carried so edge tasks keep their sequencing once it is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SlamGoal {
    Retract = 0,
    HalfOut = 1,
    Extend = 2,
}

impl Default for SlamGoal {
    fn default() -> Self {
        Self::Retract
    }
}

/// Gripper command carried by a state; mapped to a current by config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum GripperGoal {
    Idle = 0,
    Grip = 1,
    Eject = 2,
    L1Eject = 3,
}

impl Default for GripperGoal {
    fn default() -> Self {
        Self::Idle
    }
}

/// Tunnel command carried by a state; mapped to a voltage by config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TunnelGoal {
    Idle = 0,
    Intake = 1,
    Dispense = 2,
    L1Dispense = 3,
}

impl Default for TunnelGoal {
    fn default() -> Self {
        Self::Idle
    }
}

/// Held-game-piece gating tag of a graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AlgaeGate {
    /// Usable regardless of the held signal.
    None = 0,
    /// Usable only while no algae is held.
    NoAlgae = 1,
    /// Usable only while algae is held.
    Algae = 2,
}

impl AlgaeGate {
    /// True when an edge with this tag is usable given `has_algae`.
    #[inline]
    pub const fn permits(self, has_algae: bool) -> bool {
        match self {
            Self::None => true,
            Self::NoAlgae => !has_algae,
            Self::Algae => has_algae,
        }
    }
}

impl Default for AlgaeGate {
    fn default() -> Self {
        Self::None
    }
}

// ─── Scoring Lookup ─────────────────────────────────────────────────

/// Reef scoring level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReefLevel {
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
}

/// Coral scoring state for `level`.
///
/// While algae is held the reversed orientation is used so the gripper
/// keeps the algae clear of the reef.
pub const fn scoring_state(level: ReefLevel, algae: bool, eject: bool) -> SuperstructureState {
    use SuperstructureState as S;
    match (level, algae, eject) {
        (ReefLevel::L1, false, false) => S::L1Coral,
        (ReefLevel::L1, false, true) => S::L1CoralEject,
        (ReefLevel::L1, true, false) => S::L1CoralReversed,
        (ReefLevel::L1, true, true) => S::L1CoralReversedEject,
        (ReefLevel::L2, false, false) => S::L2Coral,
        (ReefLevel::L2, false, true) => S::L2CoralEject,
        (ReefLevel::L2, true, false) => S::L2CoralReversed,
        (ReefLevel::L2, true, true) => S::L2CoralReversedEject,
        (ReefLevel::L3, false, false) => S::L3Coral,
        (ReefLevel::L3, false, true) => S::L3CoralEject,
        (ReefLevel::L3, true, false) => S::L3CoralReversed,
        (ReefLevel::L3, true, true) => S::L3CoralReversedEject,
        (ReefLevel::L4, false, false) => S::L4Coral,
        (ReefLevel::L4, false, true) => S::L4CoralEject,
        (ReefLevel::L4, true, false) => S::L4CoralReversed,
        (ReefLevel::L4, true, true) => S::L4CoralReversedEject,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
