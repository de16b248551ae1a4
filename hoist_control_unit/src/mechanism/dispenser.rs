//! End effector: pivot axis, coral tunnel roller and algae gripper roller.
//!
//! The tunnel runs in voltage mode, the gripper in torque-current mode.
//! A pivot with a homing section runs from its power-on position until it
//! is homed against its stop.
//! Each roller feeds its own piece detector every tick; the rollers go
//! neutral whenever outputs are not permitted or the e-stop is latched.

use hoist_common::hal::{AxisIo, RollerInputs, RollerIo};
use hoist_common::superstructure::config::{GripperConfig, SuperstructureConfig, TunnelConfig};
use hoist_common::superstructure::state::{GripperGoal, TunnelGoal};
use tracing::{debug, warn};

use crate::axis::AxisContext;
use crate::axis::detector::{DetectionOverride, PieceDetector};
use crate::axis::homing::{Homing, HomingState};
use crate::axis::profiled::ProfiledAxis;

/// One roller with its latest inputs.
struct Roller {
    io: Box<dyn RollerIo>,
    inputs: RollerInputs,
    connected: bool,
}

impl Roller {
    fn new(io: Box<dyn RollerIo>) -> Self {
        Self {
            io,
            inputs: RollerInputs::default(),
            connected: true,
        }
    }

    fn read(&mut self) {
        match self.io.update_inputs(&mut self.inputs) {
            Ok(()) => self.connected = self.inputs.connected,
            Err(e) => {
                if self.connected {
                    warn!("{}: {e}", self.io.name());
                }
                self.connected = false;
                self.inputs.torque_current = 0.0;
            }
        }
    }
}

pub struct Dispenser {
    pivot: ProfiledAxis,
    pivot_homing: Option<Homing>,
    tunnel: Roller,
    gripper: Roller,
    tunnel_config: TunnelConfig,
    gripper_config: GripperConfig,
    coral: PieceDetector,
    algae: PieceDetector,
    tunnel_goal: TunnelGoal,
    gripper_goal: GripperGoal,
    detection_disabled: bool,
}

impl Dispenser {
    pub fn new(
        pivot: Box<dyn AxisIo>,
        tunnel: Box<dyn RollerIo>,
        gripper: Box<dyn RollerIo>,
        config: &SuperstructureConfig,
    ) -> Self {
        let mut pivot = ProfiledAxis::new("pivot", pivot, &config.pivot);
        let pivot_homing = Homing::for_axis(&config.pivot);
        if pivot_homing.is_some() {
            pivot.set_homed(true);
        }
        Self {
            pivot,
            pivot_homing,
            tunnel: Roller::new(tunnel),
            gripper: Roller::new(gripper),
            tunnel_config: config.tunnel,
            gripper_config: config.gripper,
            coral: PieceDetector::new("coral", &config.tunnel.detector),
            algae: PieceDetector::new("algae", &config.gripper.detector),
            tunnel_goal: TunnelGoal::Idle,
            gripper_goal: GripperGoal::Idle,
            detection_disabled: false,
        }
    }

    pub fn tick(&mut self, ctx: &AxisContext) {
        self.pivot.tick(ctx);
        if let Some(homing) = self.pivot_homing.as_mut() {
            homing.tick(&mut self.pivot, ctx);
        }
        self.detection_disabled = ctx.overrides.disable_detection;

        self.tunnel.read();
        self.gripper.read();
        self.coral.update(
            self.tunnel.inputs.torque_current,
            self.tunnel.inputs.velocity,
            ctx.dt,
        );
        self.algae.update(
            self.gripper.inputs.torque_current,
            self.gripper.inputs.velocity,
            ctx.dt,
        );

        if !ctx.output_permitted() || self.pivot.is_estopped() {
            self.tunnel.io.stop();
            self.gripper.io.stop();
            return;
        }

        let t = &self.tunnel_config;
        match self.tunnel_goal {
            TunnelGoal::Idle => self.tunnel.io.stop(),
            TunnelGoal::Intake => self.tunnel.io.run_volts(t.intake_volts),
            TunnelGoal::Dispense => self.tunnel.io.run_volts(t.dispense_volts),
            TunnelGoal::L1Dispense => self.tunnel.io.run_volts(t.l1_dispense_volts),
        }
        let g = &self.gripper_config;
        match self.gripper_goal {
            GripperGoal::Idle => self.gripper.io.stop(),
            GripperGoal::Grip => self.gripper.io.run_torque_current(g.grip_current),
            GripperGoal::Eject => self.gripper.io.run_torque_current(g.eject_current),
            GripperGoal::L1Eject => self.gripper.io.run_torque_current(g.l1_eject_current),
        }
    }

    /// Start pivot homing. False when the pivot has no homing sequence.
    pub fn start_homing(&mut self) -> bool {
        match self.pivot_homing.as_mut() {
            Some(homing) => {
                homing.start(&mut self.pivot);
                true
            }
            None => false,
        }
    }

    pub fn cancel_homing(&mut self) {
        if let Some(homing) = self.pivot_homing.as_mut() {
            homing.cancel(&mut self.pivot);
        }
    }

    /// Pivot homing progress; `None` without a homing sequence.
    pub fn homing_state(&self) -> Option<HomingState> {
        self.pivot_homing.as_ref().map(Homing::state)
    }

    pub fn is_homing(&self) -> bool {
        self.pivot_homing.as_ref().is_some_and(Homing::is_active)
    }

    pub fn set_roller_goals(&mut self, tunnel: TunnelGoal, gripper: GripperGoal) {
        if tunnel != self.tunnel_goal || gripper != self.gripper_goal {
            debug!("Rollers: tunnel={tunnel:?} gripper={gripper:?}");
        }
        self.tunnel_goal = tunnel;
        self.gripper_goal = gripper;
    }

    pub fn roller_goals(&self) -> (TunnelGoal, GripperGoal) {
        (self.tunnel_goal, self.gripper_goal)
    }

    /// Coral held; always true while detection is disabled.
    pub fn has_coral(&self) -> bool {
        self.detection_disabled || self.coral.detected()
    }

    /// Algae held; always false while detection is disabled.
    pub fn has_algae(&self) -> bool {
        !self.detection_disabled && self.algae.detected()
    }

    pub fn mark_coral_held(&mut self) {
        self.coral.set_detected(true);
    }

    pub fn set_detection_overrides(&mut self, coral: DetectionOverride, algae: DetectionOverride) {
        self.coral.set_override(coral);
        self.algae.set_override(algae);
    }

    pub fn tunnel_connected(&self) -> bool {
        self.tunnel.connected
    }

    pub fn gripper_connected(&self) -> bool {
        self.gripper.connected
    }

    pub fn pivot(&self) -> &ProfiledAxis {
        &self.pivot
    }

    pub fn pivot_mut(&mut self) -> &mut ProfiledAxis {
        &mut self.pivot
    }
}
