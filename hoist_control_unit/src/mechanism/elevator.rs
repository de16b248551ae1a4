//! Lift mechanism: a profiled axis plus hard-stop homing.

use hoist_common::hal::AxisIo;
use hoist_common::superstructure::config::SuperstructureConfig;
use tracing::info;

use super::MechanismError;
use crate::axis::AxisContext;
use crate::axis::homing::{Homing, HomingState};
use crate::axis::profiled::ProfiledAxis;

pub struct Elevator {
    axis: ProfiledAxis,
    homing: Homing,
    home_position: f64,
}

impl Elevator {
    /// Build the lift from `config`; the lift axis must define homing.
    pub fn new(io: Box<dyn AxisIo>, config: &SuperstructureConfig) -> Result<Self, MechanismError> {
        let homing =
            Homing::for_axis(&config.elevator).ok_or(MechanismError::MissingHoming("elevator"))?;
        let home_position = config.elevator.min_position;

        let mut axis = ProfiledAxis::new("elevator", io, &config.elevator);
        axis.limit_max_position(config.geometry.elevator_max_travel);
        axis.set_rest_height(Some(config.geometry.stowed_rest_height));

        Ok(Self {
            axis,
            homing,
            home_position,
        })
    }

    /// Read inputs, run the profile, then advance homing.
    pub fn tick(&mut self, ctx: &AxisContext) {
        self.axis.tick(ctx);
        self.homing.tick(&mut self.axis, ctx);
    }

    pub fn start_homing(&mut self) {
        self.homing.start(&mut self.axis);
    }

    pub fn cancel_homing(&mut self) {
        self.homing.cancel(&mut self.axis);
    }

    pub fn homing_state(&self) -> HomingState {
        self.homing.state()
    }

    pub fn is_homing(&self) -> bool {
        self.homing.is_active()
    }

    /// Declare the current position home without moving.
    pub fn set_home_here(&mut self) {
        info!("elevator: assuming home at current position");
        self.axis.reset_position(self.home_position);
        self.axis.set_homed(true);
    }

    pub fn axis(&self) -> &ProfiledAxis {
        &self.axis
    }

    pub fn axis_mut(&mut self) -> &mut ProfiledAxis {
        &mut self.axis
    }
}
