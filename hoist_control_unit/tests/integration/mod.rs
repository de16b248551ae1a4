mod common;
mod estop;
mod graph_properties;
mod homing_characterization;
mod rerouting;
mod scenarios;
