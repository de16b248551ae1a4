//! Superstructure vocabulary shared by the control unit, the simulated
//! hardware and telemetry consumers.
//!
//! - [`state`] - named states, height categories, gating tags, roller goals
//! - [`fault`] - advisory and fault bitflags
//! - [`config`] - serde configuration structs with reference defaults

pub mod config;
pub mod fault;
pub mod state;
