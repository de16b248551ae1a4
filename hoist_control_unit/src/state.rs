//! Superstructure state machine.
//!
//! - [`transition`]: current / next / goal bookkeeping, shortest-hop
//!   scheduling and live re-routing over the state graph.

pub mod transition;

pub use transition::{SchedulerInputs, TransitionScheduler, TransitionState};
