//! # Hoist Control Unit Library
//!
//! Sequences a lift and a pivoting end effector through named mechanical
//! configurations, picking safe paths through a hand-curated state graph
//! while the goal may change at any moment, mid-transition included.
//!
//! ## Layers
//!
//! 1. **Superstructure**: facade ticked once per period by [`cycle`]
//! 2. **TransitionScheduler**: `current` / `next` / `goal`, search and re-routing
//! 3. **StateGraph**: gated edges and their step-list tasks, built once
//! 4. **Mechanisms**: lift homing, rollers, piece detection, characterization
//! 5. **ProfiledAxis**: trapezoidal profile, feedforward, debounced e-stop
//!
//! ## Single-Threaded Tick
//!
//! Every write to scheduler state happens inside `Superstructure::tick` or a
//! goal change called from the same thread. Nothing in the tick path
//! returns an error: faults become advisories and neutral outputs.

pub mod axis;
pub mod config;
pub mod control;
pub mod cycle;
pub mod graph;
pub mod mechanism;
pub mod safety;
pub mod state;
pub mod superstructure;
pub mod task;
pub mod telemetry;
