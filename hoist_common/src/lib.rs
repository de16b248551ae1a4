//! Hoist Common Library
//!
//! This crate provides the shared vocabulary of the hoist workspace: named
//! superstructure states, height categories, game-piece gating tags, fault
//! flags, hardware IO traits and configuration loading utilities.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide constants
//! - [`hal`] - Axis and roller IO traits consumed by the control unit
//! - [`superstructure`] - State identifiers, static state data tags, faults, config
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hoist_common::prelude::*;
//!
//! let state = SuperstructureState::from_u8(3);
//! assert_eq!(state, Some(SuperstructureState::Stow));
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod superstructure;
