//! # Equipment Interface
//!
//! This module defines the interfaces through which the teleoperation core drives the robot's
//! equipment.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod act;
pub mod anim;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use act::*;
pub use anim::*;
