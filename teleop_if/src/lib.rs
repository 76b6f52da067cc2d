//! # Teleoperation interface crate.
//!
//! Provides all interfaces between the teleoperation core and the collaborators it drives or
//! is driven by: the robot's actuators, its animation player, the operator's input sources and
//! the host clock.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Clock interface used to schedule the control loop
pub mod clock;

/// Command and completion definitions for equipment (actuators and the animation player)
pub mod eqpt;

/// Timestamped operator input events, as read from input scripts
pub mod input;

/// Sensor and slider input sources
pub mod sens;
