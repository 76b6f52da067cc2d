//! # Simulated collaborators
//!
//! Stand-ins for the robot and its operator, used by the `teleop_exec`
//! binary to run the control core without hardware:
//!
//! - [`SimInputs`] - slider and tilt values set by an input script.
//! - [`SineTilt`] - a tilt sensor swaying sinusoidally, for unscripted runs.
//! - [`LoggingActuatorSink`] - logs every demand, optionally failing some.
//! - [`ThreadedAnimPlayer`] - completes each animation from a background
//!   thread after a fixed duration.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod act;
mod anim;
mod inputs;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use act::*;
pub use anim::*;
pub use inputs::*;
