//! # Teleoperation library.
//!
//! The control core which drives the robot from continuous operator input. Samples flow one way
//! through the modules:
//!
//! sliders/tilt -> `seg_map` -> `drive_synth` -> `cmd_disp` -> actuators
//!
//! with speed segment changes additionally fanning out to `trans_anim`, which keeps the posture
//! animation in step. `teleop_ctrl` ties them together for one session.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command dispatch - the only producer of actuator demands, rate limited per channel
pub mod cmd_disp;

/// Drive synthesis - converts target speed and turn into wheel and head commands
pub mod drive_synth;

/// Parameters for all modules
pub mod params;

/// Cooperative periodic timers
pub mod sched;

/// Segment mapping - converts slider and tilt samples into segments and magnitudes
pub mod seg_map;

/// Simulated collaborators for running without a robot
pub mod sim;

/// Teleoperation control - the control-loop object for a session
pub mod teleop_ctrl;

/// Transition animation - keeps the posture animation in step with the speed segment
pub mod trans_anim;
