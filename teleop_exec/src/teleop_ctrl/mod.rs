//! Teleoperation control module
//!
//! [`TeleopCtrl`] is the control-loop object for one teleoperation session.
//! It owns the mapper, dispatcher, transition animator and scheduler, and the
//! collaborators injected when the session is entered. All of its state is
//! mutated from the single thread which calls [`TeleopCtrl::step`].
//!
//! Two sources of asynchrony are merged into that thread:
//!
//! - The tilt sampler, a periodic timer polled by `step`.
//! - Animation completions, posted by the player's callbacks onto a channel
//!   and drained by `step` before the control tick runs.
//!
//! Both are guarded by the session's active flag, so that nothing arriving
//! after [`TeleopCtrl::exit`] has any effect.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
use teleop_if::{
    eqpt::{ActuatorSink, AnimationPlayer},
    sens::{SensorSource, SliderSource}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// External collaborators of a teleoperation session.
pub struct Collaborators {
    pub sensor: Box<dyn SensorSource>,
    pub sliders: Box<dyn SliderSource>,
    pub actuators: Box<dyn ActuatorSink>,
    pub anims: Box<dyn AnimationPlayer>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while entering a teleoperation session.
#[derive(Debug, thiserror::Error)]
pub enum TeleopCtrlError {
    #[error("Cannot enter teleoperation: {0}")]
    InvalidParams(#[from] crate::params::ParamsError)
}
