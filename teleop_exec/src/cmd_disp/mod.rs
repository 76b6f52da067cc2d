//! Command dispatch module
//!
//! The dispatcher is the only producer of actuator demands. Each tick it
//! synthesises the wheel, head and lift demands from the latest mapped
//! inputs, compares them against what was last sent on each channel and
//! sends only the channels which changed beyond their threshold.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use state::*;
use crate::drive_synth::{DriveCommand, DriveState};
use teleop_if::eqpt::ActChannel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Last sent value of each channel.
///
/// Only used for change detection, and only updated once a demand has been
/// accepted by the actuator sink.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RateState {
    pub drive: DriveState,

    /// Units: radians/second
    pub head_speed_radps: f64,

    /// `None` until the first lift demand has been sent.
    pub lift_height: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A demand on one actuator channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum ActCmd {
    /// Wheel command, with the drive state to adopt once it is sent.
    Wheels {
        cmd: DriveCommand,
        next: DriveState
    },

    /// Units: radians/second
    Head {
        speed_radps: f64
    },

    /// Ratio of full lift travel
    Lift {
        height: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActCmd {
    pub fn channel(&self) -> ActChannel {
        match self {
            ActCmd::Wheels { .. } => ActChannel::Wheels,
            ActCmd::Head { .. } => ActChannel::Head,
            ActCmd::Lift { .. } => ActChannel::Lift
        }
    }
}
