//! # Animation Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Callback invoked by the animation player once a triggered animation has finished.
///
/// The argument is `true` if the animation played successfully.
pub type AnimCallback = Box<dyn FnOnce(bool) + Send + 'static>;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An animation player on the robot.
///
/// `play_trigger` shall return immediately. The callback is invoked exactly once, at some later
/// point, from any thread.
pub trait AnimationPlayer {
    fn play_trigger(&mut self, trigger: AnimTrigger, on_complete: AnimCallback);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Animation triggers for the driving posture.
///
/// Each drive segment with a posture has a start animation, played when the segment is entered,
/// and most have an end animation, played when the segment is left.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum AnimTrigger {
    DriveForwardStart,
    DriveForwardEnd,
    DriveReverseStart,
    DriveReverseEnd,
    DriveTurboStart,
}
