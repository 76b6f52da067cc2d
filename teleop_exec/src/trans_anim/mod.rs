//! Transition animation module
//!
//! Keeps the robot's driving posture animation in step with the commanded
//! speed segment. When the segment changes the animation for leaving the old
//! segment is played ("out"), followed by the animation for entering the new
//! one ("in"). Segment changes which arrive while an animation is playing are
//! chased: only the latest requested segment is ever animated in.
//!
//! Completions from the animation player are never handled re-entrantly. Each
//! completion callback posts an [`AnimCompletion`] onto a channel owned by the
//! session, which the control loop drains at tick boundaries and feeds back
//! through [`TransAnim::on_complete`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use state::*;
use crate::seg_map::SpeedSegment;
use teleop_if::eqpt::AnimTrigger;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Completion of an animation request, as posted to the completion channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnimCompletion {
    /// Session which made the request.
    pub session_id: u64,

    /// Request which completed.
    pub request_id: u64,

    /// `false` if the player could not play the animation.
    pub success: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phase of a transition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Phase {
    /// No transition in progress.
    None,

    /// Playing the animation leaving the current segment.
    Out,

    /// Playing the animation entering the target segment.
    In
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Phase {
    fn default() -> Self {
        Phase::None
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Animation played when leaving a segment.
///
/// Turbo shares the forward end animation. Neutral has none.
pub fn end_trigger(segment: SpeedSegment) -> Option<AnimTrigger> {
    match segment {
        SpeedSegment::Turbo | SpeedSegment::Forward => Some(AnimTrigger::DriveForwardEnd),
        SpeedSegment::Reverse => Some(AnimTrigger::DriveReverseEnd),
        SpeedSegment::Neutral => None
    }
}

/// Animation played when entering a segment.
///
/// Neutral has none.
pub fn start_trigger(segment: SpeedSegment) -> Option<AnimTrigger> {
    match segment {
        SpeedSegment::Turbo => Some(AnimTrigger::DriveTurboStart),
        SpeedSegment::Forward => Some(AnimTrigger::DriveForwardStart),
        SpeedSegment::Reverse => Some(AnimTrigger::DriveReverseStart),
        SpeedSegment::Neutral => None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_triggers() {
        assert_eq!(end_trigger(SpeedSegment::Turbo), Some(AnimTrigger::DriveForwardEnd));
        assert_eq!(end_trigger(SpeedSegment::Forward), Some(AnimTrigger::DriveForwardEnd));
        assert_eq!(end_trigger(SpeedSegment::Reverse), Some(AnimTrigger::DriveReverseEnd));
        assert_eq!(end_trigger(SpeedSegment::Neutral), None);

        assert_eq!(start_trigger(SpeedSegment::Turbo), Some(AnimTrigger::DriveTurboStart));
        assert_eq!(start_trigger(SpeedSegment::Forward), Some(AnimTrigger::DriveForwardStart));
        assert_eq!(start_trigger(SpeedSegment::Reverse), Some(AnimTrigger::DriveReverseStart));
        assert_eq!(start_trigger(SpeedSegment::Neutral), None);
    }
}
