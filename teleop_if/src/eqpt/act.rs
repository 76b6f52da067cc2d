//! # Actuator Equipment Commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for actuator demands.
///
/// All calls set a state on the robot rather than incrementing one, so repeating a call is always
/// safe. Implementations must not block waiting for an acknowledgement from the robot, they shall
/// report only whether the demand could be handed to the transport.
pub trait ActuatorSink {
    /// Drive the wheels along an arc of the given signed radius.
    ///
    /// Units: millimeters/second, millimeters. A negative radius turns right.
    fn set_wheel_arc(&mut self, speed_mmps: f64, radius_mm: f64) -> Result<(), ActuatorError>;

    /// Drive the left and right wheels at independent speeds.
    ///
    /// Units: millimeters/second
    fn set_wheels_independently(
        &mut self,
        left_mmps: f64,
        right_mmps: f64,
    ) -> Result<(), ActuatorError>;

    /// Move the head at the given angular rate.
    ///
    /// Units: radians/second
    fn set_head_speed(&mut self, speed_radps: f64) -> Result<(), ActuatorError>;

    /// Move the lift to the given height, as a ratio of its full travel between 0 and 1.
    fn set_lift_height(&mut self, height_ratio: f64) -> Result<(), ActuatorError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Actuator channels which can be commanded independently.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ActChannel {
    Wheels,
    Head,
    Lift,
}

/// Errors which can be reported by an actuator sink.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("The robot is not connected")]
    NotConnected,

    #[error("The transport rejected the demand: {0}")]
    Rejected(String),
}
