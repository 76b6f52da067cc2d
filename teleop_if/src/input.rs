//! # Operator input events
//!
//! Input events are used to replay an operator's actions from a script, for instance when running
//! the core against simulated equipment.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sens::SliderAxis;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single operator input.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    /// A slider was moved to the given value.
    Slider { axis: SliderAxis, value: f64 },

    /// The handset was tilted to the given pitch in radians.
    Tilt { pitch_rad: f64 },

    /// The lift was observed away from its demanded height.
    LiftDrift,

    /// The held lift height was changed.
    LiftHeight { ratio: f64 },
}

/// Errors which can occur while parsing an input event.
#[derive(Debug, Error)]
pub enum InputParseError {
    #[error("Could not parse the input event JSON: {0}")]
    JsonError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputEvent {
    /// Parse an input event from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, InputParseError> {
        serde_json::from_str(json_str).map_err(InputParseError::JsonError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_slider_event() {
        let evt = InputEvent::from_json(r#"{"Slider": {"axis": "Drive", "value": 0.75}}"#)
            .unwrap();

        assert_eq!(
            evt,
            InputEvent::Slider {
                axis: SliderAxis::Drive,
                value: 0.75
            }
        );
        assert_eq!(InputEvent::from_json(r#""LiftDrift""#).unwrap(), InputEvent::LiftDrift);
        assert!(InputEvent::from_json(r#"{"Wheels": 1.0}"#).is_err());
    }
}
