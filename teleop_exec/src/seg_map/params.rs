//! Parameters structure for SegMap

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{HeadThresholds, SpeedThresholds};
use crate::params::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Segment Mapping.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {

    // ---- SPEED SLIDER ----

    /// Slider values at or below this are in the Reverse segment.
    pub reverse_threshold: f64,

    /// Slider values above this are in the Forward segment.
    pub forward_threshold: f64,

    /// Slider values above this are in the Turbo segment.
    pub turbo_threshold: f64,

    // ---- HEAD SLIDER ----

    /// Slider values at or below this move the head down.
    pub head_down_threshold: f64,

    /// Slider values above this move the head up.
    pub head_up_threshold: f64,

    // ---- TILT ----

    /// Half width of the band around zero pitch which maps to no turn.
    ///
    /// Units: radians
    pub tilt_neutral_deadzone_rad: f64,

    // ---- CHANGE DETECTION ----

    /// Minimum change in magnitude (or turn direction) reported as a change
    /// when the segment itself has not changed.
    pub change_epsilon: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            reverse_threshold: 0.2,
            forward_threshold: 0.4,
            turbo_threshold: 0.9,
            head_down_threshold: 0.35,
            head_up_threshold: 0.65,
            tilt_neutral_deadzone_rad: 0.1,
            change_epsilon: 0.01
        }
    }
}

impl Params {
    pub fn speed_thresholds(&self) -> SpeedThresholds {
        SpeedThresholds {
            reverse: self.reverse_threshold,
            forward: self.forward_threshold,
            turbo: self.turbo_threshold
        }
    }

    pub fn head_thresholds(&self) -> HeadThresholds {
        HeadThresholds {
            down: self.head_down_threshold,
            up: self.head_up_threshold
        }
    }

    /// Check the ordering and range invariants of the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let invalid = |reason: &str| Err(ParamsError::Invalid(
            "seg_map", reason.to_string()));

        let all = [
            self.reverse_threshold,
            self.forward_threshold,
            self.turbo_threshold,
            self.head_down_threshold,
            self.head_up_threshold,
            self.tilt_neutral_deadzone_rad,
            self.change_epsilon
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return invalid("all parameters must be finite");
        }

        if !(0.0 < self.reverse_threshold
            && self.reverse_threshold < self.forward_threshold
            && self.forward_threshold < self.turbo_threshold
            && self.turbo_threshold <= 1.0)
        {
            return invalid("expected 0 < reverse < forward < turbo <= 1");
        }

        if !(0.0 < self.head_down_threshold
            && self.head_down_threshold < self.head_up_threshold
            && self.head_up_threshold < 1.0)
        {
            return invalid("expected 0 < head_down < head_up < 1");
        }

        if !(0.0..1.0).contains(&self.tilt_neutral_deadzone_rad) {
            return invalid("expected 0 <= tilt_neutral_deadzone_rad < 1");
        }

        if self.change_epsilon < 0.0 {
            return invalid("change_epsilon must not be negative");
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let p = Params {
            forward_threshold: 0.95,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = Params {
            head_down_threshold: 0.7,
            ..Default::default()
        };
        assert!(p.validate().is_err());

        let p = Params {
            tilt_neutral_deadzone_rad: 1.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
