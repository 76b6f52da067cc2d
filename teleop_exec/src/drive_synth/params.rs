//! Parameters structure for DriveSynth

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::params::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Drive Synthesis.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {

    // ---- SPEEDS ----

    /// Speed at the bottom of the Forward and Reverse ramps.
    ///
    /// Units: millimeters/second
    pub min_drive_speed_mmps: f64,

    /// Speed at the top of the Forward ramp.
    ///
    /// Units: millimeters/second
    pub max_forward_speed_mmps: f64,

    /// Speed in the Turbo segment.
    ///
    /// Units: millimeters/second
    pub turbo_speed_mmps: f64,

    /// Speed at the bottom of the Reverse ramp (i.e. slider at zero).
    ///
    /// Units: millimeters/second
    pub max_reverse_speed_mmps: f64,

    /// Speed of a point turn at full tilt.
    ///
    /// Units: millimeters/second
    pub point_turn_speed_mmps: f64,

    // ---- ARC GEOMETRY ----

    /// Smallest arc radius magnitude, used at full tilt.
    ///
    /// Units: millimeters
    pub min_arc_radius_mm: f64,

    /// Largest arc radius magnitude, used when driving straight.
    ///
    /// Units: millimeters
    pub max_arc_radius_mm: f64,

    // ---- HEAD ----

    /// Head speed with the head slider at either end.
    ///
    /// Units: radians/second
    pub max_head_speed_radps: f64,

    // ---- CHANGE THRESHOLDS ----

    /// Speeds within this of each other are treated as equal, and speeds
    /// within this of zero as zero.
    ///
    /// Units: millimeters/second
    pub speed_change_threshold_mmps: f64,

    /// Turn directions within this of each other are treated as equal, and
    /// within this of zero as straight.
    pub turn_change_threshold: f64,

    /// Head speeds within this of each other are treated as equal.
    ///
    /// Units: radians/second
    pub head_speed_change_threshold_radps: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            min_drive_speed_mmps: 30.0,
            max_forward_speed_mmps: 150.0,
            turbo_speed_mmps: 220.0,
            max_reverse_speed_mmps: 100.0,
            point_turn_speed_mmps: 60.0,
            min_arc_radius_mm: 30.0,
            max_arc_radius_mm: 1000.0,
            max_head_speed_radps: 2.0,
            speed_change_threshold_mmps: 5.0,
            turn_change_threshold: 0.05,
            head_speed_change_threshold_radps: 0.05
        }
    }
}

impl Params {
    /// Check the range invariants of the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let invalid = |reason: &str| Err(ParamsError::Invalid(
            "drive_synth", reason.to_string()));

        let non_negative = [
            self.min_drive_speed_mmps,
            self.max_forward_speed_mmps,
            self.turbo_speed_mmps,
            self.max_reverse_speed_mmps,
            self.point_turn_speed_mmps,
            self.max_head_speed_radps,
            self.speed_change_threshold_mmps,
            self.turn_change_threshold,
            self.head_speed_change_threshold_radps
        ];
        if non_negative.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid("speeds and thresholds must be finite and not negative");
        }

        if self.min_drive_speed_mmps > self.max_forward_speed_mmps
            || self.min_drive_speed_mmps > self.max_reverse_speed_mmps
        {
            return invalid("min_drive_speed_mmps exceeds a maximum drive speed");
        }

        if !(self.min_arc_radius_mm.is_finite() && self.max_arc_radius_mm.is_finite())
            || self.min_arc_radius_mm <= 0.0
            || self.min_arc_radius_mm > self.max_arc_radius_mm
        {
            return invalid("expected 0 < min_arc_radius_mm <= max_arc_radius_mm");
        }

        Ok(())
    }
}
