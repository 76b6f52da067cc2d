//! Segment mapping module
//!
//! Converts continuous operator inputs (slider positions and handset tilt)
//! into discrete segments and normalised magnitudes. The mapping functions in
//! this module are pure, [`SegMap`] adds the change detection which stops
//! sensor noise from producing a stream of new commands.

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
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A discrete segment of an input axis together with the normalised
/// magnitude of the input within that segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Mapping<S> {
    pub segment: S,

    /// Position within the segment, between 0 and 1.
    pub magnitude: f64
}

/// Speed slider thresholds.
///
/// Must satisfy `0 < reverse < forward < turbo <= 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedThresholds {
    pub reverse: f64,
    pub forward: f64,
    pub turbo: f64
}

/// Head slider thresholds.
///
/// Must satisfy `0 < down < up < 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadThresholds {
    pub down: f64,
    pub up: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Segments of the drive speed slider.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum SpeedSegment {
    Turbo,
    Forward,
    Neutral,
    Reverse
}

/// Segments of the head slider.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum HeadSegment {
    Forward,
    Neutral,
    Reverse
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SpeedSegment {
    fn default() -> Self {
        SpeedSegment::Neutral
    }
}

impl Default for HeadSegment {
    fn default() -> Self {
        HeadSegment::Neutral
    }
}

impl<S: Default> Default for Mapping<S> {
    fn default() -> Self {
        Self {
            segment: S::default(),
            magnitude: 0.0
        }
    }
}

impl HeadSegment {
    /// Direction of head motion for this segment, up is positive.
    pub fn sign(&self) -> f64 {
        match self {
            HeadSegment::Forward => 1.0,
            HeadSegment::Neutral => 0.0,
            HeadSegment::Reverse => -1.0
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a speed slider value onto a speed segment.
///
/// The bands are `[0, reverse]` for Reverse, `(reverse, forward]` for
/// Neutral, `(forward, turbo]` for Forward and `(turbo, 1]` for Turbo.
/// Magnitude ramps linearly from 0 at the Neutral edge of the Reverse and
/// Forward bands to 1 at their far edge, Turbo is always saturated.
pub fn map_speed_slider(
    value: f64, 
    thresholds: &SpeedThresholds
) -> Mapping<SpeedSegment> {
    if value <= thresholds.reverse {
        Mapping {
            segment: SpeedSegment::Reverse,
            magnitude: unit_clamp(
                (thresholds.reverse - value) / thresholds.reverse)
        }
    }
    else if value > thresholds.turbo {
        Mapping {
            segment: SpeedSegment::Turbo,
            magnitude: 1.0
        }
    }
    else if value > thresholds.forward {
        Mapping {
            segment: SpeedSegment::Forward,
            magnitude: unit_clamp(
                (value - thresholds.forward) 
                / (thresholds.turbo - thresholds.forward))
        }
    }
    else {
        Mapping::default()
    }
}

/// Map a head slider value onto a head segment.
///
/// Same shape as the speed slider without a saturated band: `[0, down]` is
/// Reverse (head down), `(down, up]` is Neutral and `(up, 1]` is Forward
/// (head up).
pub fn map_head_slider(
    value: f64, 
    thresholds: &HeadThresholds
) -> Mapping<HeadSegment> {
    if value <= thresholds.down {
        Mapping {
            segment: HeadSegment::Reverse,
            magnitude: unit_clamp((thresholds.down - value) / thresholds.down)
        }
    }
    else if value > thresholds.up {
        Mapping {
            segment: HeadSegment::Forward,
            magnitude: unit_clamp(
                (value - thresholds.up) / (1.0 - thresholds.up))
        }
    }
    else {
        Mapping::default()
    }
}

/// Map the handset's pitch onto a turn direction in [-1, 1].
///
/// The pitch is clamped to [-1, 1] radians, pitches within
/// `neutral_deadzone` of zero map to exactly zero and the remaining range is
/// rescaled onto [0, 1] while keeping the sign. Non-finite pitches map to
/// zero.
pub fn map_tilt(tilt_rad: f64, neutral_deadzone: f64) -> f64 {
    if !tilt_rad.is_finite() {
        return 0.0;
    }

    let pitch = clamp(&tilt_rad, &-1.0, &1.0);

    if pitch.abs() <= neutral_deadzone {
        return 0.0;
    }

    let magnitude = lin_map((neutral_deadzone, 1.0), (0.0, 1.0), pitch.abs());

    clamp(&(pitch.signum() * magnitude), &-1.0, &1.0)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn unit_clamp(value: f64) -> f64 {
    clamp(&value, &0.0, &1.0)
}
