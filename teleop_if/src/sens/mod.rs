//! # Sensor Interface
//!
//! Sources of operator input polled by the teleoperation core.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A tilt sensor, typically the accelerometer of the operator's handset.
pub trait SensorSource {
    /// Read the current pitch of the handset.
    ///
    /// Returns `None` if no reading is available. Implementations may also return non-finite
    /// values, which the core treats the same as `None`.
    ///
    /// Units: radians
    fn read_tilt_pitch(&mut self) -> Option<f64>;
}

/// A set of on-screen sliders.
pub trait SliderSource {
    /// Read the latest value of the given slider, between 0 and 1.
    ///
    /// Returns `None` if the slider has not reported a value yet.
    fn read_value(&mut self, axis: SliderAxis) -> Option<f64>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Sliders available to the operator.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum SliderAxis {
    /// Drive speed slider, 0 is full reverse and 1 is turbo.
    Drive,

    /// Head slider, 0 is full down and 1 is full up.
    Head,
}
