//! Simulated operator inputs

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::RefCell, collections::HashMap, f64::consts::PI, rc::Rc, time::Instant};

use teleop_if::sens::{SensorSource, SliderAxis, SliderSource};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Latest slider and tilt values, shared between the host which sets them and the control core
/// which reads them.
///
/// Clones share the same values.
#[derive(Clone, Default)]
pub struct SimInputs {
    values: Rc<RefCell<Values>>
}

#[derive(Default)]
struct Values {
    sliders: HashMap<SliderAxis, f64>,
    tilt_pitch_rad: Option<f64>
}

/// Tilt sensor swaying sinusoidally about level.
pub struct SineTilt {
    amplitude_rad: f64,
    period_s: f64,
    origin: Instant
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl SimInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_slider(&self, axis: SliderAxis, value: f64) {
        self.values.borrow_mut().sliders.insert(axis, value);
    }

    pub fn set_tilt(&self, pitch_rad: f64) {
        self.values.borrow_mut().tilt_pitch_rad = Some(pitch_rad);
    }
}

impl SliderSource for SimInputs {
    fn read_value(&mut self, axis: SliderAxis) -> Option<f64> {
        self.values.borrow().sliders.get(&axis).copied()
    }
}

impl SensorSource for SimInputs {
    fn read_tilt_pitch(&mut self) -> Option<f64> {
        self.values.borrow().tilt_pitch_rad
    }
}

impl SineTilt {
    pub fn new(amplitude_rad: f64, period_s: f64) -> Self {
        Self {
            amplitude_rad,
            period_s,
            origin: Instant::now()
        }
    }

    /// Pitch at `t_s` seconds after the origin.
    pub fn pitch_at(&self, t_s: f64) -> f64 {
        if self.period_s <= 0.0 {
            return 0.0;
        }

        self.amplitude_rad * (2.0 * PI * t_s / self.period_s).sin()
    }
}

impl SensorSource for SineTilt {
    fn read_tilt_pitch(&mut self) -> Option<f64> {
        Some(self.pitch_at(self.origin.elapsed().as_secs_f64()))
    }
}
