//! Parameters structure for TeleopCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::params::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the teleoperation control loop.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Period of the control tick, the only place demands are sent.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// Period of the tilt sampler.
    ///
    /// Units: seconds
    pub tilt_sample_period_s: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            tick_period_s: 0.1,
            tilt_sample_period_s: 0.1
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, period) in [
            ("tick_period_s", self.tick_period_s), 
            ("tilt_sample_period_s", self.tilt_sample_period_s)
        ].iter() {
            if !(period.is_finite() && *period > 0.0) {
                return Err(ParamsError::Invalid(
                    "teleop_ctrl", format!("{} must be finite and positive", name)));
            }
        }

        Ok(())
    }
}
