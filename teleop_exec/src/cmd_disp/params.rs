//! Parameters structure for CmdDisp

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::params::ParamsError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Command Dispatch.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {
    /// Lift height held while driving, as a ratio of full lift travel.
    pub drive_lift_height: f64,

    /// Lift heights within this of the last sent height are not resent.
    pub lift_height_change_threshold: f64,

    /// Number of consecutive send failures on a channel after which the
    /// failures are reported as errors rather than warnings.
    pub max_consec_send_failures: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            drive_lift_height: 0.0,
            lift_height_change_threshold: 0.02,
            max_consec_send_failures: 5
        }
    }
}

impl Params {
    /// Check the range invariants of the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..=1.0).contains(&self.drive_lift_height) {
            return Err(ParamsError::Invalid(
                "cmd_disp", "expected 0 <= drive_lift_height <= 1".into()));
        }

        if !(self.lift_height_change_threshold.is_finite() 
            && self.lift_height_change_threshold >= 0.0) 
        {
            return Err(ParamsError::Invalid(
                "cmd_disp", 
                "lift_height_change_threshold must be finite and not negative".into()));
        }

        Ok(())
    }
}
