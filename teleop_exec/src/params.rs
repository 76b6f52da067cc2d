//! # Teleoperation parameters
//!
//! All tunable constants of the teleoperation core live in a single
//! parameter file with one table per module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cmd_disp, drive_synth, seg_map, teleop_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a teleoperation session.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TeleopParams {
    pub seg_map: seg_map::Params,
    pub drive_synth: drive_synth::Params,
    pub cmd_disp: cmd_disp::Params,
    pub teleop_ctrl: teleop_ctrl::Params
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when parameters break an invariant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamsError {
    #[error("Invalid {0} parameters: {1}")]
    Invalid(&'static str, String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TeleopParams {
    /// Validate the parameters of every module.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.seg_map.validate()?;
        self.drive_synth.validate()?;
        self.cmd_disp.validate()?;
        self.teleop_ctrl.validate()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let p: TeleopParams = util::params::from_str(r#"
            [seg_map]
            turbo_threshold = 0.95

            [drive_synth]
            point_turn_speed_mmps = 80.0
        "#).unwrap();

        assert_eq!(p.seg_map.turbo_threshold, 0.95);
        assert_eq!(p.seg_map.reverse_threshold, 0.2);
        assert_eq!(p.drive_synth.point_turn_speed_mmps, 80.0);
        assert_eq!(p.teleop_ctrl.tick_period_s, 0.1);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_workspace_params_file() {
        let p: TeleopParams = util::params::from_str(
            include_str!("../../params/teleop.toml")
        ).unwrap();

        assert!(p.validate().is_ok());
    }
}
