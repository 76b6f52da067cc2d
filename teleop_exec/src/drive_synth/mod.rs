//! Drive synthesis module
//!
//! Turns a target speed and turn direction into a wheel command. Three
//! qualitatively different regimes are used, tried in this order:
//!
//! 1. Point turn - no target speed but a new turn demand, rotate in place.
//! 2. Arc - a target speed and a change in speed or turn, drive along an arc
//!    whose radius tightens and whose speed drops as the turn sharpens.
//! 3. Stop - no target speed and no turn while the robot is still moving.
//!
//! If none apply no command is produced and the previous command stays in
//! effect. Head speed synthesis is independent of the wheels, see
//! [`synthesize_head`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_arc;
mod calc_head;
mod calc_point_turn;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use calc_head::{synthesize_head, target_head_radps};
pub use params::*;
use crate::seg_map::{Mapping, SpeedSegment};
use util::maths::{clamp, differs_by_more_than, is_near_zero, lerp};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Magnitude of the radius used for point turns.
///
/// Units: millimeters
pub const POINT_TURN_RADIUS_MM: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command for the wheels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DriveCommand {
    pub mode: DriveMode,

    /// Linear speed of the robot along the arc. Negative is backwards.
    ///
    /// Units: millimeters/second
    pub speed_mmps: f64,

    /// Signed turn radius, negative turns right. Zero for `Stop`.
    ///
    /// Units: millimeters
    pub radius_mm: f64
}

/// The drive demand currently in effect on the robot, as last commanded.
///
/// Speed and turn are the *targets* which produced the last command rather
/// than the command's own speed, so that steering (which lowers the arc
/// speed) does not register as a speed change on the next cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DriveState {
    pub mode: DriveMode,

    /// Units: millimeters/second
    pub speed_mmps: f64,

    /// Turn direction, between -1 (left) and 1 (right).
    pub turn: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Wheel command modes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum DriveMode {
    Stop,
    PointTurn,
    Arc
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCommand {
    /// Command bringing the wheels to a stop.
    pub fn stop() -> Self {
        Self {
            mode: DriveMode::Stop,
            speed_mmps: 0.0,
            radius_mm: 0.0
        }
    }
}

impl Default for DriveState {
    fn default() -> Self {
        Self {
            mode: DriveMode::Stop,
            speed_mmps: 0.0,
            turn: 0.0
        }
    }
}

impl DriveState {
    /// The state in effect once `cmd`, synthesised from the given targets,
    /// has been sent.
    ///
    /// A stop resets both speed and turn to zero.
    pub fn after(cmd: &DriveCommand, target_speed_mmps: f64, target_turn: f64) -> Self {
        match cmd.mode {
            DriveMode::Stop => Self::default(),
            DriveMode::PointTurn => Self {
                mode: DriveMode::PointTurn,
                speed_mmps: 0.0,
                turn: target_turn
            },
            DriveMode::Arc => Self {
                mode: DriveMode::Arc,
                speed_mmps: target_speed_mmps,
                turn: target_turn
            }
        }
    }

    /// Whether this state is what the given targets would leave in effect,
    /// to within the change thresholds.
    pub fn matches_targets(
        &self, 
        target_speed_mmps: f64, 
        target_turn: f64, 
        params: &Params
    ) -> bool {
        !differs_by_more_than(
            self.speed_mmps, target_speed_mmps, params.speed_change_threshold_mmps)
        && !differs_by_more_than(self.turn, target_turn, params.turn_change_threshold)
    }

    /// Whether the wheels are currently turning.
    ///
    /// A point turn has no linear speed but still counts as moving.
    pub fn is_moving(&self, speed_threshold_mmps: f64) -> bool {
        self.mode == DriveMode::PointTurn
            || !is_near_zero(self.speed_mmps, speed_threshold_mmps)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Synthesise a wheel command from the target speed and turn direction.
///
/// Returns `None` if the command currently in effect (described by
/// `current`) should be kept.
pub fn synthesize(
    target_speed_mmps: f64,
    target_turn: f64,
    current: &DriveState,
    params: &Params
) -> Option<DriveCommand> {
    let target_turn = if target_turn.is_finite() {
        clamp(&target_turn, &-1.0, &1.0)
    }
    else {
        0.0
    };
    let target_speed_mmps = if target_speed_mmps.is_finite() {
        target_speed_mmps
    }
    else {
        0.0
    };

    let speed_thr = params.speed_change_threshold_mmps;
    let turn_thr = params.turn_change_threshold;

    let speed_near_zero = is_near_zero(target_speed_mmps, speed_thr);
    let turn_near_zero = is_near_zero(target_turn, turn_thr);
    let speed_changed = differs_by_more_than(
        target_speed_mmps, current.speed_mmps, speed_thr);
    let turn_changed = differs_by_more_than(target_turn, current.turn, turn_thr);

    // Leaving an arc for a turn on the spot counts as a turn change even if
    // the tilt has not moved, otherwise the arc would keep running.
    if speed_near_zero 
        && !turn_near_zero 
        && (turn_changed || current.mode == DriveMode::Arc)
    {
        Some(calc_point_turn::calc_point_turn(target_turn, params))
    }
    else if !speed_near_zero && (speed_changed || turn_changed) {
        Some(calc_arc::calc_arc(target_speed_mmps, target_turn, params))
    }
    else if speed_near_zero && turn_near_zero && current.is_moving(speed_thr) {
        Some(DriveCommand::stop())
    }
    else {
        None
    }
}

/// Target linear speed for a speed slider mapping.
///
/// Units: millimeters/second
pub fn target_speed_mmps(mapping: &Mapping<SpeedSegment>, params: &Params) -> f64 {
    let mag = clamp(&mapping.magnitude, &0.0, &1.0);

    match mapping.segment {
        SpeedSegment::Turbo => params.turbo_speed_mmps,
        SpeedSegment::Forward => lerp(
            params.min_drive_speed_mmps, params.max_forward_speed_mmps, mag),
        SpeedSegment::Neutral => 0.0,
        SpeedSegment::Reverse => -lerp(
            params.min_drive_speed_mmps, params.max_reverse_speed_mmps, mag)
    }
}

/// Sign of the radius for a turn direction.
///
/// Turning right (positive turn) is a negative radius.
pub(crate) fn radius_sign(turn: f64) -> f64 {
    if turn > 0.0 {
        -1.0
    }
    else {
        1.0
    }
}
