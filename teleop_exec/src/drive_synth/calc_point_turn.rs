//! Point turn calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Perform the point turn command calculations.
///
/// The robot rotates about a point between its wheels. Speed scales with the
/// turn magnitude, the radius is a fixed minimal value signed by the turn
/// direction.
pub(crate) fn calc_point_turn(target_turn: f64, params: &Params) -> DriveCommand {
    DriveCommand {
        mode: DriveMode::PointTurn,
        speed_mmps: params.point_turn_speed_mmps * target_turn.abs(),
        radius_mm: radius_sign(target_turn) * POINT_TURN_RADIUS_MM
    }
}
