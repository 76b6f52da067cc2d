//! Arc drive calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use super::*;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Perform the arc command calculations.
///
/// The arc speed blends from the target speed towards the point turn speed
/// as the turn sharpens. The blend factor is the cube of the turn magnitude,
/// so gentle steering barely slows the robot while hard steering slows it
/// sharply. The point turn speed is only used as the floor of the blend when
/// it is below the target speed, so steering never speeds the robot up.
///
/// The radius shrinks linearly from `max_arc_radius_mm` when driving straight
/// down to `min_arc_radius_mm`.
pub(crate) fn calc_arc(target_speed_mmps: f64, target_turn: f64, params: &Params) -> DriveCommand {
    let turn_mag = clamp(&target_turn.abs(), &0.0, &1.0);
    let speed_mag = target_speed_mmps.abs();

    let floor_mmps = params.point_turn_speed_mmps.min(speed_mag);
    let arc_speed_mmps = lerp(floor_mmps, speed_mag, 1.0 - turn_mag.powi(3));

    let radius_mag_mm = (params.max_arc_radius_mm * (1.0 - turn_mag))
        .max(params.min_arc_radius_mm);

    DriveCommand {
        mode: DriveMode::Arc,
        speed_mmps: target_speed_mmps.signum() * arc_speed_mmps,
        radius_mm: radius_sign(target_turn) * radius_mag_mm
    }
}
