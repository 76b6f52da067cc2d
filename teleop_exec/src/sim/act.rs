//! Logging actuator sink

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;

use teleop_if::eqpt::{ActuatorError, ActuatorSink};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Actuator sink which logs each demand instead of sending it.
///
/// If `fail_every` is set every n-th demand is rejected, to exercise the dispatcher's retries.
#[derive(Default)]
pub struct LoggingActuatorSink {
    fail_every: Option<u32>,
    num_demands: u32,
    num_rejected: u32
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl LoggingActuatorSink {
    pub fn new(fail_every: Option<u32>) -> Self {
        Self {
            // Zero means never
            fail_every: fail_every.filter(|&n| n > 0),
            ..Self::default()
        }
    }

    pub fn num_demands(&self) -> u32 {
        self.num_demands
    }

    pub fn num_rejected(&self) -> u32 {
        self.num_rejected
    }

    fn accept(&mut self, desc: String) -> Result<(), ActuatorError> {
        self.num_demands += 1;

        if let Some(n) = self.fail_every {
            if self.num_demands % n == 0 {
                self.num_rejected += 1;
                return Err(ActuatorError::Rejected(format!("simulated failure of {}", desc)));
            }
        }

        info!("Demand: {}", desc);
        Ok(())
    }
}

impl ActuatorSink for LoggingActuatorSink {
    fn set_wheel_arc(&mut self, speed_mmps: f64, radius_mm: f64) -> Result<(), ActuatorError> {
        self.accept(format!("wheel arc {:.1} mm/s, radius {:.1} mm", speed_mmps, radius_mm))
    }

    fn set_wheels_independently(
        &mut self,
        left_mmps: f64,
        right_mmps: f64,
    ) -> Result<(), ActuatorError> {
        self.accept(format!("wheels left {:.1} mm/s, right {:.1} mm/s", left_mmps, right_mmps))
    }

    fn set_head_speed(&mut self, speed_radps: f64) -> Result<(), ActuatorError> {
        self.accept(format!("head {:.3} rad/s", speed_radps))
    }

    fn set_lift_height(&mut self, height_ratio: f64) -> Result<(), ActuatorError> {
        self.accept(format!("lift height {:.3}", height_ratio))
    }
}
