//! Implementations for the SegMap state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::*;
use crate::params::ParamsError;
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Segment mapping module state.
///
/// Holds the last *reported* mapping of each input. A new sample is only
/// reported, and only replaces the held mapping, if its segment differs or its
/// magnitude has moved by more than `Params::change_epsilon`. Small drifts
/// therefore accumulate against the last reported value rather than creeping
/// along unnoticed.
#[derive(Default)]
pub struct SegMap {
    pub(crate) params: Params,

    speed: Option<Mapping<SpeedSegment>>,
    head: Option<Mapping<HeadSegment>>,
    turn: Option<f64>
}

/// Input data to Segment Mapping.
///
/// Each field is `None` if there is no new sample on this cycle.
#[derive(Default, Clone, Copy, Debug)]
pub struct InputData {
    pub drive_slider: Option<f64>,
    pub head_slider: Option<f64>,
    pub tilt_pitch_rad: Option<f64>
}

/// Latest mapped values.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OutputData {
    pub speed: Mapping<SpeedSegment>,
    pub head: Mapping<HeadSegment>,

    /// Turn direction, between -1 (left) and 1 (right).
    pub turn: f64
}

/// Status report for SegMap processing.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    pub speed_changed: bool,

    /// The new speed segment if the segment itself changed this cycle.
    pub new_speed_segment: Option<SpeedSegment>,

    pub head_changed: bool,
    pub turn_changed: bool,

    /// Number of samples discarded as invalid this cycle.
    pub num_discarded: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SegMap {
    type InitData = Params;
    type InitError = ParamsError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the SegMap module with the given parameters.
    fn init(&mut self, init_data: Self::InitData) 
        -> Result<(), Self::InitError> 
    {
        init_data.validate()?;

        *self = Self::default();
        self.params = init_data;

        Ok(())
    }

    /// Map any new samples and report which outputs changed.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        let mut report = StatusReport::default();

        if let Some(v) = input_data.drive_slider {
            let prev_segment = self.speed_segment();

            match self.update_speed(v) {
                Some(m) => {
                    report.speed_changed = true;
                    if m.segment != prev_segment {
                        report.new_speed_segment = Some(m.segment);
                    }
                },
                None if !is_valid_slider(v) => report.num_discarded += 1,
                None => ()
            }
        }

        if let Some(v) = input_data.head_slider {
            match self.update_head(v) {
                Some(_) => report.head_changed = true,
                None if !is_valid_slider(v) => report.num_discarded += 1,
                None => ()
            }
        }

        if let Some(p) = input_data.tilt_pitch_rad {
            match self.update_tilt(p) {
                Some(_) => report.turn_changed = true,
                None if !p.is_finite() => report.num_discarded += 1,
                None => ()
            }
        }

        let output = self.output();

        trace!("SegMap output: {:?}", output);

        Ok((output, report))
    }
}

impl SegMap {
    /// Create a new mapper with the given parameters.
    pub fn new(params: Params) -> Result<Self, ParamsError> {
        let mut seg_map = Self::default();
        seg_map.init(params)?;
        Ok(seg_map)
    }

    /// Map a new drive slider sample.
    ///
    /// Returns the new mapping if it should be reported as a change, or
    /// `None` if the change is within the epsilon or the sample was invalid.
    pub fn update_speed(&mut self, value: f64) -> Option<Mapping<SpeedSegment>> {
        if !is_valid_slider(value) {
            warn!("Discarding invalid drive slider sample: {}", value);
            return None;
        }

        let new = map_speed_slider(value, &self.params.speed_thresholds());

        if has_changed(&self.speed, &new, self.params.change_epsilon) {
            self.speed = Some(new);
            Some(new)
        }
        else {
            None
        }
    }

    /// Map a new head slider sample.
    ///
    /// Same reporting rules as [`SegMap::update_speed`].
    pub fn update_head(&mut self, value: f64) -> Option<Mapping<HeadSegment>> {
        if !is_valid_slider(value) {
            warn!("Discarding invalid head slider sample: {}", value);
            return None;
        }

        let new = map_head_slider(value, &self.params.head_thresholds());

        if has_changed(&self.head, &new, self.params.change_epsilon) {
            self.head = Some(new);
            Some(new)
        }
        else {
            None
        }
    }

    /// Map a new tilt sample into a turn direction.
    ///
    /// Non-finite samples are discarded, finite ones outside [-1, 1] radians
    /// are clamped.
    pub fn update_tilt(&mut self, pitch_rad: f64) -> Option<f64> {
        if !pitch_rad.is_finite() {
            warn!("Discarding invalid tilt sample: {}", pitch_rad);
            return None;
        }

        let new = map_tilt(pitch_rad, self.params.tilt_neutral_deadzone_rad);

        let changed = match self.turn {
            Some(t) => (new - t).abs() > self.params.change_epsilon,
            None => true
        };

        if changed {
            self.turn = Some(new);
            Some(new)
        }
        else {
            None
        }
    }

    /// Current speed segment, Neutral before the first sample.
    pub fn speed_segment(&self) -> SpeedSegment {
        self.speed.map(|m| m.segment).unwrap_or_default()
    }

    /// The last reported value of every output.
    pub fn output(&self) -> OutputData {
        OutputData {
            speed: self.speed.unwrap_or_default(),
            head: self.head.unwrap_or_default(),
            turn: self.turn.unwrap_or(0.0)
        }
    }

    /// Forget all samples, returning every output to neutral.
    pub fn reset(&mut self) {
        self.speed = None;
        self.head = None;
        self.turn = None;
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn is_valid_slider(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

fn has_changed<S: PartialEq>(
    last: &Option<Mapping<S>>, 
    new: &Mapping<S>, 
    epsilon: f64
) -> bool {
    match last {
        Some(l) => 
            l.segment != new.segment 
            || (l.magnitude - new.magnitude).abs() > epsilon,
        None => true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn seg_map() -> SegMap {
        SegMap::new(Params::default()).unwrap()
    }

    #[test]
    fn test_small_changes_suppressed() {
        let mut sm = seg_map();

        // First sample is always a change
        assert!(sm.update_speed(0.6).is_some());

        // Noise below the epsilon is not
        assert!(sm.update_speed(0.602).is_none());
        assert!(sm.update_speed(0.598).is_none());

        // But drift accumulates against the last reported value
        let m = sm.update_speed(0.61).unwrap();
        assert_eq!(m.segment, SpeedSegment::Forward);
    }

    #[test]
    fn test_segment_change_always_reported() {
        let mut sm = seg_map();

        assert!(sm.update_speed(0.9).is_some());

        // Tiny move across the turbo threshold still changes the segment
        let m = sm.update_speed(0.9005).unwrap();
        assert_eq!(m.segment, SpeedSegment::Turbo);
    }

    #[test]
    fn test_invalid_samples_retain_previous() {
        let mut sm = seg_map();

        sm.update_speed(0.0);
        sm.update_tilt(0.55);

        assert!(sm.update_speed(f64::NAN).is_none());
        assert!(sm.update_speed(1.5).is_none());
        assert!(sm.update_tilt(f64::NAN).is_none());

        let out = sm.output();
        assert_eq!(out.speed.segment, SpeedSegment::Reverse);
        assert_eq!(out.speed.magnitude, 1.0);
        assert!((out.turn - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_proc_report() {
        let mut sm = seg_map();

        let (out, rpt) = sm.proc(&InputData {
            drive_slider: Some(0.5),
            head_slider: Some(f64::NAN),
            tilt_pitch_rad: Some(-0.55)
        }).unwrap();

        assert_eq!(out.speed.segment, SpeedSegment::Forward);
        assert_eq!(rpt.new_speed_segment, Some(SpeedSegment::Forward));
        assert!(rpt.speed_changed);
        assert!(!rpt.head_changed);
        assert!(rpt.turn_changed);
        assert_eq!(rpt.num_discarded, 1);
        assert!((out.turn + 0.5).abs() < 1e-9);

        // Same segment, bigger magnitude: changed but no new segment
        let (_, rpt) = sm.proc(&InputData {
            drive_slider: Some(0.7),
            ..Default::default()
        }).unwrap();
        assert!(rpt.speed_changed);
        assert_eq!(rpt.new_speed_segment, None);
    }

    #[test]
    fn test_first_neutral_sample_is_not_a_new_segment() {
        let mut sm = seg_map();

        let (_, rpt) = sm.proc(&InputData {
            drive_slider: Some(0.3),
            ..Default::default()
        }).unwrap();

        assert!(rpt.speed_changed);
        assert_eq!(rpt.new_speed_segment, None);
    }

    #[test]
    fn test_reset() {
        let mut sm = seg_map();
        sm.update_speed(1.0);
        sm.update_head(1.0);
        sm.update_tilt(1.0);

        sm.reset();

        assert_eq!(sm.output(), OutputData::default());
    }
}
