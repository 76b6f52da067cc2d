//! Implementations for the CmdDisp state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, trace, warn};
use serde::Serialize;
use std::collections::HashMap;

// Internal
use super::{ActCmd, Params, RateState};
use crate::drive_synth::{self, DriveMode, DriveState};
use crate::params::ParamsError;
use crate::seg_map;
use teleop_if::eqpt::{ActChannel, ActuatorError, ActuatorSink};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::{clamp, differs_by_more_than},
    module::State,
    session::{self, Session}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command dispatch module state
#[derive(Default)]
pub struct CmdDisp {
    pub(crate) params: Params,
    pub(crate) synth_params: drive_synth::Params,

    pub(crate) rate: RateState,

    /// Demands which failed to send, to be retried on the next tick unless a
    /// fresh demand on the same channel supersedes them.
    pending_retry: HashMap<ActChannel, ActCmd>,

    consec_failures: HashMap<ActChannel, u32>,

    /// Set when the lift has drifted and must be recommanded.
    lift_hold_requested: bool,

    sent_records: Vec<SentRecord>,
    arch_sent: Archiver
}

/// Input data to Command Dispatch.
#[derive(Default, Clone, Copy, Debug)]
pub struct InputData {
    /// Latest mapped operator inputs.
    pub mapping: seg_map::OutputData,

    /// Lift height to hold, as a ratio of full lift travel.
    pub lift_height: f64
}

/// Demands to send this tick, at most one per channel.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct OutputData {
    pub cmds: Vec<ActCmd>
}

/// Status report for CmdDisp processing.
#[derive(Default, Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StatusReport {
    /// Number of demands accepted by the actuator sink
    pub num_sent: u32,

    /// Number of demands the actuator sink failed to accept
    pub num_failed: u32,

    /// Number of previously failed demands resent verbatim
    pub num_retried: u32,

    /// Number of failed demands dropped in favour of a fresh demand
    pub num_superseded: u32,

    /// Wheel command sent this tick, if any
    pub wheels_sent: Option<drive_synth::DriveCommand>
}

/// What the operator currently asks of each channel.
#[derive(Clone, Copy, Debug)]
struct Targets {
    speed_mmps: f64,
    turn: f64,
    head_radps: f64,
    lift_height: f64
}

/// Archive record of a sent demand.
#[derive(Clone, Copy, Debug, Serialize)]
struct SentRecord {
    time_s: f64,
    channel: ActChannel,
    drive_mode: Option<DriveMode>,
    speed: Option<f64>,
    radius_mm: Option<f64>,
    lift_height: Option<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for CmdDisp {
    type InitData = (Params, drive_synth::Params);
    type InitError = ParamsError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the CmdDisp module with its own and the synthesis
    /// parameters.
    fn init(&mut self, init_data: Self::InitData) 
        -> Result<(), Self::InitError> 
    {
        init_data.0.validate()?;
        init_data.1.validate()?;

        self.params = init_data.0;
        self.synth_params = init_data.1;
        self.reset();

        Ok(())
    }

    /// Determine the demands to send this tick.
    ///
    /// The returned demands shall be passed to [`CmdDisp::send`], otherwise
    /// any pending retries are lost.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        let mut report = StatusReport::default();
        let mut cmds = Vec::with_capacity(3);

        let targets = Targets {
            speed_mmps: drive_synth::target_speed_mmps(
                &input_data.mapping.speed, &self.synth_params),
            turn: input_data.mapping.turn,
            head_radps: drive_synth::target_head_radps(
                &input_data.mapping.head, &self.synth_params),
            lift_height: clamp(&input_data.lift_height, &0.0, &1.0)
        };

        // ---- WHEELS ----

        let target_speed_mmps = targets.speed_mmps;
        let target_turn = targets.turn;

        let fresh = drive_synth::synthesize(
            target_speed_mmps, 
            target_turn, 
            &self.rate.drive, 
            &self.synth_params
        ).map(|cmd| ActCmd::Wheels {
            cmd,
            next: DriveState::after(&cmd, target_speed_mmps, target_turn)
        });
        self.select(ActChannel::Wheels, fresh, &targets, &mut cmds, &mut report);

        // ---- HEAD ----

        let fresh = drive_synth::synthesize_head(
            &input_data.mapping.head, 
            self.rate.head_speed_radps, 
            &self.synth_params
        ).map(|speed_radps| ActCmd::Head { speed_radps });
        self.select(ActChannel::Head, fresh, &targets, &mut cmds, &mut report);

        // ---- LIFT ----

        let target_height = targets.lift_height;
        let lift_changed = match self.rate.lift_height {
            Some(h) => differs_by_more_than(
                h, target_height, self.params.lift_height_change_threshold),
            None => true
        };
        let fresh = if lift_changed || self.lift_hold_requested {
            Some(ActCmd::Lift { height: target_height })
        }
        else {
            None
        };
        self.lift_hold_requested = false;
        self.select(ActChannel::Lift, fresh, &targets, &mut cmds, &mut report);

        trace!("CmdDisp demands: {:?}", cmds);

        Ok((OutputData { cmds }, report))
    }
}

impl Archived for CmdDisp {
    fn arch_init(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_sent = Archiver::from_path(session, "cmd_disp/sent.csv")?;
        Ok(())
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        let records: Vec<SentRecord> = self.sent_records.drain(..).collect();

        if !self.arch_sent.is_init() {
            return Ok(());
        }

        for r in records {
            self.arch_sent.serialise(r)?;
        }

        Ok(())
    }
}

impl CmdDisp {
    /// Create a new dispatcher.
    pub fn new(params: Params, synth_params: drive_synth::Params) 
        -> Result<Self, ParamsError> 
    {
        let mut cmd_disp = Self::default();
        cmd_disp.init((params, synth_params))?;
        Ok(cmd_disp)
    }

    /// Compute and send this tick's demands.
    pub fn dispatch(
        &mut self, 
        input_data: &InputData, 
        sink: &mut dyn ActuatorSink
    ) -> StatusReport {
        let (output, mut report) = match self.proc(input_data) {
            Ok(o) => o,
            Err(e) => match e {}
        };

        self.send(&output, sink, &mut report);

        report
    }

    /// Send demands to the actuator sink.
    ///
    /// Accepted demands update the rate state. Rejected ones are logged and
    /// kept for a verbatim retry on the next tick, the sink is never waited
    /// on.
    pub fn send(
        &mut self, 
        output: &OutputData, 
        sink: &mut dyn ActuatorSink,
        report: &mut StatusReport
    ) {
        for cmd in output.cmds.iter() {
            let channel = cmd.channel();

            match send_cmd(cmd, sink) {
                Ok(()) => {
                    debug!("Sent {:?}", cmd);

                    self.record_sent(cmd);
                    self.consec_failures.remove(&channel);
                    report.num_sent += 1;

                    if let ActCmd::Wheels { cmd: c, .. } = cmd {
                        report.wheels_sent = Some(*c);
                    }
                },
                Err(e) => {
                    let count = self.consec_failures.entry(channel).or_insert(0);
                    *count += 1;

                    if *count > self.params.max_consec_send_failures {
                        error!(
                            "{:?} demand failed {} consecutive times: {}", 
                            channel, count, e
                        );
                    }
                    else {
                        warn!(
                            "Could not send {:?} demand, will retry next tick: {}", 
                            channel, e
                        );
                    }

                    self.pending_retry.insert(channel, *cmd);
                    report.num_failed += 1;
                }
            }
        }
    }

    /// Request the lift demand be resent on the next tick, used when the lift
    /// has been observed away from its demanded height.
    pub fn request_lift_hold(&mut self) {
        self.lift_hold_requested = true;
    }

    /// The last sent value of each channel.
    pub fn rate_state(&self) -> &RateState {
        &self.rate
    }

    /// Return to the state at the start of a session.
    pub fn reset(&mut self) {
        self.rate = RateState::default();
        self.pending_retry.clear();
        self.consec_failures.clear();
        self.lift_hold_requested = false;
        self.sent_records.clear();
    }

    /// Choose between a fresh demand and a pending retry for a channel.
    ///
    /// A retry is only replayed if it still matches the operator's targets,
    /// otherwise it is dropped as superseded.
    fn select(
        &mut self,
        channel: ActChannel,
        fresh: Option<ActCmd>,
        targets: &Targets,
        cmds: &mut Vec<ActCmd>,
        report: &mut StatusReport
    ) {
        let retry = self.pending_retry.remove(&channel);

        match (fresh, retry) {
            (Some(f), r) => {
                if r.is_some() {
                    report.num_superseded += 1;
                }
                cmds.push(f);
            },
            (None, Some(r)) if self.is_wanted(&r, targets) => {
                report.num_retried += 1;
                cmds.push(r);
            },
            (None, Some(r)) => {
                debug!("Dropping stale {:?} retry, targets have moved on", r);
                report.num_superseded += 1;
            },
            (None, None) => ()
        }
    }

    /// Whether a previously synthesised demand still matches the targets.
    fn is_wanted(&self, cmd: &ActCmd, targets: &Targets) -> bool {
        match cmd {
            ActCmd::Wheels { next, .. } => next.matches_targets(
                targets.speed_mmps, targets.turn, &self.synth_params),
            ActCmd::Head { speed_radps } => !differs_by_more_than(
                *speed_radps, 
                targets.head_radps, 
                self.synth_params.head_speed_change_threshold_radps
            ),
            ActCmd::Lift { height } => !differs_by_more_than(
                *height, 
                targets.lift_height, 
                self.params.lift_height_change_threshold
            )
        }
    }

    /// Update the rate state for a sent demand.
    fn record_sent(&mut self, cmd: &ActCmd) {
        let mut record = SentRecord {
            time_s: session::get_elapsed_seconds(),
            channel: cmd.channel(),
            drive_mode: None,
            speed: None,
            radius_mm: None,
            lift_height: None
        };

        match *cmd {
            ActCmd::Wheels { cmd, next } => {
                self.rate.drive = next;
                record.drive_mode = Some(cmd.mode);
                record.speed = Some(cmd.speed_mmps);
                record.radius_mm = Some(cmd.radius_mm);
            },
            ActCmd::Head { speed_radps } => {
                self.rate.head_speed_radps = speed_radps;
                record.speed = Some(speed_radps);
            },
            ActCmd::Lift { height } => {
                self.rate.lift_height = Some(height);
                record.lift_height = Some(height);
            }
        }

        self.sent_records.push(record);
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Issue a single demand to the sink.
///
/// Stops are sent as independent zero wheel speeds, all other wheel commands
/// as arcs.
fn send_cmd(cmd: &ActCmd, sink: &mut dyn ActuatorSink) -> Result<(), ActuatorError> {
    match cmd {
        ActCmd::Wheels { cmd, .. } => match cmd.mode {
            DriveMode::Stop => sink.set_wheels_independently(0.0, 0.0),
            DriveMode::PointTurn | DriveMode::Arc => 
                sink.set_wheel_arc(cmd.speed_mmps, cmd.radius_mm)
        },
        ActCmd::Head { speed_radps } => sink.set_head_speed(*speed_radps),
        ActCmd::Lift { height } => sink.set_lift_height(*height)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::seg_map::{HeadSegment, Mapping, SpeedSegment};

    /// Demand as seen by the sink.
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Sent {
        Arc(f64, f64),
        Wheels(f64, f64),
        Head(f64),
        Lift(f64)
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Vec<Sent>,
        fail: bool
    }

    impl RecordingSink {
        fn push(&mut self, s: Sent) -> Result<(), ActuatorError> {
            if self.fail {
                return Err(ActuatorError::NotConnected);
            }
            self.sent.push(s);
            Ok(())
        }
    }

    impl ActuatorSink for RecordingSink {
        fn set_wheel_arc(&mut self, speed_mmps: f64, radius_mm: f64) 
            -> Result<(), ActuatorError> 
        {
            self.push(Sent::Arc(speed_mmps, radius_mm))
        }

        fn set_wheels_independently(&mut self, left_mmps: f64, right_mmps: f64) 
            -> Result<(), ActuatorError> 
        {
            self.push(Sent::Wheels(left_mmps, right_mmps))
        }

        fn set_head_speed(&mut self, speed_radps: f64) -> Result<(), ActuatorError> {
            self.push(Sent::Head(speed_radps))
        }

        fn set_lift_height(&mut self, height_ratio: f64) -> Result<(), ActuatorError> {
            self.push(Sent::Lift(height_ratio))
        }
    }

    fn cmd_disp() -> CmdDisp {
        CmdDisp::new(Params::default(), drive_synth::Params::default()).unwrap()
    }

    fn input(segment: SpeedSegment, magnitude: f64, turn: f64) -> InputData {
        InputData {
            mapping: seg_map::OutputData {
                speed: Mapping { segment, magnitude },
                head: Mapping::default(),
                turn
            },
            lift_height: 0.0
        }
    }

    #[test]
    fn test_first_tick_sends_lift_only() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();

        let rpt = cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);

        assert_eq!(sink.sent, vec![Sent::Lift(0.0)]);
        assert_eq!(rpt.num_sent, 1);
        assert_eq!(cd.rate_state().lift_height, Some(0.0));
    }

    #[test]
    fn test_unchanged_channels_not_resent() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();
        let i = input(SpeedSegment::Forward, 1.0, 0.0);

        cd.dispatch(&i, &mut sink);
        assert_eq!(sink.sent.len(), 2);

        sink.sent.clear();
        let rpt = cd.dispatch(&i, &mut sink);
        assert!(sink.sent.is_empty());
        assert_eq!(rpt.num_sent, 0);
    }

    #[test]
    fn test_drive_then_stop() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();
        let p = drive_synth::Params::default();

        cd.dispatch(&input(SpeedSegment::Forward, 1.0, 0.0), &mut sink);
        assert!(sink.sent.contains(&Sent::Arc(p.max_forward_speed_mmps, p.max_arc_radius_mm)));
        assert_eq!(cd.rate_state().drive.mode, DriveMode::Arc);

        sink.sent.clear();
        let rpt = cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);
        assert_eq!(sink.sent, vec![Sent::Wheels(0.0, 0.0)]);
        assert_eq!(rpt.wheels_sent, Some(drive_synth::DriveCommand::stop()));
        assert_eq!(cd.rate_state().drive, DriveState::default());
    }

    #[test]
    fn test_failed_send_retried_verbatim() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();

        // Establish the lift
        cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);

        sink.fail = true;
        let rpt = cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.6), &mut sink);
        assert_eq!(rpt.num_failed, 1);
        assert_eq!(cd.rate_state().drive, DriveState::default());

        // Same command is sent once the sink recovers
        sink.fail = false;
        cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.6), &mut sink);
        let p = drive_synth::Params::default();
        assert_eq!(
            sink.sent.last(), 
            Some(&Sent::Arc(p.point_turn_speed_mmps * 0.6, -drive_synth::POINT_TURN_RADIUS_MM))
        );
        assert_eq!(cd.rate_state().drive.mode, DriveMode::PointTurn);
    }

    #[test]
    fn test_retry_without_fresh_demand() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();

        cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);

        sink.fail = true;
        cd.request_lift_hold();
        let rpt = cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);
        assert_eq!(rpt.num_failed, 1);

        // Nothing changed, but the failed lift hold is retried
        sink.fail = false;
        sink.sent.clear();
        let rpt = cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);
        assert_eq!(rpt.num_retried, 1);
        assert_eq!(sink.sent, vec![Sent::Lift(0.0)]);
    }

    #[test]
    fn test_fresh_demand_supersedes_retry() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();

        cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);

        sink.fail = true;
        cd.dispatch(&input(SpeedSegment::Forward, 1.0, 0.0), &mut sink);

        sink.fail = false;
        sink.sent.clear();
        let rpt = cd.dispatch(&input(SpeedSegment::Turbo, 1.0, 0.0), &mut sink);
        let p = drive_synth::Params::default();

        assert_eq!(rpt.num_superseded, 1);
        assert_eq!(sink.sent, vec![Sent::Arc(p.turbo_speed_mmps, p.max_arc_radius_mm)]);
    }

    #[test]
    fn test_stale_stop_not_retried() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();
        let forward = input(SpeedSegment::Forward, 1.0, 0.0);

        cd.dispatch(&forward, &mut sink);
        let drive = cd.rate_state().drive;
        assert_eq!(drive.mode, DriveMode::Arc);

        // Stop fails
        sink.fail = true;
        let rpt = cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);
        assert_eq!(rpt.num_failed, 1);

        // Operator is back at full forward before the sink recovers, the
        // failed stop must not be replayed
        sink.fail = false;
        sink.sent.clear();
        let rpt = cd.dispatch(&forward, &mut sink);

        assert!(sink.sent.is_empty());
        assert_eq!(rpt.num_retried, 0);
        assert_eq!(rpt.num_superseded, 1);
        assert_eq!(cd.rate_state().drive, drive);

        // The arc is still in effect, stopping later works as usual
        cd.dispatch(&input(SpeedSegment::Neutral, 0.0, 0.0), &mut sink);
        assert_eq!(sink.sent, vec![Sent::Wheels(0.0, 0.0)]);
    }

    #[test]
    fn test_stale_head_stop_not_retried() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();
        let p = drive_synth::Params::default();
        let mut i = input(SpeedSegment::Neutral, 0.0, 0.0);

        cd.dispatch(&i, &mut sink);

        i.mapping.head = Mapping { segment: HeadSegment::Forward, magnitude: 1.0 };
        cd.dispatch(&i, &mut sink);
        assert_eq!(cd.rate_state().head_speed_radps, p.max_head_speed_radps);

        // Head stop fails
        sink.fail = true;
        let mut stopped = i;
        stopped.mapping.head = Mapping::default();
        let rpt = cd.dispatch(&stopped, &mut sink);
        assert_eq!(rpt.num_failed, 1);

        // Slider returns to the speed last sent
        sink.fail = false;
        sink.sent.clear();
        let rpt = cd.dispatch(&i, &mut sink);

        assert!(sink.sent.is_empty());
        assert_eq!(rpt.num_retried, 0);
        assert_eq!(rpt.num_superseded, 1);
        assert_eq!(cd.rate_state().head_speed_radps, p.max_head_speed_radps);
    }

    #[test]
    fn test_lift_hold_and_threshold() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();
        let mut i = input(SpeedSegment::Neutral, 0.0, 0.0);

        cd.dispatch(&i, &mut sink);
        sink.sent.clear();

        // Within threshold
        i.lift_height = 0.01;
        cd.dispatch(&i, &mut sink);
        assert!(sink.sent.is_empty());

        // Drift reported externally, resend even though unchanged
        cd.request_lift_hold();
        cd.dispatch(&i, &mut sink);
        assert_eq!(sink.sent, vec![Sent::Lift(0.01)]);

        // Hold request is one-shot
        sink.sent.clear();
        cd.dispatch(&i, &mut sink);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_head_channel() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();
        let p = drive_synth::Params::default();
        let mut i = input(SpeedSegment::Neutral, 0.0, 0.0);

        cd.dispatch(&i, &mut sink);
        sink.sent.clear();

        i.mapping.head = Mapping { segment: HeadSegment::Forward, magnitude: 1.0 };
        cd.dispatch(&i, &mut sink);
        assert_eq!(sink.sent, vec![Sent::Head(p.max_head_speed_radps)]);

        sink.sent.clear();
        i.mapping.head = Mapping::default();
        cd.dispatch(&i, &mut sink);
        assert_eq!(sink.sent, vec![Sent::Head(0.0)]);
    }

    #[test]
    fn test_archive_records_without_session() {
        let mut cd = cmd_disp();
        let mut sink = RecordingSink::default();

        cd.dispatch(&input(SpeedSegment::Forward, 1.0, 0.0), &mut sink);

        // No archive initialised, records are dropped without error
        assert!(cd.write().is_ok());
    }
}
