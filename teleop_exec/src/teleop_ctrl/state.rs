//! Implementations for the TeleopCtrl structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    mpsc::{channel, Receiver}
};
use std::time::Duration;

// Internal
use super::{Collaborators, TeleopCtrlError};
use crate::{
    cmd_disp::{self, CmdDisp, RateState},
    params::TeleopParams,
    sched::{Scheduler, TimerHandle},
    seg_map::{self, SegMap, SpeedSegment},
    trans_anim::{AnimCompletion, Phase, TransAnim}
};
use teleop_if::sens::SliderAxis;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::clamp,
    module::State,
    session::Session,
    time::secs_to_duration
};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Source of unique session ids, so completions from an earlier session can
/// never be mistaken for this one's.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Control-loop object for one teleoperation session.
pub struct TeleopCtrl {
    params: TeleopParams,
    collab: Collaborators,

    active: bool,
    session_id: u64,

    seg_map: SegMap,
    cmd_disp: CmdDisp,
    trans_anim: TransAnim,

    sched: Scheduler,
    tick_timer: TimerHandle,
    sample_timer: TimerHandle,

    completion_rx: Receiver<AnimCompletion>,

    /// Latest tilt sample not yet consumed by a tick.
    pending_tilt: Option<f64>,

    /// Lift height to hold.
    lift_height: f64,

    num_ticks: u64,

    /// Completion results since the last tick.
    drained: DrainReport,

    reports: Vec<StatusReport>,
    arch_status: Archiver
}

/// Report of one control tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub tick: u64,

    /// Speed segment reported by the mapper.
    pub speed_segment: SpeedSegment,

    /// Turn direction reported by the mapper.
    pub turn: f64,

    /// Number of invalid samples discarded this tick.
    pub num_discarded: u32,

    pub num_sent: u32,
    pub num_failed: u32,
    pub num_retried: u32,

    /// Transition phase after the tick.
    pub anim_phase: Phase,

    /// Segment the posture animation currently shows.
    pub anim_segment: SpeedSegment,

    /// Set if a transition finished since the previous tick.
    pub transition_finished: Option<SpeedSegment>,

    /// Number of stale completions ignored since the previous tick.
    pub num_stale_completions: u32
}

#[derive(Clone, Copy, Debug, Default)]
struct DrainReport {
    finished: Option<SpeedSegment>,
    num_stale: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TeleopCtrl {
    /// Enter a teleoperation session.
    ///
    /// Builds all component state, starts the tick and sampler timers relative
    /// to `now` and requests the driving lift height, which is sent on the
    /// first tick.
    pub fn enter(
        params: TeleopParams, 
        collab: Collaborators, 
        now: Duration
    ) -> Result<Self, TeleopCtrlError> {
        params.validate()?;

        let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let (completion_tx, completion_rx) = channel();

        let mut sched = Scheduler::new();
        let tick_timer = sched.add_periodic(
            secs_to_duration(params.teleop_ctrl.tick_period_s), now);
        let sample_timer = sched.add_periodic(
            secs_to_duration(params.teleop_ctrl.tilt_sample_period_s), now);

        info!("Entering teleoperation session {}", session_id);

        Ok(Self {
            seg_map: SegMap::new(params.seg_map)?,
            cmd_disp: CmdDisp::new(params.cmd_disp, params.drive_synth)?,
            trans_anim: TransAnim::new(session_id, completion_tx),
            lift_height: params.cmd_disp.drive_lift_height,
            params,
            collab,
            active: true,
            session_id,
            sched,
            tick_timer,
            sample_timer,
            completion_rx,
            pending_tilt: None,
            num_ticks: 0,
            drained: DrainReport::default(),
            reports: Vec::new(),
            arch_status: Archiver::default()
        })
    }

    /// Run whatever is due at `now`.
    ///
    /// The sampler runs first, then queued animation completions are drained,
    /// then the control tick runs. Returns the tick's report if it ran.
    pub fn step(&mut self, now: Duration) -> Option<StatusReport> {
        if !self.active {
            return None;
        }

        let due = self.sched.poll(now);

        if due.contains(&self.sample_timer) {
            self.sample_tilt();
        }

        self.drain_completions();

        if due.contains(&self.tick_timer) {
            self.tick()
        }
        else {
            None
        }
    }

    /// Read the tilt sensor, keeping the sample for the next tick.
    pub fn sample_tilt(&mut self) {
        if !self.active {
            trace!("Ignoring tilt sample, session inactive");
            return;
        }

        if let Some(p) = self.collab.sensor.read_tilt_pitch() {
            self.pending_tilt = Some(p);
        }
    }

    /// Run one control tick.
    ///
    /// Mapping, synthesis and dispatch happen in that order. A change of
    /// speed segment starts a posture transition, whose effects are seen from
    /// the next tick.
    pub fn tick(&mut self) -> Option<StatusReport> {
        if !self.active {
            return None;
        }

        self.num_ticks += 1;

        let map_input = seg_map::InputData {
            drive_slider: self.collab.sliders.read_value(SliderAxis::Drive),
            head_slider: self.collab.sliders.read_value(SliderAxis::Head),
            tilt_pitch_rad: self.pending_tilt.take()
        };
        let (mapping, map_rpt) = match self.seg_map.proc(&map_input) {
            Ok(o) => o,
            Err(e) => match e {}
        };

        let disp_rpt = self.cmd_disp.dispatch(
            &cmd_disp::InputData {
                mapping,
                lift_height: self.lift_height
            },
            &mut *self.collab.actuators
        );

        if let Some(segment) = map_rpt.new_speed_segment {
            self.trans_anim.play_transition(segment, &mut *self.collab.anims);
        }

        let drained = std::mem::take(&mut self.drained);
        let report = StatusReport {
            tick: self.num_ticks,
            speed_segment: mapping.speed.segment,
            turn: mapping.turn,
            num_discarded: map_rpt.num_discarded,
            num_sent: disp_rpt.num_sent,
            num_failed: disp_rpt.num_failed,
            num_retried: disp_rpt.num_retried,
            anim_phase: self.trans_anim.phase(),
            anim_segment: self.trans_anim.current_segment(),
            transition_finished: drained.finished,
            num_stale_completions: drained.num_stale
        };

        trace!("TeleopCtrl tick: {:?}", report);
        self.reports.push(report);

        Some(report)
    }

    /// The host has seen the lift away from its demanded height, the lift
    /// demand is reissued on the next tick.
    pub fn notify_lift_drift(&mut self) {
        if self.active {
            debug!("Lift drift reported, reissuing lift demand");
            self.cmd_disp.request_lift_hold();
        }
    }

    /// Change the lift height to hold, as a ratio of full lift travel.
    ///
    /// Non-finite ratios are ignored.
    pub fn set_lift_height(&mut self, ratio: f64) {
        if !ratio.is_finite() {
            warn!("Ignoring invalid lift height {}", ratio);
            return;
        }

        self.lift_height = clamp(&ratio, &0.0, &1.0);
    }

    /// Leave the teleoperation session.
    ///
    /// Timers are cancelled and the wheels and head stopped. Completions and
    /// samples arriving afterwards are ignored.
    pub fn exit(&mut self) {
        if !self.active {
            return;
        }

        self.active = false;
        self.sched.cancel(self.sample_timer);
        self.sched.cancel(self.tick_timer);

        if let Err(e) = self.collab.actuators.set_wheels_independently(0.0, 0.0) {
            warn!("Could not stop the wheels on exit: {}", e);
        }
        if let Err(e) = self.collab.actuators.set_head_speed(0.0) {
            warn!("Could not stop the head on exit: {}", e);
        }

        self.seg_map.reset();
        self.cmd_disp.reset();
        self.trans_anim.reset();
        self.pending_tilt = None;
        self.drained = DrainReport::default();

        info!(
            "Exited teleoperation session {} after {} ticks", 
            self.session_id, self.num_ticks
        );
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn params(&self) -> &TeleopParams {
        &self.params
    }

    pub fn rate_state(&self) -> &RateState {
        self.cmd_disp.rate_state()
    }

    pub fn trans_anim(&self) -> &TransAnim {
        &self.trans_anim
    }

    /// Feed queued completions to the animator.
    ///
    /// Only completions queued before the drain started are handled, any
    /// posted while handling them wait for the next drain.
    fn drain_completions(&mut self) {
        let completions: Vec<AnimCompletion> = self.completion_rx.try_iter().collect();

        for c in completions {
            let rpt = self.trans_anim.on_complete(c, &mut *self.collab.anims);

            if rpt.stale {
                self.drained.num_stale += 1;
            }
            if rpt.finished.is_some() {
                self.drained.finished = rpt.finished;
            }
        }
    }
}

impl Archived for TeleopCtrl {
    fn arch_init(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_status = Archiver::from_path(session, "teleop_ctrl/status.csv")?;
        self.cmd_disp.arch_init(session)
    }

    fn write(&mut self) -> Result<(), ArchiveError> {
        let reports: Vec<StatusReport> = self.reports.drain(..).collect();

        if self.arch_status.is_init() {
            for r in reports {
                self.arch_status.serialise(r)?;
            }
        }

        self.cmd_disp.write()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive_synth::{self, DriveMode};
    use std::{cell::RefCell, collections::HashMap, rc::Rc};
    use teleop_if::eqpt::{
        ActuatorError, ActuatorSink, AnimCallback, AnimTrigger, AnimationPlayer
    };
    use teleop_if::sens::{SensorSource, SliderSource};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Sent {
        Arc(f64, f64),
        Wheels(f64, f64),
        Head(f64),
        Lift(f64)
    }

    /// Values and records shared between the test and the fakes.
    #[derive(Default)]
    struct World {
        sliders: HashMap<SliderAxis, f64>,
        tilt: Option<f64>,
        sent: Vec<Sent>,
        played: Vec<AnimTrigger>,
        pending: Vec<AnimCallback>
    }

    type Shared = Rc<RefCell<World>>;

    struct FakeSensor(Shared);
    struct FakeSliders(Shared);
    struct FakeSink(Shared);
    struct FakePlayer(Shared);

    impl SensorSource for FakeSensor {
        fn read_tilt_pitch(&mut self) -> Option<f64> {
            self.0.borrow().tilt
        }
    }

    impl SliderSource for FakeSliders {
        fn read_value(&mut self, axis: SliderAxis) -> Option<f64> {
            self.0.borrow().sliders.get(&axis).copied()
        }
    }

    impl ActuatorSink for FakeSink {
        fn set_wheel_arc(&mut self, speed_mmps: f64, radius_mm: f64) 
            -> Result<(), ActuatorError> 
        {
            self.0.borrow_mut().sent.push(Sent::Arc(speed_mmps, radius_mm));
            Ok(())
        }

        fn set_wheels_independently(&mut self, left_mmps: f64, right_mmps: f64) 
            -> Result<(), ActuatorError> 
        {
            self.0.borrow_mut().sent.push(Sent::Wheels(left_mmps, right_mmps));
            Ok(())
        }

        fn set_head_speed(&mut self, speed_radps: f64) -> Result<(), ActuatorError> {
            self.0.borrow_mut().sent.push(Sent::Head(speed_radps));
            Ok(())
        }

        fn set_lift_height(&mut self, height_ratio: f64) -> Result<(), ActuatorError> {
            self.0.borrow_mut().sent.push(Sent::Lift(height_ratio));
            Ok(())
        }
    }

    impl AnimationPlayer for FakePlayer {
        fn play_trigger(&mut self, trigger: AnimTrigger, on_complete: AnimCallback) {
            let mut w = self.0.borrow_mut();
            w.played.push(trigger);
            w.pending.push(on_complete);
        }
    }

    fn complete_anims(world: &Shared, success: bool) {
        let pending: Vec<AnimCallback> = world.borrow_mut().pending.drain(..).collect();
        for cb in pending {
            cb(success);
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn enter() -> (TeleopCtrl, Shared) {
        let world: Shared = Rc::new(RefCell::new(World::default()));
        world.borrow_mut().sliders.insert(SliderAxis::Drive, 0.3);
        world.borrow_mut().sliders.insert(SliderAxis::Head, 0.5);

        let collab = Collaborators {
            sensor: Box::new(FakeSensor(world.clone())),
            sliders: Box::new(FakeSliders(world.clone())),
            actuators: Box::new(FakeSink(world.clone())),
            anims: Box::new(FakePlayer(world.clone()))
        };

        let ctrl = TeleopCtrl::enter(TeleopParams::default(), collab, ms(0)).unwrap();
        (ctrl, world)
    }

    #[test]
    fn test_first_tick_holds_lift() {
        let (mut ctrl, world) = enter();

        assert!(ctrl.step(ms(50)).is_none());

        let rpt = ctrl.step(ms(100)).unwrap();
        assert_eq!(rpt.tick, 1);
        assert_eq!(rpt.speed_segment, SpeedSegment::Neutral);
        assert_eq!(world.borrow().sent, vec![Sent::Lift(0.0)]);
    }

    #[test]
    fn test_drive_and_transition() {
        let (mut ctrl, world) = enter();
        ctrl.step(ms(100));
        world.borrow_mut().sent.clear();

        // Drive forward at full ramp
        world.borrow_mut().sliders.insert(SliderAxis::Drive, 0.9);
        let rpt = ctrl.step(ms(200)).unwrap();
        let p = drive_synth::Params::default();

        assert_eq!(rpt.speed_segment, SpeedSegment::Forward);
        assert_eq!(
            world.borrow().sent, 
            vec![Sent::Arc(p.max_forward_speed_mmps, p.max_arc_radius_mm)]
        );
        assert_eq!(rpt.anim_phase, Phase::Out);

        // Neutral end completion is picked up on the next step
        ctrl.step(ms(300));
        assert_eq!(world.borrow().played, vec![AnimTrigger::DriveForwardStart]);

        complete_anims(&world, true);
        let rpt = ctrl.step(ms(400)).unwrap();
        assert_eq!(rpt.transition_finished, Some(SpeedSegment::Forward));
        assert_eq!(rpt.anim_phase, Phase::None);
        assert_eq!(rpt.anim_segment, SpeedSegment::Forward);
    }

    #[test]
    fn test_tilt_sampled_and_point_turn() {
        let (mut ctrl, world) = enter();
        world.borrow_mut().tilt = Some(0.55);

        ctrl.step(ms(100));

        let sent = world.borrow().sent.clone();
        let p = drive_synth::Params::default();
        assert!(sent.iter().any(|s| match s {
            Sent::Arc(v, r) => (v - p.point_turn_speed_mmps * 0.5).abs() < 1e-9 
                && *r == -drive_synth::POINT_TURN_RADIUS_MM,
            _ => false
        }));
        assert_eq!(ctrl.rate_state().drive.mode, DriveMode::PointTurn);
    }

    #[test]
    fn test_invalid_samples_discarded() {
        let (mut ctrl, world) = enter();
        world.borrow_mut().tilt = Some(f64::NAN);
        world.borrow_mut().sliders.insert(SliderAxis::Drive, 1.5);

        let rpt = ctrl.step(ms(100)).unwrap();
        assert_eq!(rpt.num_discarded, 2);
        assert_eq!(rpt.speed_segment, SpeedSegment::Neutral);
        assert_eq!(rpt.turn, 0.0);
    }

    #[test]
    fn test_lift_drift_and_height() {
        let (mut ctrl, world) = enter();
        ctrl.step(ms(100));
        world.borrow_mut().sent.clear();

        ctrl.notify_lift_drift();
        ctrl.step(ms(200));
        assert_eq!(world.borrow().sent, vec![Sent::Lift(0.0)]);

        world.borrow_mut().sent.clear();
        ctrl.set_lift_height(2.0);
        ctrl.set_lift_height(f64::NAN);
        ctrl.step(ms(300));
        assert_eq!(world.borrow().sent, vec![Sent::Lift(1.0)]);
    }

    #[test]
    fn test_exit_stops_and_ignores_late_events() {
        let (mut ctrl, world) = enter();
        world.borrow_mut().sliders.insert(SliderAxis::Drive, 0.5);
        ctrl.step(ms(100));
        ctrl.step(ms(200));
        assert_eq!(world.borrow().played.len(), 1);

        world.borrow_mut().sent.clear();
        ctrl.exit();
        assert!(!ctrl.is_active());
        assert_eq!(world.borrow().sent, vec![Sent::Wheels(0.0, 0.0), Sent::Head(0.0)]);

        // The in-flight animation completes after exit
        complete_anims(&world, true);
        world.borrow_mut().tilt = Some(0.8);
        ctrl.sample_tilt();

        assert!(ctrl.step(ms(300)).is_none());
        assert!(ctrl.tick().is_none());
        assert!(ctrl.sched.poll(ms(10_000)).is_empty());
        assert!(ctrl.trans_anim().is_idle());
        assert_eq!(ctrl.trans_anim().current_segment(), SpeedSegment::Neutral);
        assert_eq!(world.borrow().sent.len(), 2);

        // Exit is idempotent
        ctrl.exit();
        assert_eq!(world.borrow().sent.len(), 2);
    }

    #[test]
    fn test_sessions_have_unique_ids() {
        let (a, _) = enter();
        let (b, _) = enter();
        assert_ne!(a.session_id(), b.session_id());
    }

    #[test]
    fn test_enter_rejects_invalid_params() {
        let world: Shared = Rc::new(RefCell::new(World::default()));
        let collab = Collaborators {
            sensor: Box::new(FakeSensor(world.clone())),
            sliders: Box::new(FakeSliders(world.clone())),
            actuators: Box::new(FakeSink(world.clone())),
            anims: Box::new(FakePlayer(world))
        };
        let mut params = TeleopParams::default();
        params.seg_map.forward_threshold = 0.1;

        assert!(TeleopCtrl::enter(params, collab, ms(0)).is_err());
    }
}
