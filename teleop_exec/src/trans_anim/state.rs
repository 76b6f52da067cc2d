//! Implementations for the TransAnim state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;
use std::sync::mpsc::Sender;

// Internal
use super::*;
use teleop_if::eqpt::AnimationPlayer;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Transition animation state machine.
///
/// At most one animation request is in flight at any time. Only completions
/// carrying this machine's session id and the in-flight request id are acted
/// upon, any other is stale and ignored.
pub struct TransAnim {
    phase: Phase,
    current: SpeedSegment,
    target: SpeedSegment,

    session_id: u64,
    next_request_id: u64,
    in_flight: Option<u64>,

    completion_tx: Sender<AnimCompletion>
}

/// Result of handling an animation completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// Set to the segment reached if the transition finished.
    pub finished: Option<SpeedSegment>,

    /// The completion was stale and ignored.
    pub stale: bool,

    /// The animation player reported a failure.
    pub anim_failed: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TransAnim {
    /// Create a new state machine for a session, resting in Neutral.
    ///
    /// Completions are posted to `completion_tx`.
    pub fn new(session_id: u64, completion_tx: Sender<AnimCompletion>) -> Self {
        Self {
            phase: Phase::None,
            current: SpeedSegment::Neutral,
            target: SpeedSegment::Neutral,
            session_id,
            next_request_id: 0,
            in_flight: None,
            completion_tx
        }
    }

    /// Request a transition to a new segment.
    ///
    /// If no transition is in progress the out animation for the current
    /// segment is started. Otherwise only the target is updated and will be
    /// chased once the in-flight animation completes. Requesting the segment
    /// already targeted does nothing.
    pub fn play_transition(
        &mut self, 
        segment: SpeedSegment, 
        player: &mut dyn AnimationPlayer
    ) {
        if segment == self.target {
            return;
        }

        debug!(
            "Transition target {:?} -> {:?} (phase {:?})", 
            self.target, segment, self.phase
        );
        self.target = segment;

        if self.phase == Phase::None {
            self.begin_out(player);
        }
    }

    /// Handle a completion drained from the completion channel.
    ///
    /// Animation failures advance the machine exactly as successes do.
    pub fn on_complete(
        &mut self, 
        completion: AnimCompletion, 
        player: &mut dyn AnimationPlayer
    ) -> StatusReport {
        let mut report = StatusReport::default();

        if completion.session_id != self.session_id
            || Some(completion.request_id) != self.in_flight
        {
            warn!("Ignoring stale animation completion {:?}", completion);
            report.stale = true;
            return report;
        }

        self.in_flight = None;

        if !completion.success {
            warn!(
                "Transition animation failed in phase {:?}, continuing", 
                self.phase
            );
            report.anim_failed = true;
        }

        match self.phase {
            Phase::Out => {
                self.current = self.target;
                self.phase = Phase::In;
                debug!("Transition in to {:?}", self.current);
                self.request(start_trigger(self.current), player);
            },
            Phase::In => {
                if self.current == self.target {
                    self.phase = Phase::None;
                    debug!("Transition to {:?} finished", self.current);
                    report.finished = Some(self.current);
                }
                else {
                    // Target moved while animating in, chase it
                    self.begin_out(player);
                }
            },
            Phase::None => {
                warn!("Animation completion with no transition in progress");
                report.stale = true;
            }
        }

        report
    }

    /// Return to rest in Neutral.
    ///
    /// Any completion for a request made before the reset becomes stale.
    pub fn reset(&mut self) {
        self.phase = Phase::None;
        self.current = SpeedSegment::Neutral;
        self.target = SpeedSegment::Neutral;
        self.in_flight = None;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_segment(&self) -> SpeedSegment {
        self.current
    }

    pub fn target_segment(&self) -> SpeedSegment {
        self.target
    }

    /// `true` if there is no transition in progress.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::None
    }

    fn begin_out(&mut self, player: &mut dyn AnimationPlayer) {
        self.phase = Phase::Out;
        debug!("Transition out of {:?}", self.current);
        self.request(end_trigger(self.current), player);
    }

    /// Start an animation, or post an immediate completion if the segment has
    /// no animation for this phase.
    fn request(&mut self, trigger: Option<AnimTrigger>, player: &mut dyn AnimationPlayer) {
        let completion = AnimCompletion {
            session_id: self.session_id,
            request_id: self.next_request_id,
            success: true
        };
        self.next_request_id += 1;
        self.in_flight = Some(completion.request_id);

        match trigger {
            Some(t) => {
                trace!("Playing {:?} (request {})", t, completion.request_id);

                let tx = self.completion_tx.clone();
                player.play_trigger(t, Box::new(move |success| {
                    // A closed channel means the session has ended
                    tx.send(AnimCompletion { success, ..completion }).ok();
                }));
            },
            None => {
                if self.completion_tx.send(completion).is_err() {
                    warn!("Completion channel closed, transition will not advance");
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::{channel, Receiver};
    use teleop_if::eqpt::AnimCallback;

    /// Player which holds callbacks until the test completes them.
    #[derive(Default)]
    struct ManualPlayer {
        played: Vec<AnimTrigger>,
        pending: Vec<AnimCallback>
    }

    impl AnimationPlayer for ManualPlayer {
        fn play_trigger(&mut self, trigger: AnimTrigger, on_complete: AnimCallback) {
            self.played.push(trigger);
            self.pending.push(on_complete);
        }
    }

    impl ManualPlayer {
        fn complete_all(&mut self, success: bool) {
            for cb in self.pending.drain(..) {
                cb(success);
            }
        }
    }

    fn setup() -> (TransAnim, Receiver<AnimCompletion>, ManualPlayer) {
        let (tx, rx) = channel();
        (TransAnim::new(1, tx), rx, ManualPlayer::default())
    }

    /// Drain the channel once, as at a tick boundary.
    fn drain(
        ta: &mut TransAnim, 
        rx: &Receiver<AnimCompletion>, 
        player: &mut ManualPlayer
    ) -> Vec<StatusReport> {
        let msgs: Vec<_> = rx.try_iter().collect();
        msgs.into_iter().map(|m| ta.on_complete(m, player)).collect()
    }

    /// Complete animations and drain until the machine rests.
    fn settle(
        ta: &mut TransAnim, 
        rx: &Receiver<AnimCompletion>, 
        player: &mut ManualPlayer
    ) {
        for _ in 0..20 {
            player.complete_all(true);
            drain(ta, rx, player);
            if ta.is_idle() {
                return;
            }
        }
        panic!("Transition did not settle");
    }

    #[test]
    fn test_simple_transition() {
        let (mut ta, rx, mut player) = setup();

        ta.play_transition(SpeedSegment::Forward, &mut player);
        assert_eq!(ta.phase(), Phase::Out);

        // Neutral has no end animation, completion is queued not immediate
        assert!(player.played.is_empty());
        assert_eq!(ta.current_segment(), SpeedSegment::Neutral);

        drain(&mut ta, &rx, &mut player);
        assert_eq!(ta.phase(), Phase::In);
        assert_eq!(player.played, vec![AnimTrigger::DriveForwardStart]);

        player.complete_all(true);
        let rpts = drain(&mut ta, &rx, &mut player);
        assert_eq!(rpts[0].finished, Some(SpeedSegment::Forward));
        assert!(ta.is_idle());
    }

    #[test]
    fn test_chase_from_neutral() {
        let (mut ta, rx, mut player) = setup();

        ta.play_transition(SpeedSegment::Forward, &mut player);
        ta.play_transition(SpeedSegment::Turbo, &mut player);

        settle(&mut ta, &rx, &mut player);

        assert_eq!(player.played, vec![AnimTrigger::DriveTurboStart]);
        assert_eq!(ta.current_segment(), SpeedSegment::Turbo);
    }

    #[test]
    fn test_chase_during_out() {
        let (mut ta, rx, mut player) = setup();
        ta.play_transition(SpeedSegment::Reverse, &mut player);
        settle(&mut ta, &rx, &mut player);
        player.played.clear();

        ta.play_transition(SpeedSegment::Forward, &mut player);
        ta.play_transition(SpeedSegment::Turbo, &mut player);

        // Only one animation in flight while out
        assert_eq!(player.played, vec![AnimTrigger::DriveReverseEnd]);

        settle(&mut ta, &rx, &mut player);
        assert_eq!(
            player.played, 
            vec![AnimTrigger::DriveReverseEnd, AnimTrigger::DriveTurboStart]
        );
    }

    #[test]
    fn test_chase_during_in() {
        let (mut ta, rx, mut player) = setup();

        ta.play_transition(SpeedSegment::Forward, &mut player);
        drain(&mut ta, &rx, &mut player);
        assert_eq!(ta.phase(), Phase::In);

        // Target moves while the forward start plays
        ta.play_transition(SpeedSegment::Reverse, &mut player);
        assert_eq!(player.pending.len(), 1);

        settle(&mut ta, &rx, &mut player);
        assert_eq!(player.played, vec![
            AnimTrigger::DriveForwardStart,
            AnimTrigger::DriveForwardEnd,
            AnimTrigger::DriveReverseStart
        ]);
        assert_eq!(ta.current_segment(), SpeedSegment::Reverse);
    }

    #[test]
    fn test_same_target_is_noop() {
        let (mut ta, rx, mut player) = setup();

        ta.play_transition(SpeedSegment::Neutral, &mut player);
        assert!(ta.is_idle());
        assert!(rx.try_recv().is_err());

        ta.play_transition(SpeedSegment::Reverse, &mut player);
        drain(&mut ta, &rx, &mut player);
        ta.play_transition(SpeedSegment::Reverse, &mut player);
        assert_eq!(player.played, vec![AnimTrigger::DriveReverseStart]);
    }

    #[test]
    fn test_failure_advances() {
        let (mut ta, rx, mut player) = setup();

        ta.play_transition(SpeedSegment::Forward, &mut player);
        drain(&mut ta, &rx, &mut player);

        player.complete_all(false);
        let rpts = drain(&mut ta, &rx, &mut player);
        assert!(rpts[0].anim_failed);
        assert_eq!(rpts[0].finished, Some(SpeedSegment::Forward));
    }

    #[test]
    fn test_stale_completions_ignored() {
        let (mut ta, rx, mut player) = setup();

        ta.play_transition(SpeedSegment::Forward, &mut player);
        drain(&mut ta, &rx, &mut player);
        ta.reset();

        player.complete_all(true);
        let rpts = drain(&mut ta, &rx, &mut player);
        assert!(rpts[0].stale);
        assert!(ta.is_idle());
        assert_eq!(ta.current_segment(), SpeedSegment::Neutral);

        let foreign = AnimCompletion { session_id: 7, request_id: 0, success: true };
        assert!(ta.on_complete(foreign, &mut player).stale);
    }

    #[test]
    fn test_convergence() {
        let (mut ta, rx, mut player) = setup();
        let seq = [
            SpeedSegment::Forward, SpeedSegment::Turbo, SpeedSegment::Reverse,
            SpeedSegment::Neutral, SpeedSegment::Forward, SpeedSegment::Reverse
        ];

        // Requests arrive faster than completions, interleaved at random-ish
        // points
        for (i, s) in seq.iter().enumerate() {
            ta.play_transition(*s, &mut player);
            if i % 2 == 1 {
                player.complete_all(true);
                drain(&mut ta, &rx, &mut player);
            }
            assert!(player.pending.len() <= 1);
        }

        settle(&mut ta, &rx, &mut player);
        assert_eq!(ta.current_segment(), SpeedSegment::Reverse);
        assert_eq!(ta.target_segment(), SpeedSegment::Reverse);
        assert_eq!(ta.phase(), Phase::None);
    }
}
