//! Threaded animation player

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::{
    io,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use teleop_if::eqpt::{AnimCallback, AnimTrigger, AnimationPlayer};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Animation player which "plays" each animation by sleeping on a background thread, then calls
/// the completion callback from that thread.
pub struct ThreadedAnimPlayer {
    duration: Duration,
    fail: bool
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl ThreadedAnimPlayer {
    /// Create a new player whose animations last `duration`. If `fail` is set every animation
    /// reports failure.
    pub fn new(duration: Duration, fail: bool) -> Self {
        Self { duration, fail }
    }
}

impl AnimationPlayer for ThreadedAnimPlayer {
    fn play_trigger(&mut self, trigger: AnimTrigger, on_complete: AnimCallback) {
        debug!("Playing animation {:?}", trigger);

        let duration = self.duration;
        let success = !self.fail;
        let name = format!("anim_{:?}", trigger);

        play_on_thread(
            |job| thread::Builder::new().name(name).spawn(job).map(|_| ()),
            duration,
            success,
            on_complete,
        );
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run `on_complete` on a thread started by `spawn` once `duration` has passed.
///
/// The callback stays reachable from this thread until the job takes it, so if the thread cannot
/// be started it is called here with `false` instead.
fn play_on_thread<S>(spawn: S, duration: Duration, success: bool, on_complete: AnimCallback)
where
    S: FnOnce(Box<dyn FnOnce() + Send + 'static>) -> io::Result<()>,
{
    let slot = Arc::new(Mutex::new(Some(on_complete)));
    let job_slot = Arc::clone(&slot);

    let spawned = spawn(Box::new(move || {
        thread::sleep(duration);
        if let Some(cb) = take_callback(&job_slot) {
            cb(success);
        }
    }));

    if let Err(e) = spawned {
        warn!("Could not start animation thread, reporting failure: {}", e);
        if let Some(cb) = take_callback(&slot) {
            cb(false);
        }
    }
}

fn take_callback(slot: &Mutex<Option<AnimCallback>>) -> Option<AnimCallback> {
    match slot.lock() {
        Ok(mut cb) => cb.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_completes_from_thread() {
        let mut player = ThreadedAnimPlayer::new(Duration::from_millis(10), false);
        let (tx, rx) = channel();

        player.play_trigger(AnimTrigger::DriveForwardStart, Box::new(move |ok| {
            tx.send(ok).ok();
        }));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
    }

    #[test]
    fn test_reports_failure() {
        let mut player = ThreadedAnimPlayer::new(Duration::from_millis(1), true);
        let (tx, rx) = channel();

        player.play_trigger(AnimTrigger::DriveReverseEnd, Box::new(move |ok| {
            tx.send(ok).ok();
        }));

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(false));
    }

    #[test]
    fn test_spawn_failure_still_completes() {
        let (tx, rx) = channel();

        play_on_thread(
            |_job| Err(io::Error::new(io::ErrorKind::Other, "no threads left")),
            Duration::from_millis(1),
            true,
            Box::new(move |ok| {
                tx.send(ok).ok();
            }),
        );

        // Called exactly once, synchronously, with failure
        assert_eq!(rx.try_recv(), Ok(false));
        assert!(rx.try_recv().is_err());
    }
}
