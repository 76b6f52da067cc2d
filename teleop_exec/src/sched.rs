//! # Scheduler
//!
//! A cooperative timer table for the control loop. Nothing runs on its own:
//! the owner polls the scheduler with the current time and runs whatever is
//! due. Cancelling a timer takes effect immediately, a cancelled timer is
//! never reported as due again.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::time::Duration;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to a periodic timer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TimerHandle(usize);

/// A set of periodic timers.
#[derive(Default)]
pub struct Scheduler {
    timers: Vec<Option<Timer>>
}

struct Timer {
    interval: Duration,
    next_due: Duration
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a timer which first fires one interval after `now`.
    pub fn add_periodic(&mut self, interval: Duration, now: Duration) -> TimerHandle {
        self.timers.push(Some(Timer {
            interval,
            next_due: now + interval
        }));

        TimerHandle(self.timers.len() - 1)
    }

    /// Cancel a timer. Cancelling twice does nothing.
    pub fn cancel(&mut self, handle: TimerHandle) {
        if let Some(t) = self.timers.get_mut(handle.0) {
            *t = None;
        }
    }

    /// Return the timers due at `now`, in the order they were added.
    ///
    /// A timer is reported at most once per poll. Periods missed because the
    /// scheduler was polled late are skipped rather than replayed.
    pub fn poll(&mut self, now: Duration) -> Vec<TimerHandle> {
        let mut due = Vec::new();

        for (i, slot) in self.timers.iter_mut().enumerate() {
            let timer = match slot {
                Some(t) => t,
                None => continue
            };

            if now < timer.next_due {
                continue;
            }

            due.push(TimerHandle(i));
            timer.next_due += timer.interval;

            let mut skipped = 0;
            while timer.next_due <= now && timer.interval > Duration::from_secs(0) {
                timer.next_due += timer.interval;
                skipped += 1;
            }
            if skipped > 0 {
                trace!("Timer {} skipped {} periods", i, skipped);
            }
        }

        due
    }
}
