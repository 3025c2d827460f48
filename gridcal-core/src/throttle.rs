//! Mutation throttling and the wall-clock run budget.
//!
//! The calendar store rate-limits mutating calls; issuing them
//! back-to-back gets the run rejected partway through. The contract is a
//! fixed pause after every mutating call, and it holds even when the run
//! is close to its time ceiling. The ceiling itself does not stop the
//! loop; it only tells the reconciler to checkpoint what it has written
//! so a forced restart does not redo completed work.

use std::time::{Duration, Instant};

use tracing::debug;

/// Clock and sleep, injectable so tests can assert pause counts without
/// real wall-clock delay.
pub trait TimeSource {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// The real thing: `Instant::now` and a blocking thread sleep.
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Throttle timings. The defaults were found workable for deleting and
/// re-adding ~240 events in one run against a rate-limited store.
#[derive(Debug, Clone)]
pub struct ThrottleOptions {
    /// Pause after each individual store mutation.
    pub pause_per_mutation: Duration,
    /// Wall-clock ceiling after which progress is checkpointed early.
    pub max_run_time: Duration,
}

impl Default for ThrottleOptions {
    fn default() -> Self {
        ThrottleOptions {
            pause_per_mutation: Duration::from_millis(200),
            max_run_time: Duration::from_secs(345), // 5.75 minutes
        }
    }
}

/// Per-run throttle state: started at run start, consulted after every
/// mutation and at each row boundary.
pub struct Throttle<'t> {
    options: ThrottleOptions,
    time: &'t dyn TimeSource,
    started: Instant,
}

impl<'t> Throttle<'t> {
    pub fn start(options: ThrottleOptions, time: &'t dyn TimeSource) -> Self {
        let started = time.now();
        Throttle {
            options,
            time,
            started,
        }
    }

    /// Pause for one mutation's worth of time.
    pub fn pause(&self) {
        self.time.sleep(self.options.pause_per_mutation);
    }

    /// Pause once per issued mutation (e.g. an in-place update that set
    /// two fields and added a guest weighs three).
    pub fn pause_weighted(&self, mutations: usize) {
        if mutations == 0 {
            return;
        }
        self.time
            .sleep(self.options.pause_per_mutation * mutations as u32);
    }

    pub fn elapsed(&self) -> Duration {
        self.time.now().duration_since(self.started)
    }

    /// True once the run has outlived its wall-clock ceiling.
    pub fn over_budget(&self) -> bool {
        let over = self.elapsed() > self.options.max_run_time;
        if over {
            debug!(elapsed = ?self.elapsed(), "run budget exceeded");
        }
        over
    }
}
