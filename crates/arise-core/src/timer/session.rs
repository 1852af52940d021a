//! Elapsed-time tracking for one challenge attempt.
//!
//! Like the rest of the engine this is wall-clock based: every command takes
//! the current epoch milliseconds, and `elapsed(now)` is a pure read.
//!
//! ```text
//! elapsed = accumulated_ms + (running ? now - started_at : 0)
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::ticker::{NoTicks, TickGuard, TickSource};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct TimerSession {
    /// Epoch ms of the last start/resume. `Some` iff running.
    started_at_ms: Option<u64>,
    /// Time banked across pause/resume cycles.
    accumulated_ms: u64,
    ticks: Arc<dyn TickSource>,
    tick_period: Duration,
    /// Held only while running.
    tick: Option<TickGuard>,
}

impl TimerSession {
    pub fn new(ticks: Arc<dyn TickSource>, tick_period: Duration) -> Self {
        Self {
            started_at_ms: None,
            accumulated_ms: 0,
            ticks,
            tick_period,
            tick: None,
        }
    }

    /// A session that never schedules wake-ups.
    pub fn headless() -> Self {
        Self::new(Arc::new(NoTicks), DEFAULT_TICK_PERIOD)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn elapsed(&self, now_ms: u64) -> u64 {
        let live = self
            .started_at_ms
            .map(|started| now_ms.saturating_sub(started))
            .unwrap_or(0);
        self.accumulated_ms.saturating_add(live)
    }

    // ── Commands ─────────────────────────────────────────────────────
    //
    // Each returns whether it applied; an illegal call is a no-op.

    /// Valid only from a fresh session (nothing banked, not running).
    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.is_running() || self.accumulated_ms != 0 {
            return false;
        }
        self.run_from(now_ms);
        true
    }

    pub fn pause(&mut self, now_ms: u64) -> bool {
        let Some(started) = self.started_at_ms.take() else {
            return false;
        };
        self.accumulated_ms = self
            .accumulated_ms
            .saturating_add(now_ms.saturating_sub(started));
        self.tick = None;
        true
    }

    /// Valid only while paused with time banked.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.is_running() || self.accumulated_ms == 0 {
            return false;
        }
        self.run_from(now_ms);
        true
    }

    pub fn reset(&mut self) {
        self.started_at_ms = None;
        self.accumulated_ms = 0;
        self.tick = None;
    }

    fn run_from(&mut self, now_ms: u64) {
        self.started_at_ms = Some(now_ms);
        self.tick = Some(self.ticks.acquire(self.tick_period));
    }
}

impl std::fmt::Debug for TimerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerSession")
            .field("started_at_ms", &self.started_at_ms)
            .field("accumulated_ms", &self.accumulated_ms)
            .field("ticking", &self.tick.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ticker::TickProbe;
    use proptest::prelude::*;

    fn probed() -> (TimerSession, TickProbe) {
        let probe = TickProbe::new();
        let session = TimerSession::new(Arc::new(probe.clone()), DEFAULT_TICK_PERIOD);
        (session, probe)
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = TimerSession::headless();
        assert!(timer.start(1_000));
        assert!(!timer.start(1_500), "already running");
        assert_eq!(timer.elapsed(4_000), 3_000);

        assert!(timer.pause(4_000));
        assert!(!timer.pause(5_000));
        assert_eq!(timer.elapsed(90_000), 3_000, "frozen while paused");

        assert!(timer.resume(10_000));
        assert_eq!(timer.elapsed(12_000), 5_000);
    }

    #[test]
    fn start_rejected_once_time_is_banked() {
        let mut timer = TimerSession::headless();
        timer.start(0);
        timer.pause(500);
        assert!(!timer.start(600));
        assert!(timer.resume(600));
    }

    #[test]
    fn resume_requires_banked_time() {
        let mut timer = TimerSession::headless();
        assert!(!timer.resume(0));
        timer.start(100);
        timer.pause(100);
        assert!(!timer.resume(200));
        // Nothing banked, so this is still a fresh start.
        assert!(timer.start(200));
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut timer = TimerSession::headless();
        timer.start(0);
        timer.pause(2_000);
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.accumulated_ms(), 0);
        assert_eq!(timer.elapsed(10_000), 0);
        assert!(timer.start(10_000));
    }

    #[test]
    fn tick_held_only_while_running() {
        let (mut timer, probe) = probed();
        timer.start(0);
        assert_eq!(probe.live(), 1);
        timer.pause(1_000);
        assert_eq!(probe.live(), 0);
        timer.resume(2_000);
        assert_eq!(probe.live(), 1);
        timer.reset();
        assert_eq!(probe.live(), 0);
        assert_eq!(probe.acquired(), 2);
    }

    #[test]
    fn dropping_running_session_releases_tick() {
        let (mut timer, probe) = probed();
        timer.start(0);
        drop(timer);
        assert_eq!(probe.live(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Start,
        Pause,
        Resume,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Start), Just(Op::Pause), Just(Op::Resume)]
    }

    proptest! {
        #[test]
        fn elapsed_is_monotonic_and_counts_running_time(
            steps in proptest::collection::vec((op(), 0u64..10_000), 1..64)
        ) {
            let mut timer = TimerSession::headless();
            let mut now = 0u64;
            let mut last = 0u64;
            let mut running_total = 0u64;

            for (op, gap) in steps {
                let was_running = timer.is_running();
                now += gap;
                if was_running {
                    running_total += gap;
                }

                let elapsed = timer.elapsed(now);
                prop_assert!(elapsed >= last);
                prop_assert_eq!(elapsed, running_total);
                last = elapsed;

                match op {
                    Op::Start => { timer.start(now); }
                    Op::Pause => { timer.pause(now); }
                    Op::Resume => { timer.resume(now); }
                }
                prop_assert_eq!(timer.elapsed(now), running_total);
            }
        }
    }
}
