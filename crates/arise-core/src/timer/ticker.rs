//! Scheduled wake-ups for a running timer.
//!
//! A [`TickSource`] hands out [`TickGuard`]s. The guard *is* the recurring
//! wake-up: dropping it cancels the ticks. A `TimerSession` holds its guard
//! only while running, so pause, reset, resolution and teardown all release
//! it on every exit path.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// One display-refresh wake-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Monotonic counter across all guards of one source.
    pub seq: u64,
}

pub trait TickSource: Send + Sync {
    /// Begin ticking every `period` until the returned guard is dropped.
    fn acquire(&self, period: Duration) -> TickGuard;
}

/// Releases a recurring wake-up when dropped.
pub struct TickGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl TickGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release.
    pub fn inert() -> Self {
        Self { release: None }
    }
}

impl Drop for TickGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for TickGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Headless source: no wake-ups at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTicks;

impl TickSource for NoTicks {
    fn acquire(&self, _period: Duration) -> TickGuard {
        TickGuard::inert()
    }
}

/// Tokio-backed ticks delivered over a channel.
///
/// Each acquisition spawns an interval task; the guard aborts it.
#[derive(Debug, Clone)]
pub struct IntervalTicks {
    tx: mpsc::UnboundedSender<Tick>,
    seq: Arc<AtomicU64>,
}

impl IntervalTicks {
    pub fn new(tx: mpsc::UnboundedSender<Tick>) -> Self {
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Convenience constructor returning the receiving end as well.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TickSource for IntervalTicks {
    fn acquire(&self, period: Duration) -> TickGuard {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime; timer display will not auto-refresh");
            return TickGuard::inert();
        };

        let tx = self.tx.clone();
        let seq = Arc::clone(&self.seq);
        let task = handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let tick = Tick {
                    seq: seq.fetch_add(1, Ordering::Relaxed),
                };
                if tx.send(tick).is_err() {
                    break;
                }
            }
        });

        TickGuard::new(move || task.abort())
    }
}

/// Counts live guards. Useful to assert that wake-ups never leak.
#[derive(Debug, Clone, Default)]
pub struct TickProbe {
    live: Arc<AtomicUsize>,
    acquired: Arc<AtomicUsize>,
}

impl TickProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guards currently held.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Guards handed out since creation.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl TickSource for TickProbe {
    fn acquire(&self, _period: Duration) -> TickGuard {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let live = Arc::clone(&self.live);
        TickGuard::new(move || {
            live.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_tracks_guard_lifetime() {
        let probe = TickProbe::new();
        let guard = probe.acquire(Duration::from_secs(1));
        assert_eq!(probe.live(), 1);
        drop(guard);
        assert_eq!(probe.live(), 0);
        assert_eq!(probe.acquired(), 1);
    }

    #[test]
    fn interval_ticks_without_runtime_are_inert() {
        let (ticks, _rx) = IntervalTicks::channel();
        let guard = ticks.acquire(Duration::from_secs(1));
        assert!(format!("{guard:?}").contains("armed: false"));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_stop_when_guard_drops() {
        let (ticks, mut rx) = IntervalTicks::channel();
        let guard = ticks.acquire(Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);

        drop(guard);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
