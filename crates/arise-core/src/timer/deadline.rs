//! Remaining time against a fixed deadline.
//!
//! Purely advisory: a deadline in the past reads as zero remaining and never
//! fails a challenge on the client. The ledger decides whether a late
//! request is still honored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds from `now` until `deadline`, clamped at zero.
pub fn remaining_ms(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (deadline - now).num_milliseconds().max(0) as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeRemaining {
    /// No deadline; nothing to render.
    Unlimited,
    Limited { ms: u64 },
}

impl TimeRemaining {
    pub fn as_ms(self) -> Option<u64> {
        match self {
            TimeRemaining::Unlimited => None,
            TimeRemaining::Limited { ms } => Some(ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeadlineClock {
    deadline: Option<DateTime<Utc>>,
}

impl DeadlineClock {
    pub fn new(deadline: Option<DateTime<Utc>>) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> TimeRemaining {
        match self.deadline {
            Some(deadline) => TimeRemaining::Limited {
                ms: remaining_ms(deadline, now),
            },
            None => TimeRemaining::Unlimited,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_hms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn remaining_counts_down() {
        let now = Utc::now();
        let deadline = now + Duration::hours(1);
        assert_eq!(remaining_ms(deadline, now), 3_600_000);
        assert_eq!(
            remaining_ms(deadline, now + Duration::minutes(20)),
            2_400_000
        );
    }

    #[test]
    fn past_deadline_is_exactly_zero() {
        let now = Utc::now();
        let deadline = now - Duration::seconds(5);
        assert_eq!(remaining_ms(deadline, now), 0);
        assert_eq!(remaining_ms(now, now), 0);
        assert_eq!(remaining_ms(now, now + Duration::days(3)), 0);
    }

    #[test]
    fn no_deadline_is_unlimited() {
        let clock = DeadlineClock::new(None);
        assert_eq!(clock.remaining(Utc::now()), TimeRemaining::Unlimited);
        assert!(!clock.is_expired(Utc::now()));
    }

    #[test]
    fn expiry_is_reported_not_enforced() {
        let now = Utc::now();
        let clock = DeadlineClock::new(Some(now));
        assert!(clock.is_expired(now));
        assert_eq!(clock.remaining(now).as_ms(), Some(0));
    }

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(61_999), "00:01:01");
        assert_eq!(format_hms(3_600_000 * 25 + 1_000), "25:00:01");
    }
}
