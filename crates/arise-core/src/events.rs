use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeKind;
use crate::controller::{ResolutionIntent, StateKind};
use crate::error::{LedgerError, LedgerErrorKind};
use crate::ledger::{PunishmentNotice, ResolutionOutcome};
use crate::timer::TimeRemaining;

/// Every state change of a challenge controller produces an Event.
/// Illegal transitions produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ChallengeActivated {
        challenge_id: String,
        kind: ChallengeKind,
        remaining: TimeRemaining,
        at: DateTime<Utc>,
    },
    /// The start-training notice failed; the controller stayed Idle.
    ActivationRejected {
        challenge_id: String,
        error: LedgerErrorKind,
        message: String,
        retryable: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    ExerciseToggled {
        index: usize,
        satisfied: bool,
        all_satisfied: bool,
        at: DateTime<Utc>,
    },
    ResolutionRequested {
        challenge_id: String,
        intent: ResolutionIntent,
        at: DateTime<Utc>,
    },
    ChallengeResolved {
        challenge_id: String,
        outcome: ResolutionOutcome,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    ChallengeFailed {
        challenge_id: String,
        notice: PunishmentNotice,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    /// The ledger call failed; the attempt was rolled back to `restored`.
    ResolutionRejected {
        challenge_id: String,
        intent: ResolutionIntent,
        error: LedgerErrorKind,
        message: String,
        retryable: bool,
        restored: StateKind,
        at: DateTime<Utc>,
    },
    ChallengeReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: StateKind,
        challenge_id: String,
        elapsed_ms: u64,
        remaining: TimeRemaining,
        /// Satisfaction flags, empty when the challenge has no exercises.
        checklist: Vec<bool>,
        completion_allowed: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn activation_rejected(challenge_id: &str, err: &LedgerError, at: DateTime<Utc>) -> Self {
        Event::ActivationRejected {
            challenge_id: challenge_id.to_string(),
            error: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
            at,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::ChallengeActivated { at, .. }
            | Event::ActivationRejected { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::ExerciseToggled { at, .. }
            | Event::ResolutionRequested { at, .. }
            | Event::ChallengeResolved { at, .. }
            | Event::ChallengeFailed { at, .. }
            | Event::ResolutionRejected { at, .. }
            | Event::ChallengeReset { at }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
