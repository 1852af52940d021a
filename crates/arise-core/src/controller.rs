//! Challenge execution state machine.
//!
//! ```text
//! Idle --activate--> Active <--pause/resume--> Paused
//!                      |                          |
//!                      +--complete/fail--> Resolving <--fail--+
//!                                           |   |  \
//!                                     Resolved  Failed  rollback to Active/Paused
//! ```
//!
//! The attempt (timer plus checklist) lives inside the Active, Paused and
//! Resolving variants, so it is created on activation and dropped on
//! resolution or reset. Dropping it releases the display tick.
//!
//! Resolution is split in three steps so a caller can keep handling ticks
//! while the request is in flight:
//!
//! 1. [`ChallengeController::begin_complete`] / [`ChallengeController::begin_fail`]
//!    move to Resolving and hand out a [`ResolutionTicket`]
//! 2. [`ResolutionTicket::send`] performs the ledger call without touching
//!    the controller
//! 3. [`ChallengeController::settle`] applies the reply
//!
//! All commands return `Option<Event>`; `None` means the command was not
//! legal in the current state and nothing changed.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::challenge::{Challenge, ExerciseChecklist};
use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::events::Event;
use crate::ledger::{Ledger, PunishmentNotice, ResolutionOutcome};
use crate::timer::{NoTicks, TickSource, TimerSession, DEFAULT_TICK_PERIOD};

/// One in-progress run at a challenge.
#[derive(Debug)]
pub struct Attempt {
    session: TimerSession,
    checklist: ExerciseChecklist,
}

impl Attempt {
    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn checklist(&self) -> &ExerciseChecklist {
        &self.checklist
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionIntent {
    Complete,
    Fail,
}

#[derive(Debug, Default)]
pub enum ChallengeState {
    #[default]
    Idle,
    Active(Attempt),
    Paused(Attempt),
    Resolving {
        attempt: Attempt,
        intent: ResolutionIntent,
        /// State to roll back to if the ledger call fails.
        resume_to: StateKind,
        /// Elapsed time when resolution was requested.
        elapsed_ms: u64,
    },
    Resolved {
        outcome: ResolutionOutcome,
        elapsed_ms: u64,
    },
    Failed {
        notice: PunishmentNotice,
        elapsed_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Idle,
    Active,
    Paused,
    Resolving,
    Resolved,
    Failed,
}

impl ChallengeState {
    pub fn kind(&self) -> StateKind {
        match self {
            ChallengeState::Idle => StateKind::Idle,
            ChallengeState::Active(_) => StateKind::Active,
            ChallengeState::Paused(_) => StateKind::Paused,
            ChallengeState::Resolving { .. } => StateKind::Resolving,
            ChallengeState::Resolved { .. } => StateKind::Resolved,
            ChallengeState::Failed { .. } => StateKind::Failed,
        }
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        match self {
            ChallengeState::Active(attempt)
            | ChallengeState::Paused(attempt)
            | ChallengeState::Resolving { attempt, .. } => Some(attempt),
            _ => None,
        }
    }
}

/// A pending ledger call. Owns everything it needs, so it can be moved into
/// a spawned task.
pub struct ResolutionTicket {
    generation: u64,
    challenge_id: String,
    intent: ResolutionIntent,
    ledger: Arc<dyn Ledger>,
}

impl ResolutionTicket {
    pub fn intent(&self) -> ResolutionIntent {
        self.intent
    }

    pub fn challenge_id(&self) -> &str {
        &self.challenge_id
    }

    /// Perform the ledger call. Never retried.
    pub async fn send(self) -> ResolutionReply {
        let result = match self.intent {
            ResolutionIntent::Complete => {
                ReplyResult::Completed(self.ledger.complete(&self.challenge_id).await)
            }
            ResolutionIntent::Fail => {
                ReplyResult::Failed(self.ledger.fail(&self.challenge_id).await)
            }
        };
        ResolutionReply {
            generation: self.generation,
            result,
        }
    }
}

impl std::fmt::Debug for ResolutionTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionTicket")
            .field("generation", &self.generation)
            .field("challenge_id", &self.challenge_id)
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum ReplyResult {
    Completed(Result<ResolutionOutcome, LedgerError>),
    Failed(Result<PunishmentNotice, LedgerError>),
}

/// The ledger's answer to a [`ResolutionTicket`].
#[derive(Debug, Clone)]
pub struct ResolutionReply {
    generation: u64,
    result: ReplyResult,
}

impl ResolutionReply {
    pub fn result(&self) -> &ReplyResult {
        &self.result
    }
}

pub struct ChallengeController {
    challenge: Arc<Challenge>,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    ticks: Arc<dyn TickSource>,
    tick_period: Duration,
    state: ChallengeState,
    /// Bumped on every `begin_*`; replies from older tickets are ignored.
    generation: u64,
    last_error: Option<LedgerError>,
}

impl ChallengeController {
    pub fn new(challenge: Arc<Challenge>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            challenge,
            ledger,
            clock: Arc::new(SystemClock),
            ticks: Arc::new(NoTicks),
            tick_period: DEFAULT_TICK_PERIOD,
            state: ChallengeState::Idle,
            generation: 0,
            last_error: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ticks(mut self, ticks: Arc<dyn TickSource>, period: Duration) -> Self {
        self.ticks = ticks;
        self.tick_period = period;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn challenge(&self) -> &Arc<Challenge> {
        &self.challenge
    }

    pub fn state(&self) -> &ChallengeState {
        &self.state
    }

    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    pub fn last_error(&self) -> Option<&LedgerError> {
        self.last_error.as_ref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        match &self.state {
            ChallengeState::Idle => 0,
            ChallengeState::Active(attempt) | ChallengeState::Paused(attempt) => {
                attempt.session.elapsed(self.clock.now_ms())
            }
            ChallengeState::Resolving { attempt, .. } => {
                attempt.session.elapsed(self.clock.now_ms())
            }
            ChallengeState::Resolved { elapsed_ms, .. }
            | ChallengeState::Failed { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// Whether `begin_complete` would be accepted right now.
    pub fn can_complete(&self) -> bool {
        match &self.state {
            ChallengeState::Active(attempt) => {
                !self.challenge.requires_checklist() || attempt.checklist.all_satisfied()
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> Event {
        let now = self.clock.now();
        Event::StateSnapshot {
            state: self.kind(),
            challenge_id: self.challenge.id.clone(),
            elapsed_ms: self.elapsed_ms(),
            remaining: self.challenge.deadline_clock().remaining(now),
            checklist: self
                .state
                .attempt()
                .map(|a| a.checklist.flags().to_vec())
                .unwrap_or_default(),
            completion_allowed: self.can_complete(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the attempt.
    ///
    /// Challenges with a server-tracked deadline first notify the ledger.
    /// A validation reply means the quest was already started and is
    /// ignored; any other error keeps the controller Idle.
    pub async fn activate(&mut self) -> Option<Event> {
        if !matches!(self.state, ChallengeState::Idle) {
            return None;
        }

        if self.challenge.has_server_deadline() {
            match self.ledger.start_training(&self.challenge.id).await {
                Ok(()) => {}
                Err(LedgerError::Validation { message, .. }) => {
                    tracing::debug!(
                        challenge = %self.challenge.id,
                        "start-training rejected, continuing: {message}"
                    );
                }
                Err(e) => {
                    tracing::warn!(challenge = %self.challenge.id, "activation failed: {e}");
                    let event =
                        Event::activation_rejected(&self.challenge.id, &e, self.clock.now());
                    self.last_error = Some(e);
                    return Some(event);
                }
            }
        }

        let now = self.clock.now();
        let mut session = TimerSession::new(Arc::clone(&self.ticks), self.tick_period);
        session.start(self.clock.now_ms());
        self.state = ChallengeState::Active(Attempt {
            session,
            checklist: ExerciseChecklist::for_challenge(&self.challenge),
        });
        self.last_error = None;
        tracing::info!(
            challenge = %self.challenge.id,
            kind = self.challenge.kind.label(),
            "challenge activated"
        );

        Some(Event::ChallengeActivated {
            challenge_id: self.challenge.id.clone(),
            kind: self.challenge.kind,
            remaining: self.challenge.deadline_clock().remaining(now),
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        let ChallengeState::Active(_) = self.state else {
            return None;
        };
        let now_ms = self.clock.now_ms();
        let ChallengeState::Active(mut attempt) = mem::take(&mut self.state) else {
            return None;
        };
        attempt.session.pause(now_ms);
        let elapsed_ms = attempt.session.elapsed(now_ms);
        self.state = ChallengeState::Paused(attempt);
        tracing::debug!(elapsed_ms, "timer paused");
        Some(Event::TimerPaused {
            elapsed_ms,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        let ChallengeState::Paused(_) = self.state else {
            return None;
        };
        let now_ms = self.clock.now_ms();
        let ChallengeState::Paused(mut attempt) = mem::take(&mut self.state) else {
            return None;
        };
        // Paused the instant it started: nothing banked, so start afresh.
        if !attempt.session.resume(now_ms) {
            attempt.session.start(now_ms);
        }
        let elapsed_ms = attempt.session.elapsed(now_ms);
        self.state = ChallengeState::Active(attempt);
        tracing::debug!(elapsed_ms, "timer resumed");
        Some(Event::TimerResumed {
            elapsed_ms,
            at: self.clock.now(),
        })
    }

    /// Flip one checklist entry. Only while Active; out-of-range indices
    /// are ignored.
    pub fn toggle(&mut self, index: usize) -> Option<Event> {
        let ChallengeState::Active(attempt) = &mut self.state else {
            return None;
        };
        let satisfied = attempt.checklist.toggle(index)?;
        Some(Event::ExerciseToggled {
            index,
            satisfied,
            all_satisfied: attempt.checklist.all_satisfied(),
            at: self.clock.now(),
        })
    }

    /// Move to Resolving for a completion. Refused unless Active and, for
    /// gated challenges, every exercise is checked.
    pub fn begin_complete(&mut self) -> Option<(ResolutionTicket, Event)> {
        if !self.can_complete() {
            return None;
        }
        self.begin(ResolutionIntent::Complete)
    }

    /// Move to Resolving for a surrender. Allowed while Active or Paused.
    pub fn begin_fail(&mut self) -> Option<(ResolutionTicket, Event)> {
        if !matches!(
            self.state,
            ChallengeState::Active(_) | ChallengeState::Paused(_)
        ) {
            return None;
        }
        self.begin(ResolutionIntent::Fail)
    }

    fn begin(&mut self, intent: ResolutionIntent) -> Option<(ResolutionTicket, Event)> {
        let now_ms = self.clock.now_ms();
        let (attempt, resume_to) = match mem::take(&mut self.state) {
            ChallengeState::Active(attempt) => (attempt, StateKind::Active),
            ChallengeState::Paused(attempt) => (attempt, StateKind::Paused),
            other => {
                self.state = other;
                return None;
            }
        };

        self.generation += 1;
        let elapsed_ms = attempt.session.elapsed(now_ms);
        self.state = ChallengeState::Resolving {
            attempt,
            intent,
            resume_to,
            elapsed_ms,
        };
        tracing::info!(challenge = %self.challenge.id, ?intent, elapsed_ms, "resolution requested");

        let ticket = ResolutionTicket {
            generation: self.generation,
            challenge_id: self.challenge.id.clone(),
            intent,
            ledger: Arc::clone(&self.ledger),
        };
        let event = Event::ResolutionRequested {
            challenge_id: self.challenge.id.clone(),
            intent,
            at: self.clock.now(),
        };
        Some((ticket, event))
    }

    /// Apply a ledger reply.
    ///
    /// Success ends the attempt. Any error restores the state the attempt
    /// was in before resolution, with its timer and checklist intact.
    pub fn settle(&mut self, reply: ResolutionReply) -> Option<Event> {
        if reply.generation != self.generation {
            tracing::warn!(
                reply = reply.generation,
                current = self.generation,
                "ignoring stale resolution reply"
            );
            return None;
        }
        let ChallengeState::Resolving { .. } = self.state else {
            return None;
        };
        let ChallengeState::Resolving {
            attempt,
            intent,
            resume_to,
            elapsed_ms,
        } = mem::take(&mut self.state)
        else {
            return None;
        };

        let at = self.clock.now();
        let challenge_id = self.challenge.id.clone();

        let error = match reply.result {
            ReplyResult::Completed(Ok(outcome)) => {
                tracing::info!(
                    challenge = %challenge_id,
                    exp = outcome.exp_gained,
                    gold = outcome.gold_gained,
                    level_up = outcome.level_up.is_some(),
                    "challenge resolved"
                );
                self.state = ChallengeState::Resolved {
                    outcome: outcome.clone(),
                    elapsed_ms,
                };
                self.last_error = None;
                return Some(Event::ChallengeResolved {
                    challenge_id,
                    outcome,
                    elapsed_ms,
                    at,
                });
            }
            ReplyResult::Failed(Ok(notice)) => {
                tracing::info!(
                    challenge = %challenge_id,
                    exp_lost = notice.exp_lost,
                    "challenge failed"
                );
                self.state = ChallengeState::Failed {
                    notice: notice.clone(),
                    elapsed_ms,
                };
                self.last_error = None;
                return Some(Event::ChallengeFailed {
                    challenge_id,
                    notice,
                    elapsed_ms,
                    at,
                });
            }
            ReplyResult::Completed(Err(e)) | ReplyResult::Failed(Err(e)) => e,
        };

        tracing::warn!(
            challenge = %challenge_id,
            ?intent,
            restored = ?resume_to,
            "resolution rolled back: {error}"
        );
        self.state = match resume_to {
            StateKind::Paused => ChallengeState::Paused(attempt),
            _ => ChallengeState::Active(attempt),
        };
        let event = Event::ResolutionRejected {
            challenge_id,
            intent,
            error: error.kind(),
            message: error.to_string(),
            retryable: error.is_retryable(),
            restored: resume_to,
            at,
        };
        self.last_error = Some(error);
        Some(event)
    }

    /// `begin_complete`, `send` and `settle` in one go.
    pub async fn request_complete(&mut self) -> Option<Event> {
        let (ticket, _) = self.begin_complete()?;
        let reply = ticket.send().await;
        self.settle(reply)
    }

    /// `begin_fail`, `send` and `settle` in one go.
    pub async fn request_fail(&mut self) -> Option<Event> {
        let (ticket, _) = self.begin_fail()?;
        let reply = ticket.send().await;
        self.settle(reply)
    }

    /// Drop the attempt or the result and return to Idle. Refused while a
    /// resolution is in flight.
    pub fn reset(&mut self) -> Option<Event> {
        match self.state {
            ChallengeState::Idle | ChallengeState::Resolving { .. } => None,
            _ => {
                self.state = ChallengeState::Idle;
                self.last_error = None;
                tracing::debug!(challenge = %self.challenge.id, "challenge reset");
                Some(Event::ChallengeReset {
                    at: self.clock.now(),
                })
            }
        }
    }
}

impl std::fmt::Debug for ChallengeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeController")
            .field("challenge", &self.challenge.id)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
