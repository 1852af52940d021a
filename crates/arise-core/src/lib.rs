//! # Arise Core Library
//!
//! Challenge execution and reward resolution for the Arise training system.
//! The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Challenge controller**: a wall-clock-based state machine driving one
//!   attempt from activation to a ledger-confirmed result
//! - **Timer**: pausable elapsed-time tracking plus a cancellable display tick
//! - **Ledger**: the remote authority for rewards, penalties and progression
//! - **Progression**: ordered reveal of resolution rewards and the
//!   session-scoped snapshot cache
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`ChallengeController`]: Core challenge state machine
//! - [`LedgerClient`]: HTTP client for the progression ledger
//! - [`ProgressionNotifier`]: Sequenced reward presentation
//! - [`Config`]: Application configuration management

pub mod challenge;
pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod ledger;
pub mod progression;
pub mod storage;
pub mod timer;

pub use challenge::{
    CatalogSection, Challenge, ChallengeKind, ExerciseChecklist, ExerciseRequirement,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{
    ChallengeController, ChallengeState, ResolutionIntent, ResolutionReply, ResolutionTicket,
    StateKind,
};
pub use error::{ConfigError, CredentialError, LedgerError, LedgerErrorKind};
pub use events::Event;
pub use ledger::{
    KeyringCredential, Ledger, LedgerClient, PunishmentNotice, ResolutionOutcome,
    StaticCredential,
};
pub use progression::{
    Presenter, ProgressionNotifier, Reveal, SnapshotCache, UserProgressionSnapshot,
};
pub use storage::Config;
pub use timer::{DeadlineClock, IntervalTicks, TimeRemaining, TimerSession};
