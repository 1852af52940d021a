use async_trait::async_trait;

use super::resolution::{PunishmentNotice, ResolutionOutcome};
use crate::error::LedgerError;
use crate::progression::UserProgressionSnapshot;

/// The remote progression ledger, as seen by the challenge engine.
///
/// Every call is a single request. Nothing here retries: a repeated
/// `complete` could grant rewards twice, so retries are left to the user.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Tell the ledger a deadline-tracked quest has begun. Starting an
    /// already-started quest is harmless.
    async fn start_training(&self, challenge_id: &str) -> Result<(), LedgerError>;

    async fn complete(&self, challenge_id: &str) -> Result<ResolutionOutcome, LedgerError>;

    /// Surrender; the ledger assigns a punishment.
    async fn fail(&self, challenge_id: &str) -> Result<PunishmentNotice, LedgerError>;

    async fn profile(&self) -> Result<UserProgressionSnapshot, LedgerError>;
}
