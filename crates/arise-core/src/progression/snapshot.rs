//! Session-scoped cache of the user's progression.
//!
//! There is no ambient "current user": whoever needs the snapshot is handed
//! a [`SnapshotCache`] clone. The only writer is [`SnapshotCache::refresh`],
//! which re-reads the profile from the ledger. Nothing updates it
//! optimistically.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::challenge::{Rank, Stat};
use crate::error::LedgerError;
use crate::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProgressionSnapshot {
    #[serde(default)]
    pub hunter_name: String,
    #[serde(default)]
    pub title: String,
    pub level: u32,
    pub experience: u64,
    pub exp_to_next: u64,
    pub gold: u64,
    #[serde(default)]
    pub rank: Rank,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub stat_points: u32,
    #[serde(default)]
    pub stats: BTreeMap<Stat, u32>,
    /// Ids of owned shadows.
    #[serde(default)]
    pub shadows: Vec<String>,
    #[serde(default)]
    pub shadow_bonuses: BTreeMap<Stat, u32>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub quests_completed: u64,
    #[serde(default)]
    pub streak_shields: u32,
}

impl UserProgressionSnapshot {
    /// Base stat plus collectible bonus.
    pub fn effective_stat(&self, stat: Stat) -> u32 {
        let base = self.stats.get(&stat).copied().unwrap_or(0);
        let bonus = self.shadow_bonuses.get(&stat).copied().unwrap_or(0);
        base.saturating_add(bonus)
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Sequence number of the refresh that produced `snapshot`.
    seq: u64,
    snapshot: Option<UserProgressionSnapshot>,
}

#[derive(Debug, Default)]
struct Inner {
    issued: AtomicU64,
    slot: Mutex<Slot>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<Inner>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<UserProgressionSnapshot> {
        self.lock().snapshot.clone()
    }

    /// Re-fetch the profile and store it.
    ///
    /// When refreshes overlap, a reply from an older request never replaces
    /// the result of a newer one. On error the previous snapshot is kept.
    pub async fn refresh(
        &self,
        ledger: &dyn Ledger,
    ) -> Result<UserProgressionSnapshot, LedgerError> {
        let seq = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let fresh = ledger.profile().await?;

        let mut slot = self.lock();
        if seq > slot.seq {
            slot.seq = seq;
            slot.snapshot = Some(fresh.clone());
            tracing::debug!(seq, level = fresh.level, "snapshot refreshed");
        } else {
            tracing::debug!(seq, applied = slot.seq, "discarding stale snapshot");
        }
        Ok(fresh)
    }

    /// Run an action that changes progression on the ledger, then re-read
    /// the profile. A failed action skips the refresh and leaves the cache
    /// as it was.
    pub async fn apply<T>(
        &self,
        ledger: &dyn Ledger,
        action: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<(T, UserProgressionSnapshot), LedgerError> {
        let receipt = action.await?;
        let snapshot = self.refresh(ledger).await?;
        Ok((receipt, snapshot))
    }

    /// Fire-and-forget refresh on the current tokio runtime.
    pub fn spawn_refresh(
        &self,
        ledger: Arc<dyn Ledger>,
    ) -> JoinHandle<Result<UserProgressionSnapshot, LedgerError>> {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = cache.refresh(ledger.as_ref()).await;
            if let Err(e) = &result {
                tracing::warn!("snapshot refresh failed: {e}");
            }
            result
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.inner
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
