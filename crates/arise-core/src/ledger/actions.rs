//! Progression changes made outside a challenge: spending stat points and
//! buying from the shop.
//!
//! The ledger applies both. Callers follow a successful action with a
//! profile refresh (see [`crate::SnapshotCache::apply`]).

use serde::{Deserialize, Serialize};

use super::resolution::{Achievement, AchievementPayload};
use crate::challenge::Stat;
use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItemKind {
    Consumable,
    Title,
    StatBoost,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u64,
    #[serde(rename = "type")]
    pub kind: ShopItemKind,
    /// Opaque to the client; the ledger interprets it on purchase.
    #[serde(default)]
    pub effect: serde_json::Value,
}

/// Body of a stat upgrade request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StatUpgradeRequest {
    pub stat_name: Stat,
    pub points: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ActionPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub achievements_unlocked: Vec<AchievementPayload>,
}

/// What the ledger reported after applying an action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub message: String,
    pub achievements: Vec<Achievement>,
}

impl TryFrom<ActionPayload> for ActionReceipt {
    type Error = LedgerError;

    fn try_from(p: ActionPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            message: p.message,
            achievements: p
                .achievements_unlocked
                .into_iter()
                .map(Achievement::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

pub(crate) fn parse_receipt(body: &str) -> Result<ActionReceipt, LedgerError> {
    let payload: ActionPayload =
        serde_json::from_str(body).map_err(|e| LedgerError::Malformed(e.to_string()))?;
    payload.try_into()
}
