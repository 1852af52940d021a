//! The remote progression ledger: the authority for rewards, penalties and
//! the user's progression.

mod actions;
mod client;
mod credentials;
mod resolution;
mod traits;

pub use actions::{ActionReceipt, ShopItem, ShopItemKind};
pub use client::LedgerClient;
pub use credentials::{Anonymous, CredentialProvider, KeyringCredential, StaticCredential};
pub use resolution::{
    classify_completion, Achievement, AchievementPayload, Collectible, CompletePayload,
    FailPayload, LevelUp, PunishmentNotice, Rarity, ResolutionOutcome, ShadowPayload,
};
pub use traits::Ledger;
