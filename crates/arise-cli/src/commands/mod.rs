pub mod auth;
pub mod config;
pub mod profile;
pub mod quests;
pub mod shop;
pub mod train;

use std::sync::Arc;

use arise_core::ledger::{CredentialProvider, KeyringCredential, LedgerClient, StaticCredential};
use arise_core::{CatalogSection, Config};
use clap::ValueEnum;

/// Overrides the keyring token when set.
pub const TOKEN_ENV: &str = "ARISE_TOKEN";

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SectionArg {
    Daily,
    Dungeons,
    Bosses,
    Punishments,
    Missions,
}

impl From<SectionArg> for CatalogSection {
    fn from(arg: SectionArg) -> Self {
        match arg {
            SectionArg::Daily => CatalogSection::Daily,
            SectionArg::Dungeons => CatalogSection::Dungeons,
            SectionArg::Bosses => CatalogSection::Bosses,
            SectionArg::Punishments => CatalogSection::Punishments,
            SectionArg::Missions => CatalogSection::Missions,
        }
    }
}

pub fn credentials() -> Arc<dyn CredentialProvider> {
    match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => Arc::new(StaticCredential::new(token)),
        _ => Arc::new(KeyringCredential::new()),
    }
}

pub fn ledger_client(config: &Config) -> Result<Arc<LedgerClient>, Box<dyn std::error::Error>> {
    tracing::debug!(base_url = %config.ledger.base_url, "using ledger");
    Ok(Arc::new(LedgerClient::from_config(&config.ledger, credentials())?))
}
