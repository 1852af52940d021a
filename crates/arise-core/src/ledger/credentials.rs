//! Bearer credentials for ledger calls.
//!
//! The ledger client never interprets a credential; it only attaches
//! whatever the provider returns.

use crate::error::CredentialError;

pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, e.g. passed on the command line.
#[derive(Debug, Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// No credential at all. Every authenticated call fails as unauthorized.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Token kept in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredential {
    key: String,
}

impl KeyringCredential {
    pub const DEFAULT_KEY: &'static str = "ledger_token";

    pub fn new() -> Self {
        Self {
            key: Self::DEFAULT_KEY.to_string(),
        }
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn load(&self) -> Result<Option<String>, CredentialError> {
        Ok(keyring_store::get(&self.key)?)
    }

    pub fn store(&self, token: &str) -> Result<(), CredentialError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(keyring_store::set(&self.key, token)?)
    }

    pub fn clear(&self) -> Result<(), CredentialError> {
        Ok(keyring_store::delete(&self.key)?)
    }
}

impl Default for KeyringCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for KeyringCredential {
    fn bearer_token(&self) -> Option<String> {
        match self.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("could not read ledger token from keyring: {e}");
                None
            }
        }
    }
}

/// Thin wrapper around the OS keyring for credential storage.
mod keyring_store {
    const SERVICE: &str = "arise";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
