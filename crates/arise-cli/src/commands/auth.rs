use arise_core::KeyringCredential;
use clap::Subcommand;

use super::TOKEN_ENV;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a ledger token in the OS keyring
    Login {
        /// Bearer token issued by the ledger
        #[arg(long)]
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Check whether a token is available
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let keyring = KeyringCredential::new();
    match action {
        AuthAction::Login { token } => {
            keyring.store(&token)?;
            println!("ledger token stored");
        }
        AuthAction::Logout => {
            keyring.clear()?;
            println!("ledger token removed");
        }
        AuthAction::Status => {
            if std::env::var(TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty()) {
                println!("authenticated (from {TOKEN_ENV})");
            } else if keyring.load()?.is_some() {
                println!("authenticated");
            } else {
                println!("not authenticated");
            }
        }
    }
    Ok(())
}
