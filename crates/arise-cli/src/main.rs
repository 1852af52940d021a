use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "arise", version, about = "Arise training system CLI")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available challenges
    Quests {
        /// Catalog section
        #[arg(value_enum, default_value = "daily")]
        section: commands::SectionArg,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a challenge interactively
    Train {
        /// Catalog section
        #[arg(value_enum)]
        section: commands::SectionArg,
        /// Challenge id (defaults to the first one not yet completed)
        id: Option<String>,
    },
    /// Show hunter progression
    Profile {
        #[command(subcommand)]
        action: Option<commands::profile::ProfileAction>,
        /// Print as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Browse and buy shop items
    Shop {
        #[command(subcommand)]
        action: commands::shop::ShopAction,
    },
    /// Ledger credential management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Quests { section, json } => commands::quests::run(section, json).await,
        Commands::Train { section, id } => commands::train::run(section, id).await,
        Commands::Profile { action, json } => commands::profile::run(action, json).await,
        Commands::Shop { action } => commands::shop::run(action).await,
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
