//! Hunter progression as currently recorded by the ledger.

use arise_core::challenge::Stat;
use arise_core::{Config, SnapshotCache, UserProgressionSnapshot};
use clap::{Subcommand, ValueEnum};

use super::ledger_client;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Spend unallocated stat points
    Upgrade {
        #[arg(value_enum)]
        stat: StatArg,
        /// Points to spend
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        points: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatArg {
    Strength,
    Endurance,
    Agility,
    Vitality,
}

impl From<StatArg> for Stat {
    fn from(arg: StatArg) -> Self {
        match arg {
            StatArg::Strength => Stat::Strength,
            StatArg::Endurance => Stat::Endurance,
            StatArg::Agility => Stat::Agility,
            StatArg::Vitality => Stat::Vitality,
        }
    }
}

pub async fn run(
    action: Option<ProfileAction>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = ledger_client(&config)?;
    let cache = SnapshotCache::new();

    let snapshot = match action {
        None => cache.refresh(ledger.as_ref()).await?,
        Some(ProfileAction::Upgrade { stat, points }) => {
            let (receipt, snapshot) = cache
                .apply(ledger.as_ref(), ledger.upgrade_stat(stat.into(), points))
                .await?;
            println!("{}", receipt.message);
            for a in &receipt.achievements {
                println!("  Achievement unlocked: {} (+{} gold)", a.name, a.reward_gold);
            }
            snapshot
        }
    };
    print_snapshot(&snapshot, json)
}

pub(crate) fn print_snapshot(
    snapshot: &UserProgressionSnapshot,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let name = if snapshot.hunter_name.is_empty() {
        "Hunter"
    } else {
        snapshot.hunter_name.as_str()
    };
    println!("{name}  rank {}  level {}", snapshot.rank, snapshot.level);
    if !snapshot.title.is_empty() {
        println!("  {}", snapshot.title);
    }
    println!(
        "  EXP {}/{}  gold {}  stat points {}",
        snapshot.experience, snapshot.exp_to_next, snapshot.gold, snapshot.stat_points
    );
    println!(
        "  streak {} (best {})  shields {}",
        snapshot.streak, snapshot.best_streak, snapshot.streak_shields
    );
    for (label, stat) in [
        ("STR", Stat::Strength),
        ("END", Stat::Endurance),
        ("AGI", Stat::Agility),
        ("VIT", Stat::Vitality),
    ] {
        let bonus = snapshot.shadow_bonuses.get(&stat).copied().unwrap_or(0);
        if bonus > 0 {
            println!("  {label} {} (+{bonus})", snapshot.effective_stat(stat));
        } else {
            println!("  {label} {}", snapshot.effective_stat(stat));
        }
    }
    if !snapshot.shadows.is_empty() {
        println!("  shadows: {}", snapshot.shadows.join(", "));
    }
    Ok(())
}
