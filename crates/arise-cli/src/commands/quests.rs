use arise_core::timer::format_hms;
use arise_core::{CatalogSection, Challenge, Clock, Config, SystemClock};

use super::{ledger_client, SectionArg};

pub async fn run(section: SectionArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = ledger_client(&config)?;
    let section = CatalogSection::from(section);

    if section == CatalogSection::Missions {
        let missions = ledger.special_missions().await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&missions)?);
            return Ok(());
        }
        for m in &missions {
            let status = if m.challenge.completed {
                "done"
            } else if m.can_complete {
                "ready"
            } else {
                "locked"
            };
            println!(
                "{:<24} {:<32} {}/{}  [{status}]",
                m.challenge.id, m.challenge.name, m.progress, m.target
            );
        }
        return Ok(());
    }

    let challenges = ledger.catalog(section).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&challenges)?);
        return Ok(());
    }
    if challenges.is_empty() {
        println!("no {} available", section.kind().label());
    }
    let now = SystemClock.now();
    for c in &challenges {
        print_challenge(c, now);
    }
    Ok(())
}

fn print_challenge(c: &Challenge, now: chrono::DateTime<chrono::Utc>) {
    let done = if c.completed { "  [done]" } else { "" };
    println!(
        "{:<24} {} (rank {})  +{} EXP +{} gold{done}",
        c.id, c.name, c.difficulty, c.rewards.exp, c.rewards.gold
    );
    if let Some(ms) = c.deadline_clock().remaining(now).as_ms() {
        println!("    time left {}", format_hms(ms));
    }
    for ex in &c.exercises {
        println!("    - {} {} {}", ex.name, ex.reps, ex.unit);
    }
}
