//! Interactive challenge session.
//!
//! Reads commands from stdin while the display tick redraws the status
//! line. Resolution requests run on a spawned task so ticks keep flowing
//! until the ledger answers.

use std::io::{BufRead, Write};
use std::sync::Arc;

use arise_core::controller::{ChallengeState, ResolutionReply};
use arise_core::progression::Reveal;
use arise_core::timer::format_hms;
use arise_core::{
    CatalogSection, Challenge, ChallengeController, Config, Event, IntervalTicks, Presenter,
    ProgressionNotifier, SnapshotCache, StateKind,
};
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{ledger_client, SectionArg};

const HELP: &str = "commands: pause | resume | check N | complete | fail | status | quit";

/// Terminal presentation of reward reveals. Modals wait for Enter.
struct TerminalPresenter {
    input: Mutex<mpsc::UnboundedReceiver<String>>,
}

#[async_trait]
impl Presenter for TerminalPresenter {
    fn toast(&self, reveal: &Reveal) {
        println!("  {}", reveal.headline());
    }

    async fn modal(&self, reveal: &Reveal) {
        println!();
        println!("  *** {} ***", reveal.headline());
        if let Reveal::Collectible(c) = reveal {
            for (stat, bonus) in &c.stat_bonus {
                println!("      {stat:?} +{bonus}");
            }
        }
        println!("  (press Enter)");
        let _ = self.input.lock().await.recv().await;
    }

    fn dismiss(&self, _reveal: &Reveal) {
        println!();
    }
}

/// Blocking stdin reader on its own thread, so an unread line never holds
/// up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn pick(challenges: Vec<Challenge>, id: Option<&str>) -> Option<Challenge> {
    match id {
        Some(id) => challenges.into_iter().find(|c| c.id == id),
        None => {
            let mut open = challenges.iter().position(|c| !c.completed);
            if open.is_none() && !challenges.is_empty() {
                open = Some(0);
            }
            open.and_then(|i| challenges.into_iter().nth(i))
        }
    }
}

/// With stdin closed nothing can drive the attempt any further, so the loop
/// ends as soon as no ledger reply is outstanding.
fn input_exhausted(input_open: bool, kind: StateKind) -> bool {
    !input_open && kind != StateKind::Resolving
}

fn status_line(ctl: &ChallengeController) -> String {
    let Event::StateSnapshot {
        state,
        elapsed_ms,
        remaining,
        checklist,
        ..
    } = ctl.snapshot()
    else {
        return String::new();
    };

    let mut line = format!("[{state:?}] {}", format_hms(elapsed_ms));
    if let Some(ms) = remaining.as_ms() {
        line.push_str(&format!("  time left {}", format_hms(ms)));
    }
    if !checklist.is_empty() {
        let marks: String = checklist.iter().map(|&s| if s { 'x' } else { '.' }).collect();
        line.push_str(&format!("  [{marks}]"));
    }
    line
}

fn print_checklist(ctl: &ChallengeController) {
    let flags = ctl
        .state()
        .attempt()
        .map(|a| a.checklist().flags().to_vec())
        .unwrap_or_default();
    for (i, ex) in ctl.challenge().exercises.iter().enumerate() {
        let mark = if flags.get(i).copied().unwrap_or(false) { "x" } else { " " };
        println!("  {}. [{mark}] {} {} {}", i + 1, ex.name, ex.reps, ex.unit);
    }
}

pub async fn run(
    section: SectionArg,
    id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let ledger = ledger_client(&config)?;
    let section = CatalogSection::from(section);

    let challenges = ledger.catalog(section).await?;
    let challenge = pick(challenges, id.as_deref())
        .ok_or_else(|| format!("no matching {} found", section.kind().label()))?;

    println!("{} ({})", challenge.name, challenge.kind.label());
    if !challenge.description.is_empty() {
        println!("  {}", challenge.description);
    }

    let (ticks, mut tick_rx) = IntervalTicks::channel();
    let mut ctl = ChallengeController::new(Arc::new(challenge), ledger.clone())
        .with_ticks(Arc::new(ticks), config.training.tick_period());

    if let Some(Event::ActivationRejected { message, .. }) = ctl.activate().await {
        return Err(format!("could not start: {message}").into());
    }
    print_checklist(&ctl);
    println!("{HELP}");

    let mut input = spawn_stdin_reader();
    let mut input_open = true;
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ResolutionReply>();

    loop {
        tokio::select! {
            Some(_) = tick_rx.recv() => {
                print!("\r{}   ", status_line(&ctl));
                let _ = std::io::stdout().flush();
            }
            Some(reply) = reply_rx.recv() => {
                println!();
                match ctl.settle(reply) {
                    Some(Event::ResolutionRejected { message, retryable, .. }) => {
                        println!("ledger refused: {message}");
                        if retryable {
                            println!("nothing was recorded; try again when the ledger is reachable");
                        }
                    }
                    Some(_) => break,
                    None => {}
                }
                if input_exhausted(input_open, ctl.kind()) {
                    break;
                }
            }
            line = input.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    if input_exhausted(input_open, ctl.kind()) {
                        break;
                    }
                    continue;
                };
                let mut words = line.split_whitespace();
                match (words.next(), words.next()) {
                    (Some("pause"), _) => {
                        if ctl.pause().is_none() {
                            println!("not running");
                        }
                    }
                    (Some("resume"), _) => {
                        if ctl.resume().is_none() {
                            println!("not paused");
                        }
                    }
                    (Some("check"), Some(n)) => {
                        let toggled = n
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| ctl.toggle(i));
                        match toggled {
                            Some(_) => print_checklist(&ctl),
                            None => println!("cannot check '{n}' now"),
                        }
                    }
                    (Some("complete"), _) => match ctl.begin_complete() {
                        Some((ticket, _)) => {
                            println!("reporting completion...");
                            let tx = reply_tx.clone();
                            tokio::spawn(async move {
                                let _ = tx.send(ticket.send().await);
                            });
                        }
                        None if ctl.kind() == StateKind::Active => {
                            let done = ctl
                                .state()
                                .attempt()
                                .map(|a| a.checklist().satisfied_count())
                                .unwrap_or(0);
                            println!(
                                "finish every exercise first ({done}/{})",
                                ctl.challenge().exercises.len()
                            );
                        }
                        None => println!("cannot complete now"),
                    },
                    (Some("fail"), _) => match ctl.begin_fail() {
                        Some((ticket, _)) => {
                            println!("surrendering...");
                            let tx = reply_tx.clone();
                            tokio::spawn(async move {
                                let _ = tx.send(ticket.send().await);
                            });
                        }
                        None => println!("cannot surrender now"),
                    },
                    (Some("status"), _) => println!("{}", status_line(&ctl)),
                    (Some("quit" | "exit"), _) => {
                        if ctl.kind() == StateKind::Resolving {
                            println!("waiting for the ledger to answer");
                        } else {
                            break;
                        }
                    }
                    (None, _) => {}
                    _ => println!("{HELP}"),
                }
            }
        }
    }

    if !matches!(ctl.kind(), StateKind::Resolved | StateKind::Failed) {
        ctl.reset();
        println!("attempt abandoned; nothing was reported to the ledger");
        return Ok(());
    }

    match ctl.state() {
        ChallengeState::Resolved { outcome, elapsed_ms } => {
            println!("Challenge cleared in {}", format_hms(*elapsed_ms));
            let presenter = Arc::new(TerminalPresenter {
                input: Mutex::new(input),
            });
            let cache = SnapshotCache::new();
            let notifier = ProgressionNotifier::from_config(
                &config.notifications,
                presenter,
                ledger,
                cache.clone(),
            );
            let report = notifier.present(outcome).await;
            if let Some(refresh) = report.refresh {
                if let Ok(Ok(snapshot)) = refresh.await {
                    println!(
                        "level {}  EXP {}/{}  gold {}",
                        snapshot.level, snapshot.experience, snapshot.exp_to_next, snapshot.gold
                    );
                }
            }
        }
        ChallengeState::Failed { notice, .. } => {
            println!("{}", notice.message);
            if let Some(p) = &notice.punishment {
                println!("  punishment assigned: {p}");
            }
            if notice.streak_protected {
                println!("  streak shield used; streak kept");
            }
            if notice.exp_lost > 0 {
                println!("  -{} EXP", notice.exp_lost);
            }
        }
        _ => {}
    }
    Ok(())
}
