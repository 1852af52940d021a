//! Sequenced presentation of a resolution outcome.
//!
//! Reveals are shown one at a time in a fixed order:
//!
//! 1. Experience and gold toast
//! 2. Level-up modal, dismissed by the user or after a timeout
//! 3. Collectible modal, dismissed by the user only
//! 4. One toast per unlocked achievement, in ledger order
//!
//! A snapshot refresh is spawned right after the first toast and runs
//! alongside the rest of the sequence. Reveals themselves render from the
//! outcome only, never from the refreshed snapshot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::task::JoinHandle;

use super::snapshot::{SnapshotCache, UserProgressionSnapshot};
use crate::error::LedgerError;
use crate::ledger::{Achievement, Collectible, Ledger, LevelUp, ResolutionOutcome};
use crate::storage::NotificationsConfig;

/// Default time the level-up modal stays up.
pub const LEVEL_UP_REVEAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reveal", rename_all = "snake_case")]
pub enum Reveal {
    Rewards { exp: u64, gold: u64 },
    LevelUp(LevelUp),
    Collectible(Collectible),
    Achievement(Achievement),
}

impl Reveal {
    /// One-line description suitable for a toast or a modal title.
    pub fn headline(&self) -> String {
        match self {
            Reveal::Rewards { exp, gold } => format!("+{exp} EXP  +{gold} gold"),
            Reveal::LevelUp(up) => match up.new_rank {
                Some(rank) => format!("LEVEL UP! Level {} (rank {rank})", up.new_level),
                None => format!("LEVEL UP! Level {}", up.new_level),
            },
            Reveal::Collectible(c) => format!("Shadow extracted: {} [{}]", c.name, c.rarity),
            Reveal::Achievement(a) => format!("Achievement unlocked: {}", a.name),
        }
    }
}

/// How a reveal occupies the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Non-blocking; the sequence moves on immediately.
    Toast,
    /// Blocks the sequence until dismissed, or until `auto_dismiss` elapses.
    Modal { auto_dismiss: Option<Duration> },
}

/// How a reveal left the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dismissal {
    Toast,
    User,
    Timeout,
}

/// Presentation surface.
#[async_trait]
pub trait Presenter: Send + Sync {
    fn toast(&self, reveal: &Reveal);

    /// Show a modal and return once the user dismisses it.
    async fn modal(&self, reveal: &Reveal);

    /// Called when a modal is closed by timeout rather than by the user.
    fn dismiss(&self, _reveal: &Reveal) {}
}

/// Reveal order for an outcome.
pub fn plan(outcome: &ResolutionOutcome) -> Vec<Reveal> {
    let mut reveals = vec![Reveal::Rewards {
        exp: outcome.exp_gained,
        gold: outcome.gold_gained,
    }];
    if let Some(up) = &outcome.level_up {
        reveals.push(Reveal::LevelUp(*up));
    }
    if let Some(collectible) = &outcome.collectible {
        reveals.push(Reveal::Collectible(collectible.clone()));
    }
    reveals.extend(outcome.achievements.iter().cloned().map(Reveal::Achievement));
    reveals
}

#[derive(Debug)]
pub struct PresentationReport {
    pub shown: Vec<(Reveal, Dismissal)>,
    /// Background snapshot refresh, if one was started.
    pub refresh: Option<JoinHandle<Result<UserProgressionSnapshot, LedgerError>>>,
}

pub struct ProgressionNotifier {
    presenter: Arc<dyn Presenter>,
    ledger: Arc<dyn Ledger>,
    cache: SnapshotCache,
    level_up_reveal: Duration,
    refresh: bool,
}

impl ProgressionNotifier {
    pub fn new(
        presenter: Arc<dyn Presenter>,
        ledger: Arc<dyn Ledger>,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            presenter,
            ledger,
            cache,
            level_up_reveal: LEVEL_UP_REVEAL,
            refresh: true,
        }
    }

    pub fn from_config(
        config: &NotificationsConfig,
        presenter: Arc<dyn Presenter>,
        ledger: Arc<dyn Ledger>,
        cache: SnapshotCache,
    ) -> Self {
        Self::new(presenter, ledger, cache)
            .with_level_up_reveal(config.level_up_reveal())
            .with_refresh(config.refresh_after_resolution)
    }

    pub fn with_level_up_reveal(mut self, duration: Duration) -> Self {
        self.level_up_reveal = duration;
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn presentation(&self, reveal: &Reveal) -> Presentation {
        match reveal {
            Reveal::Rewards { .. } | Reveal::Achievement(_) => Presentation::Toast,
            Reveal::LevelUp(_) => Presentation::Modal {
                auto_dismiss: Some(self.level_up_reveal),
            },
            Reveal::Collectible(_) => Presentation::Modal { auto_dismiss: None },
        }
    }

    /// Run the whole reveal sequence for `outcome`.
    pub async fn present(&self, outcome: &ResolutionOutcome) -> PresentationReport {
        let mut report = PresentationReport {
            shown: Vec::new(),
            refresh: None,
        };

        for reveal in plan(outcome) {
            let dismissal = match self.presentation(&reveal) {
                Presentation::Toast => {
                    self.presenter.toast(&reveal);
                    Dismissal::Toast
                }
                Presentation::Modal {
                    auto_dismiss: Some(limit),
                } => match tokio::time::timeout(limit, self.presenter.modal(&reveal)).await {
                    Ok(()) => Dismissal::User,
                    Err(_) => {
                        self.presenter.dismiss(&reveal);
                        Dismissal::Timeout
                    }
                },
                Presentation::Modal { auto_dismiss: None } => {
                    self.presenter.modal(&reveal).await;
                    Dismissal::User
                }
            };
            tracing::debug!(?dismissal, "{}", reveal.headline());

            let first = report.shown.is_empty();
            report.shown.push((reveal, dismissal));

            if first && self.refresh {
                report.refresh = Some(self.cache.spawn_refresh(Arc::clone(&self.ledger)));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Rank, Stat};
    use crate::ledger::{PunishmentNotice, Rarity};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Records what was shown. Level-up modals wait `level_up_wait` for the
    /// user (forever when `None`); other modals are dismissed at once.
    struct Recorder {
        log: Mutex<Vec<String>>,
        level_up_wait: Option<Duration>,
    }

    impl Recorder {
        fn new(level_up_wait: Option<Duration>) -> Arc<Self> {
            Arc::new(Self {
                log: Mutex::new(Vec::new()),
                level_up_wait,
            })
        }

        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    fn tag(reveal: &Reveal) -> String {
        match reveal {
            Reveal::Rewards { .. } => "rewards".into(),
            Reveal::LevelUp(_) => "level_up".into(),
            Reveal::Collectible(c) => format!("collectible:{}", c.name),
            Reveal::Achievement(a) => format!("achievement:{}", a.id),
        }
    }

    #[async_trait]
    impl Presenter for Recorder {
        fn toast(&self, reveal: &Reveal) {
            self.log.lock().unwrap().push(format!("toast {}", tag(reveal)));
        }

        async fn modal(&self, reveal: &Reveal) {
            self.log.lock().unwrap().push(format!("modal {}", tag(reveal)));
            if let Reveal::LevelUp(_) = reveal {
                match self.level_up_wait {
                    Some(wait) => tokio::time::sleep(wait).await,
                    None => std::future::pending::<()>().await,
                }
            }
        }

        fn dismiss(&self, reveal: &Reveal) {
            self.log.lock().unwrap().push(format!("dismiss {}", tag(reveal)));
        }
    }

    struct Profile(u32);

    #[async_trait]
    impl Ledger for Profile {
        async fn start_training(&self, _id: &str) -> Result<(), LedgerError> {
            Ok(())
        }
        async fn complete(&self, _id: &str) -> Result<ResolutionOutcome, LedgerError> {
            Err(LedgerError::transport("unused"))
        }
        async fn fail(&self, _id: &str) -> Result<PunishmentNotice, LedgerError> {
            Err(LedgerError::transport("unused"))
        }
        async fn profile(&self) -> Result<UserProgressionSnapshot, LedgerError> {
            Ok(UserProgressionSnapshot {
                level: self.0,
                ..Default::default()
            })
        }
    }

    fn achievement(id: &str) -> Achievement {
        Achievement {
            id: id.into(),
            name: id.to_uppercase(),
            description: String::new(),
            reward_gold: 100,
            category: None,
        }
    }

    fn boss_outcome() -> ResolutionOutcome {
        ResolutionOutcome {
            exp_gained: 500,
            gold_gained: 300,
            level_up: Some(LevelUp {
                new_level: 21,
                new_rank: Some(Rank::C),
                stat_points_gained: 3,
            }),
            collectible: Some(Collectible {
                name: "Igris".into(),
                rarity: Rarity::Epic,
                stat_bonus: BTreeMap::from([(Stat::Strength, 10)]),
            }),
            achievements: vec![
                achievement("boss_first"),
                achievement("level_20"),
                achievement("boss_igris"),
            ],
            new_exp: None,
            exp_to_next: None,
            reps_gained: 0,
        }
    }

    fn notifier(presenter: Arc<Recorder>) -> ProgressionNotifier {
        ProgressionNotifier::new(presenter, Arc::new(Profile(21)), SnapshotCache::new())
    }

    #[test]
    fn plan_orders_reveals() {
        let tags: Vec<String> = plan(&boss_outcome()).iter().map(tag).collect();
        assert_eq!(
            tags,
            [
                "rewards",
                "level_up",
                "collectible:Igris",
                "achievement:boss_first",
                "achievement:level_20",
                "achievement:boss_igris",
            ]
        );
    }

    #[test]
    fn plain_outcome_is_a_single_toast() {
        let outcome = ResolutionOutcome {
            exp_gained: 29,
            gold_gained: 12,
            ..Default::default()
        };
        assert_eq!(plan(&outcome), [Reveal::Rewards { exp: 29, gold: 12 }]);
    }

    #[tokio::test(start_paused = true)]
    async fn collectible_never_precedes_rewards_and_achievements_keep_order() {
        let recorder = Recorder::new(Some(Duration::from_millis(200)));
        let report = notifier(Arc::clone(&recorder)).present(&boss_outcome()).await;

        assert_eq!(
            recorder.log(),
            [
                "toast rewards",
                "modal level_up",
                "modal collectible:Igris",
                "toast achievement:boss_first",
                "toast achievement:level_20",
                "toast achievement:boss_igris",
            ]
        );
        assert_eq!(report.shown[1].1, Dismissal::User);
        assert_eq!(report.shown[2].1, Dismissal::User);
    }

    #[tokio::test(start_paused = true)]
    async fn level_up_modal_auto_dismisses_after_three_seconds() {
        let recorder = Recorder::new(None);
        let started = tokio::time::Instant::now();
        let report = notifier(Arc::clone(&recorder)).present(&boss_outcome()).await;

        assert_eq!(started.elapsed(), LEVEL_UP_REVEAL);
        assert_eq!(report.shown[1], (plan(&boss_outcome())[1].clone(), Dismissal::Timeout));
        assert!(recorder.log().contains(&"dismiss level_up".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn user_can_dismiss_level_up_early() {
        let recorder = Recorder::new(Some(Duration::from_millis(500)));
        let started = tokio::time::Instant::now();
        notifier(Arc::clone(&recorder)).present(&boss_outcome()).await;

        assert_eq!(started.elapsed(), Duration::from_millis(500));
        assert!(!recorder.log().iter().any(|l| l.starts_with("dismiss")));
    }

    #[tokio::test]
    async fn refresh_runs_after_first_toast() {
        let cache = SnapshotCache::new();
        let notifier = ProgressionNotifier::new(
            Recorder::new(Some(Duration::ZERO)),
            Arc::new(Profile(7)),
            cache.clone(),
        );
        let report = notifier.present(&boss_outcome()).await;

        let refreshed = report.refresh.expect("refresh spawned").await.unwrap().unwrap();
        assert_eq!(refreshed.level, 7);
        assert_eq!(cache.get().map(|s| s.level), Some(7));
    }

    #[tokio::test]
    async fn refresh_can_be_disabled() {
        let notifier = notifier(Recorder::new(Some(Duration::ZERO))).with_refresh(false);
        let report = notifier.present(&ResolutionOutcome::default()).await;
        assert!(report.refresh.is_none());
        assert_eq!(report.shown.len(), 1);
    }
}
