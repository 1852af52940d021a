use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::DeadlineClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeKind {
    Daily,
    Dungeon,
    Boss,
    Punishment,
    Mission,
}

impl ChallengeKind {
    /// Multi-requirement kinds may only be completed once every exercise
    /// on the checklist is marked.
    pub fn requires_checklist(self) -> bool {
        matches!(self, ChallengeKind::Dungeon | ChallengeKind::Boss)
    }

    pub fn label(self) -> &'static str {
        match self {
            ChallengeKind::Daily => "daily quest",
            ChallengeKind::Dungeon => "dungeon",
            ChallengeKind::Boss => "boss fight",
            ChallengeKind::Punishment => "punishment",
            ChallengeKind::Mission => "special mission",
        }
    }
}

/// Hunter rank, also used as the difficulty tier of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Rank {
    #[default]
    E,
    D,
    C,
    B,
    A,
    S,
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Rank::E => "E",
            Rank::D => "D",
            Rank::C => "C",
            Rank::B => "B",
            Rank::A => "A",
            Rank::S => "S",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Strength,
    Endurance,
    Agility,
    Vitality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRequirement {
    pub name: String,
    pub reps: u32,
    pub unit: String,
    #[serde(default)]
    pub stat: Option<Stat>,
}

impl ExerciseRequirement {
    pub fn new(name: impl Into<String>, reps: u32, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reps,
            unit: unit.into(),
            stat: None,
        }
    }
}

/// Rewards the catalog advertises. The ledger decides what is actually
/// granted on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardSchedule {
    pub exp: u64,
    pub gold: u64,
}

/// One unit of exercise work. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: ChallengeKind,
    #[serde(default)]
    pub difficulty: Rank,
    #[serde(default)]
    pub exercises: Vec<ExerciseRequirement>,
    #[serde(default)]
    pub rewards: RewardSchedule,
    /// Server-tracked deadline, if any.
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Id of the collectible this challenge can award.
    #[serde(default)]
    pub collectible_reward: Option<String>,
    #[serde(default)]
    pub min_level: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Challenge {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ChallengeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            kind,
            difficulty: Rank::E,
            exercises: Vec::new(),
            rewards: RewardSchedule::default(),
            deadline: None,
            collectible_reward: None,
            min_level: 0,
            completed: false,
        }
    }

    pub fn with_exercise(mut self, exercise: ExerciseRequirement) -> Self {
        self.exercises.push(exercise);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_rewards(mut self, exp: u64, gold: u64) -> Self {
        self.rewards = RewardSchedule { exp, gold };
        self
    }

    /// Whether completion is gated on the exercise checklist.
    pub fn requires_checklist(&self) -> bool {
        self.kind.requires_checklist() && !self.exercises.is_empty()
    }

    /// Deadlines are tracked by the ledger, so activation must notify it.
    pub fn has_server_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline_clock(&self) -> DeadlineClock {
        DeadlineClock::new(self.deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_dungeons_and_bosses_are_gated() {
        assert!(ChallengeKind::Dungeon.requires_checklist());
        assert!(ChallengeKind::Boss.requires_checklist());
        assert!(!ChallengeKind::Daily.requires_checklist());
        assert!(!ChallengeKind::Punishment.requires_checklist());
        assert!(!ChallengeKind::Mission.requires_checklist());
    }

    #[test]
    fn gated_kind_without_exercises_is_ungated() {
        let boss = Challenge::new("boss_igris", "Igris", ChallengeKind::Boss);
        assert!(!boss.requires_checklist());
        let boss = boss.with_exercise(ExerciseRequirement::new("Push-ups", 40, "reps"));
        assert!(boss.requires_checklist());
    }

    #[test]
    fn ranks_are_ordered() {
        assert!(Rank::E < Rank::D);
        assert!(Rank::A < Rank::S);
        assert_eq!(Rank::B.to_string(), "B");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChallengeKind::Punishment).unwrap(),
            "\"punishment\""
        );
    }
}
