//! Catalog reads: the ledger's quest listings and their conversion into
//! [`Challenge`] values ready for activation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Challenge, ChallengeKind, ExerciseRequirement, Rank, RewardSchedule, Stat};

/// Which listing a challenge is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSection {
    Daily,
    Dungeons,
    Bosses,
    Punishments,
    Missions,
}

impl CatalogSection {
    pub const ALL: [CatalogSection; 5] = [
        CatalogSection::Daily,
        CatalogSection::Dungeons,
        CatalogSection::Bosses,
        CatalogSection::Punishments,
        CatalogSection::Missions,
    ];

    /// Path relative to the ledger base URL.
    pub fn path(self) -> &'static str {
        match self {
            CatalogSection::Daily => "quests/daily",
            CatalogSection::Dungeons => "quests/special",
            CatalogSection::Bosses => "quests/weekly-boss",
            CatalogSection::Punishments => "quests/punishment",
            CatalogSection::Missions => "quests/special-missions",
        }
    }

    pub fn kind(self) -> ChallengeKind {
        match self {
            CatalogSection::Daily => ChallengeKind::Daily,
            CatalogSection::Dungeons => ChallengeKind::Dungeon,
            CatalogSection::Bosses => ChallengeKind::Boss,
            CatalogSection::Punishments => ChallengeKind::Punishment,
            CatalogSection::Missions => ChallengeKind::Mission,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExercisePayload {
    pub name: String,
    pub reps: u32,
    pub unit: String,
    #[serde(default)]
    pub stat: Option<Stat>,
}

/// Quest as listed by the daily, dungeon, boss and punishment endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<ExercisePayload>,
    #[serde(default)]
    pub exp_reward: u64,
    #[serde(default)]
    pub gold_reward: u64,
    #[serde(default)]
    pub difficulty: Option<Rank>,
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shadow_reward: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub already_defeated: bool,
}

impl QuestPayload {
    pub fn into_challenge(self, kind: ChallengeKind) -> Challenge {
        Challenge {
            id: self.id,
            name: self.name,
            description: self.description,
            kind,
            difficulty: self.difficulty.unwrap_or_default(),
            exercises: self
                .exercises
                .into_iter()
                .map(|ex| ExerciseRequirement {
                    name: ex.name,
                    reps: ex.reps,
                    unit: ex.unit,
                    stat: ex.stat,
                })
                .collect(),
            rewards: RewardSchedule {
                exp: self.exp_reward,
                gold: self.gold_reward,
            },
            deadline: self.deadline,
            collectible_reward: self.shadow_reward,
            min_level: self.min_level.unwrap_or(0),
            completed: self.is_completed || self.already_defeated,
        }
    }
}

/// Special mission: completed on a progression requirement rather than a
/// workout, so it carries progress instead of exercises.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exp_reward: u64,
    #[serde(default)]
    pub gold_reward: u64,
    #[serde(default)]
    pub shadow_reward: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub can_complete: bool,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub target: u64,
    #[serde(default)]
    pub min_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialMission {
    pub challenge: Challenge,
    pub can_complete: bool,
    pub progress: u64,
    pub target: u64,
}

impl From<MissionPayload> for SpecialMission {
    fn from(p: MissionPayload) -> Self {
        let mut challenge = Challenge::new(p.id, p.name, ChallengeKind::Mission)
            .with_rewards(p.exp_reward, p.gold_reward);
        challenge.description = p.description;
        challenge.collectible_reward = p.shadow_reward;
        challenge.min_level = p.min_level.unwrap_or(0);
        challenge.completed = p.is_completed;
        Self {
            challenge,
            can_complete: p.can_complete,
            progress: p.progress,
            target: p.target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_quest_keeps_deadline_and_exercises() {
        let json = serde_json::json!({
            "id": "4b1c",
            "date": "2025-03-01",
            "name": "Entrenamiento Diario del Sistema",
            "quest_type": "daily",
            "exercises": [
                {"name": "Flexiones", "reps": 12, "unit": "repeticiones", "stat": "strength", "completed": false},
                {"name": "Correr", "reps": 1, "unit": "km", "stat": "agility", "completed": false}
            ],
            "exp_reward": 29,
            "gold_reward": 12,
            "time_limit_hours": 24,
            "difficulty": "E",
            "is_completed": false,
            "deadline": "2025-03-02T08:00:00.000000+00:00"
        });
        let payload: QuestPayload = serde_json::from_value(json).unwrap();
        let challenge = payload.into_challenge(ChallengeKind::Daily);

        assert_eq!(challenge.kind, ChallengeKind::Daily);
        assert_eq!(challenge.exercises.len(), 2);
        assert_eq!(challenge.exercises[0].stat, Some(Stat::Strength));
        assert_eq!(challenge.rewards, RewardSchedule { exp: 29, gold: 12 });
        assert!(challenge.has_server_deadline());
        assert!(!challenge.requires_checklist());
    }

    #[test]
    fn defeated_boss_reads_as_completed() {
        let json = serde_json::json!({
            "id": "boss_igris",
            "name": "Igris",
            "quest_type": "boss",
            "exercises": [{"name": "Flexiones", "reps": 60, "unit": "repeticiones"}],
            "exp_reward": 500,
            "gold_reward": 300,
            "difficulty": "C",
            "min_level": 20,
            "shadow_reward": "shadow_igris",
            "already_defeated": true
        });
        let payload: QuestPayload = serde_json::from_value(json).unwrap();
        let boss = payload.into_challenge(ChallengeKind::Boss);
        assert!(boss.completed);
        assert_eq!(boss.difficulty, Rank::C);
        assert_eq!(boss.collectible_reward.as_deref(), Some("shadow_igris"));
        assert!(boss.requires_checklist());
        assert!(boss.deadline.is_none());
    }

    #[test]
    fn mission_carries_progress() {
        let json = serde_json::json!({
            "id": "mission_streak_7",
            "name": "Semana de Hierro",
            "exp_reward": 200,
            "gold_reward": 100,
            "shadow_reward": null,
            "is_completed": false,
            "can_complete": true,
            "progress": 7,
            "target": 7,
            "min_level": 1
        });
        let payload: MissionPayload = serde_json::from_value(json).unwrap();
        let mission = SpecialMission::from(payload);
        assert!(mission.can_complete);
        assert_eq!(mission.challenge.kind, ChallengeKind::Mission);
        assert!(mission.challenge.exercises.is_empty());
    }
}
