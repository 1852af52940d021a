//! Resolution payloads and their classification.
//!
//! The ledger answers `complete` with a loosely shaped JSON object whose
//! interesting parts are all optional. Classification turns it into a
//! [`ResolutionOutcome`] with explicit optional sub-records, rejecting any
//! payload that breaks local invariants instead of guessing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::challenge::{Rank, Stat};
use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Divine,
}

impl std::str::FromStr for Rarity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            "legendary" => Ok(Rarity::Legendary),
            "mythic" => Ok(Rarity::Mythic),
            "divine" => Ok(Rarity::Divine),
            other => Err(LedgerError::Malformed(format!("unknown rarity '{other}'"))),
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
            Rarity::Divine => "divine",
        };
        f.write_str(s)
    }
}

/// A shadow awarded by a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collectible {
    pub name: String,
    pub rarity: Rarity,
    pub stat_bonus: BTreeMap<Stat, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub reward_gold: u64,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub new_level: u32,
    pub new_rank: Option<Rank>,
    pub stat_points_gained: u32,
}

/// What a successful completion granted. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub exp_gained: u64,
    pub gold_gained: u64,
    pub level_up: Option<LevelUp>,
    pub collectible: Option<Collectible>,
    /// In the order the ledger unlocked them.
    pub achievements: Vec<Achievement>,
    pub new_exp: Option<u64>,
    pub exp_to_next: Option<u64>,
    pub reps_gained: u64,
}

/// The ledger's answer to a surrender: the punishment it assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunishmentNotice {
    pub message: String,
    pub punishment: Option<String>,
    pub exp_lost: u64,
    pub streak_protected: bool,
}

// ── Wire payloads ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ShadowPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub stat_bonus: BTreeMap<Stat, i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AchievementPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reward_gold: i64,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletePayload {
    pub exp_gained: i64,
    pub gold_gained: i64,
    #[serde(default)]
    pub level_up: bool,
    #[serde(default)]
    pub new_level: Option<i64>,
    #[serde(default)]
    pub new_exp: Option<i64>,
    #[serde(default)]
    pub exp_to_next: Option<i64>,
    #[serde(default)]
    pub new_rank: Option<Rank>,
    #[serde(default)]
    pub stat_points_gained: Option<i64>,
    #[serde(default)]
    pub shadow_earned: Option<ShadowPayload>,
    #[serde(default)]
    pub achievements_unlocked: Vec<AchievementPayload>,
    #[serde(default)]
    pub reps_gained: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailPayload {
    pub message: String,
    #[serde(default)]
    pub punishment_assigned: Option<String>,
    #[serde(default)]
    pub exp_lost: Option<i64>,
    #[serde(default)]
    pub streak_protected: bool,
}

fn non_negative(field: &str, value: i64) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::Malformed(format!("{field} is negative ({value})")))
}

fn non_negative_u32(field: &str, value: i64) -> Result<u32, LedgerError> {
    u32::try_from(value)
        .map_err(|_| LedgerError::Malformed(format!("{field} out of range ({value})")))
}

impl TryFrom<ShadowPayload> for Collectible {
    type Error = LedgerError;

    fn try_from(p: ShadowPayload) -> Result<Self, Self::Error> {
        if p.name.trim().is_empty() {
            return Err(LedgerError::Malformed("collectible without a name".into()));
        }
        let rarity = p.rarity.parse()?;
        let stat_bonus = p
            .stat_bonus
            .into_iter()
            .map(|(stat, bonus)| Ok((stat, non_negative_u32("stat_bonus", bonus)?)))
            .collect::<Result<_, LedgerError>>()?;
        Ok(Self {
            name: p.name,
            rarity,
            stat_bonus,
        })
    }
}

impl TryFrom<AchievementPayload> for Achievement {
    type Error = LedgerError;

    fn try_from(p: AchievementPayload) -> Result<Self, Self::Error> {
        if p.id.trim().is_empty() {
            return Err(LedgerError::Malformed("achievement without an id".into()));
        }
        Ok(Self {
            id: p.id,
            name: p.name,
            description: p.description,
            reward_gold: non_negative("reward_gold", p.reward_gold)?,
            category: p.category,
        })
    }
}

impl TryFrom<CompletePayload> for ResolutionOutcome {
    type Error = LedgerError;

    fn try_from(p: CompletePayload) -> Result<Self, Self::Error> {
        let level_up = match (p.level_up, p.new_level) {
            (true, Some(level)) if level > 0 => Some(LevelUp {
                new_level: non_negative_u32("new_level", level)?,
                new_rank: p.new_rank,
                stat_points_gained: p
                    .stat_points_gained
                    .map(|n| non_negative_u32("stat_points_gained", n))
                    .transpose()?
                    .unwrap_or(0),
            }),
            (true, _) => {
                return Err(LedgerError::Malformed(
                    "level_up set without a valid new_level".into(),
                ))
            }
            (false, _) => None,
        };

        Ok(Self {
            exp_gained: non_negative("exp_gained", p.exp_gained)?,
            gold_gained: non_negative("gold_gained", p.gold_gained)?,
            level_up,
            collectible: p.shadow_earned.map(Collectible::try_from).transpose()?,
            achievements: p
                .achievements_unlocked
                .into_iter()
                .map(Achievement::try_from)
                .collect::<Result<_, _>>()?,
            new_exp: p.new_exp.map(|n| non_negative("new_exp", n)).transpose()?,
            exp_to_next: p
                .exp_to_next
                .map(|n| non_negative("exp_to_next", n))
                .transpose()?,
            reps_gained: p
                .reps_gained
                .map(|n| non_negative("reps_gained", n))
                .transpose()?
                .unwrap_or(0),
        })
    }
}

impl From<FailPayload> for PunishmentNotice {
    fn from(p: FailPayload) -> Self {
        Self {
            message: p.message,
            punishment: p.punishment_assigned,
            // A negative penalty is meaningless; treat it as none.
            exp_lost: p.exp_lost.and_then(|n| u64::try_from(n).ok()).unwrap_or(0),
            streak_protected: p.streak_protected,
        }
    }
}

/// Decode and classify a `quests/complete` reply body.
pub fn classify_completion(body: &str) -> Result<ResolutionOutcome, LedgerError> {
    let payload: CompletePayload =
        serde_json::from_str(body).map_err(|e| LedgerError::Malformed(e.to_string()))?;
    ResolutionOutcome::try_from(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOSS_REPLY: &str = r#"{
        "success": true,
        "exp_gained": 500,
        "gold_gained": 300,
        "new_level": 21,
        "new_exp": 40,
        "exp_to_next": 9000,
        "new_rank": "C",
        "stat_points_gained": 3,
        "level_up": true,
        "achievements_unlocked": [
            {"id": "boss_first", "name": "Cazador de Jefes", "description": "Derrota a tu primer jefe", "reward_gold": 500, "category": "boss"},
            {"id": "boss_igris", "name": "Victoria sobre Igris", "description": "Derrota a Igris", "reward_gold": 1000, "category": "boss"}
        ],
        "shadow_earned": {"name": "Igris", "rarity": "epic", "stat_bonus": {"strength": 10, "endurance": 10}},
        "reps_gained": 420
    }"#;

    #[test]
    fn classifies_full_boss_reply() {
        let outcome = classify_completion(BOSS_REPLY).unwrap();
        assert_eq!(outcome.exp_gained, 500);
        assert_eq!(outcome.gold_gained, 300);
        assert_eq!(
            outcome.level_up,
            Some(LevelUp {
                new_level: 21,
                new_rank: Some(Rank::C),
                stat_points_gained: 3
            })
        );
        let shadow = outcome.collectible.unwrap();
        assert_eq!(shadow.rarity, Rarity::Epic);
        assert_eq!(shadow.stat_bonus.get(&Stat::Strength), Some(&10));
        let ids: Vec<_> = outcome.achievements.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["boss_first", "boss_igris"]);
        assert_eq!(outcome.reps_gained, 420);
    }

    #[test]
    fn plain_reply_has_no_optional_effects() {
        let outcome = classify_completion(
            r#"{"exp_gained": 29, "gold_gained": 12, "level_up": false, "new_level": 3,
                "shadow_earned": null, "achievements_unlocked": []}"#,
        )
        .unwrap();
        assert!(outcome.level_up.is_none());
        assert!(outcome.collectible.is_none());
        assert!(outcome.achievements.is_empty());
    }

    #[test]
    fn level_up_without_level_is_malformed() {
        let err = classify_completion(r#"{"exp_gained": 1, "gold_gained": 1, "level_up": true}"#)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Malformed(_)));
    }

    #[test]
    fn negative_amounts_are_malformed() {
        let err = classify_completion(r#"{"exp_gained": -5, "gold_gained": 1}"#).unwrap_err();
        assert!(matches!(err, LedgerError::Malformed(m) if m.contains("exp_gained")));
    }

    #[test]
    fn unknown_rarity_is_malformed() {
        let err = classify_completion(
            r#"{"exp_gained": 1, "gold_gained": 1,
                "shadow_earned": {"name": "Kaisel", "rarity": "shiny", "stat_bonus": {}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Malformed(m) if m.contains("shiny")));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            classify_completion("<html>bad gateway</html>"),
            Err(LedgerError::Malformed(_))
        ));
    }

    #[test]
    fn fail_reply_becomes_notice() {
        let payload: FailPayload = serde_json::from_str(
            r#"{"success": true, "exp_lost": 15, "punishment_assigned": "Castigo: Velocidad",
                "streak_protected": false, "message": "[SISTEMA] Has fallado la misión."}"#,
        )
        .unwrap();
        let notice = PunishmentNotice::from(payload);
        assert_eq!(notice.punishment.as_deref(), Some("Castigo: Velocidad"));
        assert_eq!(notice.exp_lost, 15);
        assert!(!notice.streak_protected);
    }
}
