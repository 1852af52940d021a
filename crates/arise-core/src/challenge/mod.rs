mod catalog;
mod checklist;
mod model;

pub use catalog::{CatalogSection, ExercisePayload, MissionPayload, QuestPayload, SpecialMission};
pub use checklist::ExerciseChecklist;
pub use model::{
    Challenge, ChallengeKind, ExerciseRequirement, Rank, RewardSchedule, Stat,
};
