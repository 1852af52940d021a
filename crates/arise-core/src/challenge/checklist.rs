use serde::{Deserialize, Serialize};

use super::model::Challenge;

/// Per-exercise "satisfied" flags for one attempt.
///
/// Always exactly as long as the challenge's requirement list, all false on
/// creation. The controller only exposes it for mutation while Active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseChecklist {
    satisfied: Vec<bool>,
}

impl ExerciseChecklist {
    pub fn new(len: usize) -> Self {
        Self {
            satisfied: vec![false; len],
        }
    }

    pub fn for_challenge(challenge: &Challenge) -> Self {
        Self::new(challenge.exercises.len())
    }

    pub fn len(&self) -> usize {
        self.satisfied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satisfied.is_empty()
    }

    pub fn is_satisfied(&self, index: usize) -> Option<bool> {
        self.satisfied.get(index).copied()
    }

    /// Flip one entry, returning its new value. Out of range is a no-op.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let slot = self.satisfied.get_mut(index)?;
        *slot = !*slot;
        Some(*slot)
    }

    pub fn all_satisfied(&self) -> bool {
        self.satisfied.iter().all(|s| *s)
    }

    pub fn satisfied_count(&self) -> usize {
        self.satisfied.iter().filter(|s| **s).count()
    }

    pub fn flags(&self) -> &[bool] {
        &self.satisfied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{ChallengeKind, ExerciseRequirement};

    fn dungeon() -> Challenge {
        Challenge::new("dungeon_cueva_goblins", "Goblin Cave", ChallengeKind::Dungeon)
            .with_exercise(ExerciseRequirement::new("Push-ups", 12, "reps"))
            .with_exercise(ExerciseRequirement::new("Squats", 12, "reps"))
            .with_exercise(ExerciseRequirement::new("Run", 1, "km"))
    }

    #[test]
    fn matches_requirement_count_and_starts_unsatisfied() {
        let checklist = ExerciseChecklist::for_challenge(&dungeon());
        assert_eq!(checklist.len(), 3);
        assert_eq!(checklist.flags(), &[false, false, false]);
        assert!(!checklist.all_satisfied());
    }

    #[test]
    fn two_of_three_is_not_enough() {
        let mut checklist = ExerciseChecklist::for_challenge(&dungeon());
        checklist.toggle(0);
        checklist.toggle(2);
        assert_eq!(checklist.satisfied_count(), 2);
        assert!(!checklist.all_satisfied());
        checklist.toggle(1);
        assert!(checklist.all_satisfied());
    }

    #[test]
    fn toggle_flips_back_and_ignores_out_of_range() {
        let mut checklist = ExerciseChecklist::new(2);
        assert_eq!(checklist.toggle(1), Some(true));
        assert_eq!(checklist.toggle(1), Some(false));
        assert_eq!(checklist.toggle(7), None);
        assert_eq!(checklist.flags(), &[false, false]);
    }
}
