//! Achievements unlocked from workout, streak, level and goal milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Unlock rule
    pub earned: fn(&ProgressSnapshot) -> bool,
}

/// Figures the achievement rules are evaluated against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total_workouts: usize,
    pub streak_days: u32,
    pub level: u32,
    pub goals_completed: usize,
    pub penalties_total: usize,
    pub outstanding_debt: u64,
}

pub static ACHIEVEMENTS: [Achievement; 6] = [
    Achievement {
        id: "first_workout",
        name: "First Rep",
        description: "Log your first workout",
        earned: |s| s.total_workouts >= 1,
    },
    Achievement {
        id: "ten_workouts",
        name: "Regular",
        description: "Log 10 workouts",
        earned: |s| s.total_workouts >= 10,
    },
    Achievement {
        id: "week_streak",
        name: "Unbroken Week",
        description: "Train 7 days in a row",
        earned: |s| s.streak_days >= 7,
    },
    Achievement {
        id: "level_five",
        name: "Warrior",
        description: "Reach level 5",
        earned: |s| s.level >= 5,
    },
    Achievement {
        id: "goal_completed",
        name: "Mission Accomplished",
        description: "Complete a body-part goal",
        earned: |s| s.goals_completed >= 1,
    },
    Achievement {
        id: "debt_free",
        name: "Clean Slate",
        description: "Pay off every penalty after receiving one",
        earned: |s| s.penalties_total > 0 && s.outstanding_debt == 0,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Unlocked achievement ids with their unlock time
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UnlockedAchievements {
    pub unlocked: BTreeMap<String, DateTime<Utc>>,
}

impl UnlockedAchievements {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains_key(id)
    }

    /// Unlock everything the snapshot qualifies for; returns only the newly
    /// unlocked achievements. Already unlocked ones stay unlocked even if the
    /// snapshot no longer qualifies.
    pub fn evaluate(
        &mut self,
        snapshot: &ProgressSnapshot,
        at: DateTime<Utc>,
    ) -> Vec<&'static Achievement> {
        let mut fresh = Vec::new();
        for achievement in &ACHIEVEMENTS {
            if !self.is_unlocked(achievement.id) && (achievement.earned)(snapshot) {
                self.unlocked.insert(achievement.id.to_string(), at);
                tracing::info!("Achievement unlocked: {}", achievement.name);
                fresh.push(achievement);
            }
        }
        fresh
    }
}
