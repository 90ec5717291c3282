//! XP ledger: workout rewards, inactivity penalties and level derivation.
//!
//! Levels are never stored independently of XP. Every mutation of
//! `total_xp` goes through this module and re-derives `current_level` and
//! `level_name` from [`LEVELS`].

use crate::config::XpConfig;
use crate::{Error, PenaltyRecord, Result, XpEvent, XpEventKind, XpProfile};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

pub const BASE_WORKOUT_XP: u64 = 100;
pub const STREAK_BONUS_PER_DAY: u64 = 50;
/// Streak days beyond this earn no extra bonus
pub const MAX_STREAK_BONUS_DAYS: u32 = 7;

/// A rung of the level ladder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Level {
    pub level: u32,
    pub min_xp: u64,
    pub name: &'static str,
}

/// Fixed ascending threshold table
pub static LEVELS: [Level; 10] = [
    Level {
        level: 1,
        min_xp: 0,
        name: "Rookie",
    },
    Level {
        level: 2,
        min_xp: 500,
        name: "Beginner",
    },
    Level {
        level: 3,
        min_xp: 1_500,
        name: "Apprentice",
    },
    Level {
        level: 4,
        min_xp: 3_000,
        name: "Athlete",
    },
    Level {
        level: 5,
        min_xp: 5_000,
        name: "Warrior",
    },
    Level {
        level: 6,
        min_xp: 8_000,
        name: "Champion",
    },
    Level {
        level: 7,
        min_xp: 12_000,
        name: "Titan",
    },
    Level {
        level: 8,
        min_xp: 18_000,
        name: "Legend",
    },
    Level {
        level: 9,
        min_xp: 25_000,
        name: "Mythic",
    },
    Level {
        level: 10,
        min_xp: 35_000,
        name: "Olympian",
    },
];

/// Highest level whose threshold is at or below `total_xp`
pub fn level_for_xp(total_xp: u64) -> &'static Level {
    LEVELS
        .iter()
        .rev()
        .find(|l| l.min_xp <= total_xp)
        .unwrap_or(&LEVELS[0])
}

/// The level after the one `total_xp` qualifies for, if any
pub fn next_level(total_xp: u64) -> Option<&'static Level> {
    LEVELS.iter().find(|l| l.min_xp > total_xp)
}

/// XP for one completed workout at the given training streak
pub fn workout_xp(streak_days: u32) -> u64 {
    BASE_WORKOUT_XP + STREAK_BONUS_PER_DAY * u64::from(streak_days.min(MAX_STREAK_BONUS_DAYS))
}

/// Result of awarding XP for a workout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XpAward {
    pub xp: u64,
    pub total_xp: u64,
    /// Set when the award crossed at least one level threshold
    pub new_level: Option<u32>,
}

/// Result of resolving a penalty
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PenaltyResolution {
    Refunded { xp: u64 },
    AlreadyResolved,
}

impl Default for XpProfile {
    fn default() -> Self {
        let mut profile = Self {
            total_xp: 0,
            current_level: 0,
            level_name: String::new(),
            penalty_streak: 0,
            events: Vec::new(),
            penalties: Vec::new(),
            penalized_through: None,
        };
        profile.refresh_level();
        profile
    }
}

impl XpProfile {
    /// Re-derive the cached level fields from `total_xp`
    pub fn refresh_level(&mut self) {
        let level = level_for_xp(self.total_xp);
        self.current_level = level.level;
        self.level_name = level.name.to_string();
    }

    /// 0.0 .. 1.0 progress from the current level's threshold to the next one.
    /// Returns 1.0 at the top level.
    pub fn progress_to_next_level(&self) -> f64 {
        let current = level_for_xp(self.total_xp);
        match next_level(self.total_xp) {
            Some(next) => {
                (self.total_xp - current.min_xp) as f64 / (next.min_xp - current.min_xp) as f64
            }
            None => 1.0,
        }
    }

    pub fn outstanding_penalties(&self) -> impl Iterator<Item = &PenaltyRecord> {
        self.penalties.iter().filter(|p| !p.resolved)
    }

    /// Total XP lost to penalties that have not been resolved yet
    pub fn outstanding_debt(&self) -> u64 {
        self.outstanding_penalties().map(|p| p.xp_lost).sum()
    }

    fn push_event(&mut self, kind: XpEventKind, amount: i64, at: DateTime<Utc>) {
        self.events.push(XpEvent {
            id: Uuid::new_v4(),
            at,
            kind,
            amount,
        });
    }

    /// Credit XP for a completed workout. Resets the penalty streak.
    pub fn award_workout(
        &mut self,
        workout_id: Uuid,
        streak_days: u32,
        at: DateTime<Utc>,
    ) -> XpAward {
        let before = self.current_level;
        let xp = workout_xp(streak_days);

        self.total_xp += xp;
        self.penalty_streak = 0;
        self.refresh_level();
        self.push_event(
            XpEventKind::WorkoutCompleted {
                workout_id,
                streak_days,
            },
            xp as i64,
            at,
        );

        let new_level = (self.current_level > before).then_some(self.current_level);
        if let Some(level) = new_level {
            tracing::info!("Level up: {} ({})", level, self.level_name);
        }
        tracing::debug!(
            "Awarded {} XP for workout {} (streak {} days), total {}",
            xp,
            workout_id,
            streak_days,
            self.total_xp
        );

        XpAward {
            xp,
            total_xp: self.total_xp,
            new_level,
        }
    }

    /// Deduct up to `xp` and record the debt. Total XP never goes below zero;
    /// the record stores the amount actually deducted.
    pub fn apply_penalty(
        &mut self,
        description: impl Into<String>,
        xp: u64,
        at: DateTime<Utc>,
    ) -> Uuid {
        let xp_lost = xp.min(self.total_xp);
        let id = Uuid::new_v4();

        self.total_xp -= xp_lost;
        self.penalty_streak += 1;
        self.refresh_level();
        self.penalties.push(PenaltyRecord {
            id,
            description: description.into(),
            xp_lost,
            created_at: at,
            resolved: false,
        });
        self.push_event(XpEventKind::PenaltyApplied { penalty_id: id }, -(xp_lost as i64), at);

        tracing::info!("Penalty {} applied: -{} XP", id, xp_lost);
        id
    }

    /// Charge one penalty for each missed day past the grace period.
    ///
    /// Days are counted from the last workout up to (not including) `today`,
    /// so the user still has today to train. Days already charged by an
    /// earlier check are skipped. Users who never trained are not penalized.
    pub fn check_inactivity(
        &mut self,
        today: NaiveDate,
        last_workout_day: Option<NaiveDate>,
        config: &XpConfig,
        at: DateTime<Utc>,
    ) -> Vec<Uuid> {
        let Some(last) = last_workout_day else {
            return Vec::new();
        };

        let first_chargeable = last + Duration::days(i64::from(config.grace_days) + 1);
        let mut day = match self.penalized_through {
            Some(through) if through >= first_chargeable => through + Duration::days(1),
            _ => first_chargeable,
        };

        let mut created = Vec::new();
        while day < today {
            let id = self.apply_penalty(
                format!("Missed workout on {}", day),
                config.penalty_xp_per_day,
                at,
            );
            created.push(id);
            self.penalized_through = Some(day);
            day += Duration::days(1);
        }

        if !created.is_empty() {
            tracing::info!(
                "Inactivity check charged {} penalties (last workout {})",
                created.len(),
                last
            );
        }
        created
    }

    /// Pay down a penalty: refunds half the XP it cost and marks it resolved.
    ///
    /// A record is resolved at most once; later calls return `AlreadyResolved`.
    pub fn resolve_penalty(
        &mut self,
        penalty_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<PenaltyResolution> {
        let record = self
            .penalties
            .iter_mut()
            .find(|p| p.id == penalty_id)
            .ok_or_else(|| Error::not_found("penalty", penalty_id))?;

        if record.resolved {
            tracing::debug!("Penalty {} already resolved", penalty_id);
            return Ok(PenaltyResolution::AlreadyResolved);
        }

        record.resolved = true;
        let refund = record.xp_lost / 2;

        self.total_xp += refund;
        self.refresh_level();
        self.push_event(XpEventKind::PenaltyRefunded { penalty_id }, refund as i64, at);

        tracing::info!("Penalty {} resolved: +{} XP refunded", penalty_id, refund);
        Ok(PenaltyResolution::Refunded { xp: refund })
    }
}
