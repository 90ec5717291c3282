//! Body-part goal tracking against fixed training plans.
//!
//! Goals are never deleted. Removing one flips it to `Abandoned` so the
//! history stays available for analytics.

use crate::{BodyPartGoal, Catalog, Error, GoalStatus, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of [`GoalBook::add_goal`]. Neither refusal is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddGoalOutcome {
    Added(Uuid),
    /// An active goal already targets this body part
    AlreadyTracked(Uuid),
    LimitReached { active: usize },
}

/// Progress change produced by a logged workout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalUpdate {
    pub goal_id: Uuid,
    pub completed_workouts: u32,
    pub week_number: u32,
    /// The goal transitioned to `Completed` with this workout
    pub completed_now: bool,
}

/// Current week of a plan given progress through its workouts (1-based,
/// never past the plan's last week)
pub fn week_number(completed: u32, needed: u32, weeks: u32) -> u32 {
    let weeks = weeks.max(1);
    if needed == 0 {
        return 1;
    }
    let elapsed = u64::from(completed) * u64::from(weeks) / u64::from(needed);
    (elapsed as u32 + 1).min(weeks)
}

impl BodyPartGoal {
    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }

    /// 0.0 ..= 1.0 share of the plan's workouts done
    pub fn completion_ratio(&self) -> f64 {
        if self.total_workouts_needed == 0 {
            return 1.0;
        }
        (f64::from(self.completed_workouts) / f64::from(self.total_workouts_needed)).min(1.0)
    }

    /// Progress score interpolated between start and target
    pub fn current_progress(&self) -> f64 {
        let start = f64::from(self.start_progress);
        let target = f64::from(self.target_progress);
        start + (target - start) * self.completion_ratio()
    }
}

/// All goals the user ever created
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalBook {
    pub goals: Vec<BodyPartGoal>,
}

impl GoalBook {
    pub fn active(&self) -> impl Iterator<Item = &BodyPartGoal> {
        self.goals.iter().filter(|g| g.is_active())
    }

    pub fn get(&self, id: Uuid) -> Option<&BodyPartGoal> {
        self.goals.iter().find(|g| g.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut BodyPartGoal> {
        self.goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| Error::not_found("goal", id))
    }

    /// Start tracking a goal for `body_part_id` on `plan_id`
    ///
    /// Returns `AlreadyTracked` if an active goal exists for the body part,
    /// `LimitReached` if `max_active` goals are already active.
    #[allow(clippy::too_many_arguments)]
    pub fn add_goal(
        &mut self,
        catalog: &Catalog,
        body_part_id: &str,
        plan_id: &str,
        start_progress: u8,
        target_progress: u8,
        max_active: usize,
        at: DateTime<Utc>,
    ) -> Result<AddGoalOutcome> {
        if !catalog.body_parts.contains_key(body_part_id) {
            return Err(Error::not_found("body part", body_part_id));
        }
        let plan = catalog
            .plans
            .get(plan_id)
            .ok_or_else(|| Error::not_found("plan", plan_id))?;
        if plan.body_part_id != body_part_id {
            return Err(Error::Validation(format!(
                "plan '{}' trains {}, not {}",
                plan_id, plan.body_part_id, body_part_id
            )));
        }
        if target_progress > 100 || start_progress > target_progress {
            return Err(Error::Validation(format!(
                "progress must satisfy start <= target <= 100 (got {} -> {})",
                start_progress, target_progress
            )));
        }

        if let Some(existing) = self.active().find(|g| g.body_part_id == body_part_id) {
            tracing::debug!("Goal for {} already active ({})", body_part_id, existing.id);
            return Ok(AddGoalOutcome::AlreadyTracked(existing.id));
        }

        let active = self.active().count();
        if active >= max_active {
            tracing::debug!("Goal limit reached ({} active)", active);
            return Ok(AddGoalOutcome::LimitReached { active });
        }

        let id = Uuid::new_v4();
        self.goals.push(BodyPartGoal {
            id,
            body_part_id: body_part_id.to_string(),
            plan_id: plan_id.to_string(),
            start_progress,
            target_progress,
            completed_workouts: 0,
            total_workouts_needed: plan.total_workouts,
            week_number: 1,
            status: GoalStatus::Active,
            user_rating: None,
            created_at: at,
            completed_at: None,
        });

        tracing::info!("Added goal {} for {} on plan {}", id, body_part_id, plan_id);
        Ok(AddGoalOutcome::Added(id))
    }

    /// Count one workout toward a goal. Terminal goals are left unchanged.
    pub fn increment_workout(
        &mut self,
        catalog: &Catalog,
        goal_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<GoalUpdate> {
        let goal = self.get_mut(goal_id)?;
        Ok(advance(goal, catalog, at))
    }

    /// Count one workout toward every active goal whose body part was trained
    pub fn increment_for_body_parts(
        &mut self,
        catalog: &Catalog,
        body_parts: &[String],
        at: DateTime<Utc>,
    ) -> Vec<GoalUpdate> {
        self.goals
            .iter_mut()
            .filter(|g| g.is_active() && body_parts.contains(&g.body_part_id))
            .map(|g| advance(g, catalog, at))
            .collect()
    }

    /// Abandon an active goal. Returns false if it was already terminal.
    pub fn remove_goal(&mut self, goal_id: Uuid) -> Result<bool> {
        let goal = self.get_mut(goal_id)?;
        if !goal.is_active() {
            return Ok(false);
        }
        goal.status = GoalStatus::Abandoned;
        tracing::info!("Abandoned goal {}", goal_id);
        Ok(true)
    }

    /// Rate a completed goal from 1 to 5
    pub fn rate_goal(&mut self, goal_id: Uuid, rating: u8) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(Error::Validation(format!(
                "rating must be between 1 and 5 (got {})",
                rating
            )));
        }
        let goal = self.get_mut(goal_id)?;
        if goal.status != GoalStatus::Completed {
            return Err(Error::Validation(format!(
                "only completed goals can be rated (goal {} is {:?})",
                goal_id, goal.status
            )));
        }
        goal.user_rating = Some(rating);
        Ok(())
    }
}

fn advance(goal: &mut BodyPartGoal, catalog: &Catalog, at: DateTime<Utc>) -> GoalUpdate {
    let mut completed_now = false;

    if goal.is_active() {
        goal.completed_workouts += 1;
        let weeks = catalog
            .plans
            .get(&goal.plan_id)
            .map(|p| p.weeks)
            .unwrap_or(1);
        goal.week_number = week_number(goal.completed_workouts, goal.total_workouts_needed, weeks);

        if goal.completed_workouts >= goal.total_workouts_needed {
            goal.status = GoalStatus::Completed;
            goal.completed_at = Some(at);
            completed_now = true;
            tracing::info!("Goal {} completed", goal.id);
        }
    }

    GoalUpdate {
        goal_id: goal.id,
        completed_workouts: goal.completed_workouts,
        week_number: goal.week_number,
        completed_now,
    }
}
