//! The FitQuest service: one context object owning storage and config.
//!
//! Every user-facing operation goes through [`FitQuest`], which loads the
//! relevant documents, applies the domain logic from the tracker modules and
//! persists the result under the store's update lock.

use crate::achievements::{Achievement, ProgressSnapshot, UnlockedAchievements};
use crate::goals::{AddGoalOutcome, GoalBook, GoalUpdate};
use crate::history::{self, JsonlSink, WorkoutSink};
use crate::rest_timer::RestTimer;
use crate::store::{self, Store};
use crate::xp::{PenaltyResolution, XpAward};
use crate::{
    Catalog, Config, DailyLog, DailyLogBook, Error, GoalStatus, NutrientGoals,
    NutrientGoalsPatch, PenaltyRecord, RestTimerConfig, Result, WorkoutSession, XpProfile,
};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Everything that happened as a result of logging one workout
#[derive(Clone, Debug)]
pub struct WorkoutSummary {
    pub workout_id: Uuid,
    pub streak_days: u32,
    pub xp: XpAward,
    pub level_name: String,
    pub total_sets: usize,
    pub volume_kg: f32,
    pub body_parts: Vec<String>,
    pub goal_updates: Vec<GoalUpdate>,
    /// Penalties charged for days missed before this workout
    pub penalties: Vec<PenaltyRecord>,
    pub achievements: Vec<&'static Achievement>,
}

/// Home-screen overview
#[derive(Clone, Debug)]
pub struct Dashboard {
    pub total_xp: u64,
    pub level: u32,
    pub level_name: String,
    pub level_progress: f64,
    pub streak_days: u32,
    pub total_workouts: usize,
    pub last_workout: Option<NaiveDate>,
    pub outstanding_debt: u64,
    pub active_goals: Vec<crate::BodyPartGoal>,
    pub today: DailyLog,
    pub water_progress: f64,
    pub achievements_unlocked: usize,
}

pub struct FitQuest {
    store: Store,
    config: Config,
    catalog: &'static Catalog,
}

impl FitQuest {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store,
            config,
            catalog: crate::catalog::get_default_catalog(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    /// Reject sessions that reference unknown exercises or carry impossible sets
    pub fn validate_session(&self, session: &WorkoutSession) -> Result<()> {
        if session.exercises.is_empty() {
            return Err(Error::Validation("a workout needs at least one exercise".into()));
        }
        for exercise in &session.exercises {
            if !self.catalog.exercises.contains_key(&exercise.exercise_id) {
                return Err(Error::not_found("exercise", &exercise.exercise_id));
            }
            if exercise.sets.is_empty() {
                return Err(Error::Validation(format!(
                    "{} has no sets",
                    exercise.exercise_id
                )));
            }
            for set in &exercise.sets {
                if set.reps == 0 {
                    return Err(Error::Validation("a set needs at least one rep".into()));
                }
                if let Some(rpe) = set.rpe {
                    if !(1..=10).contains(&rpe) {
                        return Err(Error::Validation(format!(
                            "RPE must be between 1 and 10 (got {})",
                            rpe
                        )));
                    }
                }
                if matches!(set.weight_kg, Some(w) if !(w.is_finite() && w >= 0.0)) {
                    return Err(Error::Validation("weight must be a non-negative number".into()));
                }
            }
        }
        Ok(())
    }

    /// Log a finished workout and apply its consequences: penalties for the
    /// days missed since the previous workout, XP with streak bonus, goal
    /// progress for every trained body part, achievements.
    ///
    /// The session is appended to history only after XP and goals are
    /// updated, so a failed update never leaves a logged workout without its
    /// XP. If the append itself fails the credit stands and the session is
    /// missing from history.
    pub fn complete_workout(&self, session: WorkoutSession) -> Result<WorkoutSummary> {
        self.validate_session(&session)?;

        let mut sessions = self.history()?;
        let previous_day = history::last_workout_day(&sessions);
        let today = session.performed_at.date_naive();
        sessions.push(session.clone());
        let streak_days = history::training_streak(&sessions, today);

        let xp_config = &self.config.xp;
        let (xp, level_name, penalties) =
            self.store.update(store::XP_PROFILE, |p: &mut XpProfile| {
                let charged = p.check_inactivity(today, previous_day, xp_config, Utc::now());
                let penalties = records_for(p, &charged);
                let award = p.award_workout(session.id, streak_days, session.performed_at);
                Ok((award, p.level_name.clone(), penalties))
            })?;

        let body_parts = self
            .catalog
            .body_parts_for(session.exercises.iter().map(|e| e.exercise_id.as_str()));
        let catalog = self.catalog;
        let goal_updates = self.store.update(store::BODY_PART_GOALS, |book: &mut GoalBook| {
            Ok(book.increment_for_body_parts(catalog, &body_parts, session.performed_at))
        })?;

        let mut sink = JsonlSink::new(self.store.history_path());
        sink.append(&session)?;

        let achievements = self.evaluate_achievements(today)?;

        tracing::info!(
            "Workout {} logged: +{} XP, streak {} days, {} goals advanced, {} missed days charged",
            session.id,
            xp.xp,
            streak_days,
            goal_updates.len(),
            penalties.len()
        );

        Ok(WorkoutSummary {
            workout_id: session.id,
            streak_days,
            xp,
            level_name,
            total_sets: session.total_sets(),
            volume_kg: session.total_volume_kg(),
            body_parts,
            goal_updates,
            penalties,
            achievements,
        })
    }

    /// All logged workouts, oldest first
    pub fn history(&self) -> Result<Vec<WorkoutSession>> {
        history::read_sessions(&self.store.history_path())
    }

    // ========================================================================
    // XP ledger
    // ========================================================================

    pub fn xp_profile(&self) -> Result<XpProfile> {
        let mut profile: XpProfile = self.store.load(store::XP_PROFILE)?;
        // Stored level fields are a cache; never trust them over total_xp
        profile.refresh_level();
        Ok(profile)
    }

    /// Charge inactivity penalties up to `today`; returns the new records
    pub fn check_penalties(&self, today: NaiveDate) -> Result<Vec<PenaltyRecord>> {
        let last = history::last_workout_day(&self.history()?);
        let xp_config = &self.config.xp;
        self.store.update(store::XP_PROFILE, |p: &mut XpProfile| {
            let charged = p.check_inactivity(today, last, xp_config, Utc::now());
            Ok(records_for(p, &charged))
        })
    }

    pub fn resolve_penalty(&self, penalty_id: Uuid) -> Result<PenaltyResolution> {
        let resolution = self.store.update(store::XP_PROFILE, |p: &mut XpProfile| {
            p.resolve_penalty(penalty_id, Utc::now())
        })?;
        self.evaluate_achievements(Utc::now().date_naive())?;
        Ok(resolution)
    }

    // ========================================================================
    // Goals
    // ========================================================================

    pub fn goals(&self) -> Result<GoalBook> {
        self.store.load(store::BODY_PART_GOALS)
    }

    pub fn add_goal(
        &self,
        body_part_id: &str,
        plan_id: &str,
        start_progress: u8,
        target_progress: u8,
    ) -> Result<AddGoalOutcome> {
        let catalog = self.catalog;
        let max_active = self.config.goals.max_active;
        self.store.update(store::BODY_PART_GOALS, |book: &mut GoalBook| {
            book.add_goal(
                catalog,
                body_part_id,
                plan_id,
                start_progress,
                target_progress,
                max_active,
                Utc::now(),
            )
        })
    }

    /// Count a workout toward one goal directly
    pub fn increment_goal(&self, goal_id: Uuid) -> Result<GoalUpdate> {
        let catalog = self.catalog;
        let update = self.store.update(store::BODY_PART_GOALS, |book: &mut GoalBook| {
            book.increment_workout(catalog, goal_id, Utc::now())
        })?;
        if update.completed_now {
            self.evaluate_achievements(Utc::now().date_naive())?;
        }
        Ok(update)
    }

    pub fn remove_goal(&self, goal_id: Uuid) -> Result<bool> {
        self.store
            .update(store::BODY_PART_GOALS, |book: &mut GoalBook| book.remove_goal(goal_id))
    }

    pub fn rate_goal(&self, goal_id: Uuid, rating: u8) -> Result<()> {
        self.store.update(store::BODY_PART_GOALS, |book: &mut GoalBook| {
            book.rate_goal(goal_id, rating)
        })
    }

    // ========================================================================
    // Rest timer
    // ========================================================================

    /// Saved timer preferences, falling back to the config file's
    pub fn rest_timer_config(&self) -> Result<RestTimerConfig> {
        Ok(self
            .store
            .load_optional(store::REST_TIMER_CONFIG)?
            .unwrap_or_else(|| self.config.rest_timer.clone()))
    }

    pub fn set_rest_timer_config(&self, config: &RestTimerConfig) -> Result<()> {
        if config.default_seconds == 0 {
            return Err(Error::Validation(
                "default rest must be at least one second".into(),
            ));
        }
        self.store.save(store::REST_TIMER_CONFIG, config)
    }

    pub fn rest_timer(&self) -> Result<RestTimer> {
        Ok(RestTimer::new(self.rest_timer_config()?))
    }

    // ========================================================================
    // Nutrition & daily logs
    // ========================================================================

    pub fn nutrient_goals(&self) -> Result<NutrientGoals> {
        Ok(self
            .store
            .load_optional(store::NUTRIENT_GOALS)?
            .unwrap_or_else(|| self.config.nutrition.clone()))
    }

    pub fn update_nutrient_goals(&self, patch: &NutrientGoalsPatch) -> Result<NutrientGoals> {
        let defaults = &self.config.nutrition;
        self.store
            .update(store::NUTRIENT_GOALS, |slot: &mut Option<NutrientGoals>| {
                let goals = slot.get_or_insert_with(|| defaults.clone());
                goals.apply(patch);
                Ok(goals.clone())
            })
    }

    pub fn daily_log(&self, date: NaiveDate) -> Result<DailyLog> {
        let book: DailyLogBook = self.store.load(store::DAILY_LOGS)?;
        Ok(book.day(date).cloned().unwrap_or_default())
    }

    fn update_daily_logs<R>(&self, f: impl FnOnce(&mut DailyLogBook) -> Result<R>) -> Result<R> {
        self.store.update(store::DAILY_LOGS, f)
    }

    pub fn add_water(&self, date: NaiveDate, ml: u32) -> Result<u32> {
        self.update_daily_logs(|book| Ok(book.add_water(date, ml)))
    }

    pub fn add_calories(&self, date: NaiveDate, kcal: u32) -> Result<u32> {
        self.update_daily_logs(|book| Ok(book.add_calories(date, kcal)))
    }

    pub fn log_sleep(&self, date: NaiveDate, hours: f32) -> Result<()> {
        self.update_daily_logs(|book| book.log_sleep(date, hours))
    }

    pub fn log_mood(&self, date: NaiveDate, mood: u8) -> Result<()> {
        self.update_daily_logs(|book| book.log_mood(date, mood))
    }

    // ========================================================================
    // Achievements & overview
    // ========================================================================

    pub fn achievements(&self) -> Result<UnlockedAchievements> {
        self.store.load(store::ACHIEVEMENTS)
    }

    fn snapshot(&self, today: NaiveDate) -> Result<ProgressSnapshot> {
        let sessions = self.history()?;
        let profile = self.xp_profile()?;
        let goals = self.goals()?;
        Ok(ProgressSnapshot {
            total_workouts: sessions.len(),
            streak_days: history::training_streak(&sessions, today),
            level: profile.current_level,
            goals_completed: goals
                .goals
                .iter()
                .filter(|g| g.status == GoalStatus::Completed)
                .count(),
            penalties_total: profile.penalties.len(),
            outstanding_debt: profile.outstanding_debt(),
        })
    }

    /// Unlock whatever the current progress qualifies for
    pub fn evaluate_achievements(&self, today: NaiveDate) -> Result<Vec<&'static Achievement>> {
        let snapshot = self.snapshot(today)?;
        self.store
            .update(store::ACHIEVEMENTS, |a: &mut UnlockedAchievements| {
                Ok(a.evaluate(&snapshot, Utc::now()))
            })
    }

    pub fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let sessions = self.history()?;
        let profile = self.xp_profile()?;
        let goals = self.goals()?;
        let logs: DailyLogBook = self.store.load(store::DAILY_LOGS)?;
        let nutrient_goals = self.nutrient_goals()?;

        Ok(Dashboard {
            total_xp: profile.total_xp,
            level: profile.current_level,
            level_name: profile.level_name.clone(),
            level_progress: profile.progress_to_next_level(),
            streak_days: history::training_streak(&sessions, today),
            total_workouts: sessions.len(),
            last_workout: history::last_workout_day(&sessions),
            outstanding_debt: profile.outstanding_debt(),
            active_goals: goals.active().cloned().collect(),
            today: logs.day(today).cloned().unwrap_or_default(),
            water_progress: logs.water_progress(today, &nutrient_goals),
            achievements_unlocked: self.achievements()?.unlocked.len(),
        })
    }
}

/// Penalty records for the given ids, in charge order
fn records_for(profile: &XpProfile, ids: &[Uuid]) -> Vec<PenaltyRecord> {
    let ids: HashSet<&Uuid> = ids.iter().collect();
    profile
        .penalties
        .iter()
        .filter(|r| ids.contains(&r.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseLog, SetLog};
    use chrono::{DateTime, Duration, TimeZone};

    fn service(dir: &std::path::Path) -> FitQuest {
        FitQuest::new(Store::new(dir), Config::default())
    }

    impl FitQuest {
        fn update_xp_for_test(&self, total_xp: u64) {
            self.store
                .update(store::XP_PROFILE, |p: &mut XpProfile| {
                    p.total_xp = total_xp;
                    p.refresh_level();
                    Ok(())
                })
                .unwrap();
        }
    }

    fn at_day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, d, 7, 30, 0).unwrap()
    }

    fn bench_session(at: DateTime<Utc>) -> WorkoutSession {
        WorkoutSession::new(
            at,
            vec![ExerciseLog {
                exercise_id: "bench_press".into(),
                sets: vec![
                    SetLog {
                        reps: 8,
                        weight_kg: Some(60.0),
                        rpe: Some(7),
                    },
                    SetLog {
                        reps: 8,
                        weight_kg: Some(60.0),
                        rpe: Some(8),
                    },
                ],
            }],
        )
    }

    #[test]
    fn test_complete_workout_awards_xp_and_goal_progress() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());

        let outcome = fq.add_goal("chest", "chest_foundation", 10, 50).unwrap();
        let AddGoalOutcome::Added(goal_id) = outcome else {
            panic!("goal not added: {:?}", outcome);
        };

        let summary = fq.complete_workout(bench_session(at_day(1))).unwrap();
        assert_eq!(summary.streak_days, 1);
        assert_eq!(summary.xp.xp, 150);
        assert_eq!(summary.total_sets, 2);
        assert!((summary.volume_kg - 960.0).abs() < 1e-3);
        assert_eq!(summary.body_parts, vec!["chest", "arms"]);
        assert_eq!(summary.goal_updates.len(), 1);
        assert_eq!(summary.goal_updates[0].goal_id, goal_id);
        assert!(summary.achievements.iter().any(|a| a.id == "first_workout"));

        let summary = fq.complete_workout(bench_session(at_day(2))).unwrap();
        assert_eq!(summary.streak_days, 2);
        assert_eq!(summary.xp.xp, 200);

        let profile = fq.xp_profile().unwrap();
        assert_eq!(profile.total_xp, 350);
        assert_eq!(fq.history().unwrap().len(), 2);
        assert_eq!(fq.goals().unwrap().get(goal_id).unwrap().completed_workouts, 2);
    }

    #[test]
    fn test_invalid_session_is_not_logged() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());

        let mut session = bench_session(at_day(1));
        session.exercises[0].sets[0].rpe = Some(11);
        assert!(matches!(fq.complete_workout(session), Err(Error::Validation(_))));

        let mut session = bench_session(at_day(1));
        session.exercises[0].exercise_id = "telekinesis".into();
        assert!(matches!(fq.complete_workout(session), Err(Error::NotFound { .. })));

        assert!(fq.history().unwrap().is_empty());
        assert_eq!(fq.xp_profile().unwrap().total_xp, 0);
    }

    #[test]
    fn test_penalty_cycle_and_debt_free_achievement() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());

        fq.complete_workout(bench_session(at_day(1))).unwrap();
        let penalties = fq.check_penalties(at_day(6).date_naive()).unwrap();
        // Grace covers the 2nd and 3rd; 4th and 5th are charged
        assert_eq!(penalties.len(), 2);
        assert_eq!(fq.xp_profile().unwrap().total_xp, 50);
        assert!(fq.check_penalties(at_day(6).date_naive()).unwrap().is_empty());

        for penalty in &penalties {
            let first = fq.resolve_penalty(penalty.id).unwrap();
            assert!(matches!(first, PenaltyResolution::Refunded { .. }));
            let again = fq.resolve_penalty(penalty.id).unwrap();
            assert_eq!(again, PenaltyResolution::AlreadyResolved);
        }

        let profile = fq.xp_profile().unwrap();
        assert_eq!(profile.outstanding_debt(), 0);
        assert!(profile.penalties.iter().all(|p| p.resolved));
        assert!(fq.achievements().unwrap().is_unlocked("debt_free"));
    }

    #[test]
    fn test_rest_timer_config_falls_back_to_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());
        assert_eq!(fq.rest_timer_config().unwrap().default_seconds, 90);

        let saved = RestTimerConfig {
            default_seconds: 120,
            sound_enabled: false,
            vibration_enabled: true,
        };
        fq.set_rest_timer_config(&saved).unwrap();
        assert_eq!(fq.rest_timer_config().unwrap(), saved);
        assert_eq!(fq.rest_timer().unwrap().config().default_seconds, 120);

        let zero = RestTimerConfig {
            default_seconds: 0,
            ..saved
        };
        assert!(fq.set_rest_timer_config(&zero).is_err());
    }

    #[test]
    fn test_nutrient_goals_patch_starts_from_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.nutrition.calories = 2600;
        let fq = FitQuest::new(Store::new(temp_dir.path()), config);

        let patch = NutrientGoalsPatch {
            protein_g: Some(200),
            ..Default::default()
        };
        let goals = fq.update_nutrient_goals(&patch).unwrap();
        assert_eq!(goals.calories, 2600);
        assert_eq!(goals.protein_g, 200);
        assert_eq!(fq.nutrient_goals().unwrap(), goals);
    }

    #[test]
    fn test_corrupted_documents_fall_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());
        std::fs::write(fq.store().path(store::XP_PROFILE), "not json").unwrap();
        std::fs::write(fq.store().path(store::BODY_PART_GOALS), "{]").unwrap();

        assert_eq!(fq.xp_profile().unwrap().total_xp, 0);
        assert!(fq.goals().unwrap().goals.is_empty());
        fq.complete_workout(bench_session(at_day(3))).unwrap();
        assert_eq!(fq.xp_profile().unwrap().total_xp, 150);
    }

    #[test]
    fn test_dashboard_overview() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());
        let today = at_day(10).date_naive();

        fq.complete_workout(bench_session(at_day(9))).unwrap();
        fq.complete_workout(bench_session(at_day(10))).unwrap();
        fq.add_goal("legs", "leg_day_basics", 0, 40).unwrap();
        fq.add_water(today, 1250).unwrap();
        fq.log_mood(today, 4).unwrap();

        let dash = fq.dashboard(today).unwrap();
        assert_eq!(dash.total_workouts, 2);
        assert_eq!(dash.streak_days, 2);
        assert_eq!(dash.total_xp, 350);
        assert_eq!(dash.last_workout, Some(today));
        assert_eq!(dash.active_goals.len(), 1);
        assert_eq!(dash.today.mood, Some(4));
        assert!((dash.water_progress - 0.5).abs() < 1e-9);
        assert!(dash.achievements_unlocked >= 1);

        let later = today + Duration::days(3);
        assert_eq!(fq.dashboard(later).unwrap().streak_days, 0);
    }

    #[test]
    fn test_workout_after_gap_charges_missed_days() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());

        fq.complete_workout(bench_session(at_day(1))).unwrap();
        fq.update_xp_for_test(1_000);

        let summary = fq.complete_workout(bench_session(at_day(12))).unwrap();
        // Grace covers the 2nd and 3rd; the 4th through the 11th are charged
        assert_eq!(summary.penalties.len(), 8);
        assert!(summary.penalties.iter().all(|p| p.xp_lost == 50));
        assert_eq!(summary.streak_days, 1);

        let profile = fq.xp_profile().unwrap();
        assert_eq!(profile.total_xp, 1_000 - 400 + 150);
        assert_eq!(profile.penalties.len(), 8);
        assert_eq!(profile.penalty_streak, 0);

        // Nothing left to charge once the new workout is on record
        assert!(fq.check_penalties(at_day(13).date_naive()).unwrap().is_empty());
        assert_eq!(fq.history().unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_resolve_refunds_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());

        fq.complete_workout(bench_session(at_day(1))).unwrap();
        let penalties = fq.check_penalties(at_day(6).date_naive()).unwrap();
        let penalty_id = penalties[0].id;
        let before = fq.xp_profile().unwrap().total_xp;

        let results: Vec<PenaltyResolution> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| fq.resolve_penalty(penalty_id).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let refunds: Vec<_> = results
            .iter()
            .filter(|r| matches!(r, PenaltyResolution::Refunded { .. }))
            .collect();
        assert_eq!(refunds.len(), 1);
        assert_eq!(*refunds[0], PenaltyResolution::Refunded { xp: 25 });
        assert_eq!(fq.xp_profile().unwrap().total_xp, before + 25);
    }

    #[test]
    fn test_failed_xp_update_leaves_history_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let fq = service(temp_dir.path());
        // A directory where the ledger lock file belongs makes the update fail
        std::fs::create_dir_all(temp_dir.path().join("xp_profile.lock")).unwrap();

        assert!(fq.complete_workout(bench_session(at_day(1))).is_err());
        assert!(fq.history().unwrap().is_empty());
        assert!(!fq.store().history_path().exists());
    }
}
