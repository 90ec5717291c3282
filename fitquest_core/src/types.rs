//! Core domain types for FitQuest.
//!
//! This module defines the fundamental types used throughout the system:
//! - Content library (body parts, exercises, training plans, articles, meal plans)
//! - Logged workouts and sets
//! - XP ledger, penalties and level derivation inputs
//! - Body-part goals
//! - Rest timer preferences, nutrient goals and daily logs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

// ============================================================================
// Content Library
// ============================================================================

/// A trainable body part (e.g., "chest", "legs")
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyPart {
    pub id: String,
    pub name: String,
}

/// Equipment an exercise needs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Bodyweight,
    Dumbbell,
    Barbell,
    Kettlebell,
    Machine,
    Band,
}

/// An exercise in the library
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub body_parts: Vec<String>,
    pub equipment: Equipment,
    pub default_rest_seconds: u32,
}

/// A fixed programme targeting one body part
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingPlan {
    pub id: String,
    pub name: String,
    pub body_part_id: String,
    pub total_workouts: u32,
    pub weeks: u32,
}

/// Topic of an academy article
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArticleCategory {
    Training,
    Technique,
    Nutrition,
    Recovery,
}

/// An academy article
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub category: ArticleCategory,
    /// Body parts the article is about (empty for general topics)
    pub body_parts: Vec<String>,
    pub read_minutes: u32,
    pub summary: String,
}

/// A daily meal plan with its macro split
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: String,
    pub name: String,
    pub calories: u32,
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
    pub meals: Vec<String>,
}

impl MealPlan {
    /// Energy implied by the macros (4/4/9 kcal per gram)
    pub fn macro_calories(&self) -> u32 {
        self.protein_g * 4 + self.carbs_g * 4 + self.fat_g * 9
    }
}

/// The complete built-in content library
#[derive(Clone, Debug)]
pub struct Catalog {
    pub body_parts: HashMap<String, BodyPart>,
    pub exercises: HashMap<String, Exercise>,
    pub plans: HashMap<String, TrainingPlan>,
    pub articles: HashMap<String, Article>,
    pub meal_plans: HashMap<String, MealPlan>,
}

// ============================================================================
// Workout Log
// ============================================================================

/// One performed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetLog {
    pub reps: u32,
    pub weight_kg: Option<f32>,
    /// Rate of Perceived Exertion, 1..=10
    pub rpe: Option<u8>,
}

/// All sets performed for one exercise within a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub exercise_id: String,
    pub sets: Vec<SetLog>,
}

/// A recorded workout
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub duration_seconds: Option<u32>,
    pub exercises: Vec<ExerciseLog>,
    pub notes: Option<String>,
}

impl WorkoutSession {
    pub fn new(performed_at: DateTime<Utc>, exercises: Vec<ExerciseLog>) -> Self {
        Self {
            id: Uuid::new_v4(),
            performed_at,
            duration_seconds: None,
            exercises,
            notes: None,
        }
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    /// Sum of reps × weight across all weighted sets
    pub fn total_volume_kg(&self) -> f32 {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter_map(|s| s.weight_kg.map(|w| w * s.reps as f32))
            .sum()
    }
}

// ============================================================================
// XP Ledger
// ============================================================================

/// What produced an XP change
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum XpEventKind {
    WorkoutCompleted { workout_id: Uuid, streak_days: u32 },
    PenaltyApplied { penalty_id: Uuid },
    PenaltyRefunded { penalty_id: Uuid },
}

/// One entry in the XP history. `amount` is signed: penalties are negative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XpEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub kind: XpEventKind,
    pub amount: i64,
}

/// An XP deduction for missed activity, repayable for a partial refund
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub id: Uuid,
    pub description: String,
    pub xp_lost: u64,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

/// The user's XP ledger.
///
/// `current_level` and `level_name` are caches of the level table lookup for
/// `total_xp`; every mutation goes through `xp.rs`, which refreshes them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XpProfile {
    pub total_xp: u64,
    pub current_level: u32,
    pub level_name: String,
    pub penalty_streak: u32,
    #[serde(default)]
    pub events: Vec<XpEvent>,
    #[serde(default)]
    pub penalties: Vec<PenaltyRecord>,
    /// Last day already charged by the inactivity check
    #[serde(default)]
    pub penalized_through: Option<NaiveDate>,
}

// ============================================================================
// Goals
// ============================================================================

/// Lifecycle of a body-part goal. Completed and Abandoned are terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BodyPartGoal {
    pub id: Uuid,
    pub body_part_id: String,
    pub plan_id: String,
    pub start_progress: u8,
    pub target_progress: u8,
    pub completed_workouts: u32,
    pub total_workouts_needed: u32,
    pub week_number: u32,
    pub status: GoalStatus,
    pub user_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Preferences and Daily Tracking
// ============================================================================

/// Rest timer preferences
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestTimerConfig {
    #[serde(default = "default_rest_seconds")]
    pub default_seconds: u32,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
}

impl Default for RestTimerConfig {
    fn default() -> Self {
        Self {
            default_seconds: default_rest_seconds(),
            sound_enabled: true,
            vibration_enabled: true,
        }
    }
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_true() -> bool {
    true
}

/// Daily nutrient targets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NutrientGoals {
    pub calories: u32,
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fat_g: u32,
    pub water_ml: u32,
}

impl Default for NutrientGoals {
    fn default() -> Self {
        Self {
            calories: 2000,
            protein_g: 150,
            carbs_g: 250,
            fat_g: 65,
            water_ml: 2500,
        }
    }
}

/// Partial update for [`NutrientGoals`]; `None` leaves the field untouched.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct NutrientGoalsPatch {
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub protein_g: Option<u32>,
    #[serde(default)]
    pub carbs_g: Option<u32>,
    #[serde(default)]
    pub fat_g: Option<u32>,
    #[serde(default)]
    pub water_ml: Option<u32>,
}

/// Water, sleep, mood and calorie entries for one day
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct DailyLog {
    pub water_ml: u32,
    pub sleep_hours: Option<f32>,
    /// 1 (awful) ..= 5 (great)
    pub mood: Option<u8>,
    pub calories: u32,
}

/// All daily logs keyed by date
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DailyLogBook {
    pub days: BTreeMap<NaiveDate, DailyLog>,
}
