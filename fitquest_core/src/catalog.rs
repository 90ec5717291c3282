//! Default content library: body parts, exercises, training plans, academy
//! articles and meal plans.
//!
//! This module provides the built-in library the trackers validate against.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn body_part(id: &str, name: &str) -> BodyPart {
    BodyPart {
        id: id.into(),
        name: name.into(),
    }
}

fn exercise(
    id: &str,
    name: &str,
    body_parts: &[&str],
    equipment: Equipment,
    default_rest_seconds: u32,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        body_parts: body_parts.iter().map(|b| b.to_string()).collect(),
        equipment,
        default_rest_seconds,
    }
}

fn plan(
    id: &str,
    name: &str,
    body_part_id: &str,
    total_workouts: u32,
    weeks: u32,
) -> TrainingPlan {
    TrainingPlan {
        id: id.into(),
        name: name.into(),
        body_part_id: body_part_id.into(),
        total_workouts,
        weeks,
    }
}

fn article(
    id: &str,
    title: &str,
    category: ArticleCategory,
    body_parts: &[&str],
    read_minutes: u32,
    summary: &str,
) -> Article {
    Article {
        id: id.into(),
        title: title.into(),
        category,
        body_parts: body_parts.iter().map(|b| b.to_string()).collect(),
        read_minutes,
        summary: summary.into(),
    }
}

/// `macros` is (protein, carbs, fat) in grams
fn meal_plan(
    id: &str,
    name: &str,
    calories: u32,
    macros: (u32, u32, u32),
    meals: &[&str],
) -> MealPlan {
    let (protein_g, carbs_g, fat_g) = macros;
    MealPlan {
        id: id.into(),
        name: name.into(),
        calories,
        protein_g,
        carbs_g,
        fat_g,
        meals: meals.iter().map(|m| m.to_string()).collect(),
    }
}

/// Builds the default catalog with the built-in content library
///
/// Prefer [`get_default_catalog`] outside of tests.
pub fn build_default_catalog() -> Catalog {
    let body_parts = [
        body_part("chest", "Chest"),
        body_part("back", "Back"),
        body_part("shoulders", "Shoulders"),
        body_part("arms", "Arms"),
        body_part("legs", "Legs"),
        body_part("glutes", "Glutes"),
        body_part("core", "Core"),
    ];

    let exercises = [
        exercise(
            "bench_press",
            "Barbell Bench Press",
            &["chest", "arms"],
            Equipment::Barbell,
            120,
        ),
        exercise("push_up", "Push-up", &["chest", "arms", "core"], Equipment::Bodyweight, 60),
        exercise("pull_up", "Pull-up", &["back", "arms"], Equipment::Bodyweight, 90),
        exercise("bent_over_row", "Bent-over Row", &["back"], Equipment::Barbell, 90),
        exercise(
            "overhead_press",
            "Overhead Press",
            &["shoulders", "arms"],
            Equipment::Barbell,
            120,
        ),
        exercise("lateral_raise", "Lateral Raise", &["shoulders"], Equipment::Dumbbell, 60),
        exercise("bicep_curl", "Dumbbell Curl", &["arms"], Equipment::Dumbbell, 60),
        exercise("back_squat", "Back Squat", &["legs", "glutes"], Equipment::Barbell, 150),
        exercise(
            "romanian_deadlift",
            "Romanian Deadlift",
            &["legs", "glutes", "back"],
            Equipment::Barbell,
            120,
        ),
        exercise("hip_thrust", "Hip Thrust", &["glutes"], Equipment::Barbell, 90),
        exercise(
            "kb_swing",
            "Kettlebell Swing",
            &["glutes", "legs", "core"],
            Equipment::Kettlebell,
            60,
        ),
        exercise("plank", "Plank", &["core"], Equipment::Bodyweight, 45),
    ];

    let plans = [
        plan("chest_foundation", "Chest Foundation", "chest", 12, 4),
        plan("chest_strength", "Chest Strength", "chest", 18, 6),
        plan("back_foundation", "Back Foundation", "back", 12, 4),
        plan("shoulder_sculpt", "Shoulder Sculpt", "shoulders", 12, 4),
        plan("arm_builder", "Arm Builder", "arms", 16, 4),
        plan("leg_day_basics", "Leg Day Basics", "legs", 12, 4),
        plan("glute_growth", "Glute Growth", "glutes", 18, 6),
        plan("core_stability", "Core Stability", "core", 8, 4),
    ];

    // ========================================================================
    // Academy
    // ========================================================================

    let articles = [
        article(
            "rest_between_sets",
            "How Long to Rest Between Sets",
            ArticleCategory::Training,
            &[],
            4,
            "Heavy compound lifts need two to three minutes; accessories recover in one.",
        ),
        article(
            "progressive_overload",
            "Progressive Overload Explained",
            ArticleCategory::Training,
            &[],
            6,
            "Add a rep or a little weight each week and write every set down.",
        ),
        article(
            "core_bracing",
            "Bracing Your Core",
            ArticleCategory::Technique,
            &["core", "back"],
            4,
            "Breathe into your belt line and hold it before every squat and hinge.",
        ),
        article(
            "glute_activation",
            "Waking Up Your Glutes",
            ArticleCategory::Technique,
            &["glutes"],
            3,
            "Bridges and band walks before leg day make hip thrusts count.",
        ),
        article(
            "protein_basics",
            "Protein: How Much Do You Need?",
            ArticleCategory::Nutrition,
            &[],
            5,
            "Around 1.6 g per kg of bodyweight covers muscle growth for most lifters.",
        ),
        article(
            "sleep_recovery",
            "Sleep and Recovery",
            ArticleCategory::Recovery,
            &[],
            5,
            "Seven hours or more is when most of the adaptation from training happens.",
        ),
    ];

    // ========================================================================
    // Meal Plans
    // ========================================================================

    let meal_plans = [
        meal_plan(
            "lean_cut",
            "Lean Cut",
            1700,
            (160, 150, 50),
            &["Egg white omelette", "Chicken salad", "Greek yogurt", "Salmon with greens"],
        ),
        meal_plan(
            "balanced_maintenance",
            "Balanced Maintenance",
            2200,
            (150, 250, 65),
            &["Oats with berries", "Turkey wrap", "Apple and almonds", "Beef stir-fry"],
        ),
        meal_plan(
            "plant_power",
            "Plant Power",
            2250,
            (120, 280, 70),
            &["Tofu scramble", "Lentil bowl", "Hummus and veg", "Chickpea curry"],
        ),
        meal_plan(
            "muscle_gain",
            "Muscle Gain",
            2850,
            (180, 350, 80),
            &["Protein pancakes", "Rice and chicken", "Shake with banana", "Steak and potatoes"],
        ),
    ];

    Catalog {
        body_parts: body_parts.into_iter().map(|b| (b.id.clone(), b)).collect(),
        exercises: exercises.into_iter().map(|e| (e.id.clone(), e)).collect(),
        plans: plans.into_iter().map(|p| (p.id.clone(), p)).collect(),
        articles: articles.into_iter().map(|a| (a.id.clone(), a)).collect(),
        meal_plans: meal_plans.into_iter().map(|m| (m.id.clone(), m)).collect(),
    }
}

impl Catalog {
    /// Body parts trained by the given exercise ids (unknown ids are skipped)
    pub fn body_parts_for<'a>(
        &self,
        exercise_ids: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut parts = Vec::new();
        for id in exercise_ids {
            if let Some(exercise) = self.exercises.get(id) {
                for part in &exercise.body_parts {
                    if seen.insert(part.clone()) {
                        parts.push(part.clone());
                    }
                }
            }
        }
        parts
    }

    /// Plans available for a body part, sorted by id
    pub fn plans_for(&self, body_part_id: &str) -> Vec<&TrainingPlan> {
        let mut plans: Vec<_> = self
            .plans
            .values()
            .filter(|p| p.body_part_id == body_part_id)
            .collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        plans
    }

    /// Articles sorted by title, optionally only those about one body part
    pub fn articles_for(&self, body_part_id: Option<&str>) -> Vec<&Article> {
        let mut articles: Vec<_> = self
            .articles
            .values()
            .filter(|a| body_part_id.map_or(true, |b| a.body_parts.iter().any(|p| p == b)))
            .collect();
        articles.sort_by(|a, b| a.title.cmp(&b.title));
        articles
    }

    /// Meal plans ordered by how close their calories are to `calories`
    pub fn meal_plans_near(&self, calories: u32) -> Vec<&MealPlan> {
        let mut plans: Vec<_> = self.meal_plans.values().collect();
        plans.sort_by_key(|m| (m.calories.abs_diff(calories), m.id.clone()));
        plans
    }

    /// Validate catalog consistency
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, exercise) in &self.exercises {
            if key != &exercise.id {
                errors.push(format!(
                    "Exercise keyed as '{}' has id '{}'",
                    key, exercise.id
                ));
            }
            if exercise.body_parts.is_empty() {
                errors.push(format!("Exercise '{}' trains no body part", exercise.id));
            }
            for part in &exercise.body_parts {
                if !self.body_parts.contains_key(part) {
                    errors.push(format!(
                        "Exercise '{}' references unknown body part '{}'",
                        exercise.id, part
                    ));
                }
            }
        }

        for plan in self.plans.values() {
            if !self.body_parts.contains_key(&plan.body_part_id) {
                errors.push(format!(
                    "Plan '{}' references unknown body part '{}'",
                    plan.id, plan.body_part_id
                ));
            }
            if plan.total_workouts == 0 {
                errors.push(format!("Plan '{}' has zero workouts", plan.id));
            }
            if plan.weeks == 0 {
                errors.push(format!("Plan '{}' spans zero weeks", plan.id));
            }
        }

        for (key, article) in &self.articles {
            if key != &article.id {
                errors.push(format!("Article keyed as '{}' has id '{}'", key, article.id));
            }
            if article.read_minutes == 0 {
                errors.push(format!("Article '{}' has zero read time", article.id));
            }
            for part in &article.body_parts {
                if !self.body_parts.contains_key(part) {
                    errors.push(format!(
                        "Article '{}' references unknown body part '{}'",
                        article.id, part
                    ));
                }
            }
        }

        for (key, meal_plan) in &self.meal_plans {
            if key != &meal_plan.id {
                errors.push(format!("Meal plan keyed as '{}' has id '{}'", key, meal_plan.id));
            }
            if meal_plan.meals.is_empty() {
                errors.push(format!("Meal plan '{}' has no meals", meal_plan.id));
            }
            // Stated calories must agree with the macros within 5%
            let implied = meal_plan.macro_calories();
            if implied.abs_diff(meal_plan.calories) * 20 > meal_plan.calories {
                errors.push(format!(
                    "Meal plan '{}' states {} kcal but its macros add up to {} kcal",
                    meal_plan.id, meal_plan.calories, implied
                ));
            }
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for part in self.body_parts.keys() {
            counts.insert(part.as_str(), 0);
        }
        for plan in self.plans.values() {
            if let Some(count) = counts.get_mut(plan.body_part_id.as_str()) {
                *count += 1;
            }
        }
        for (part, count) in counts {
            if count == 0 {
                errors.push(format!("Body part '{}' has no training plan", part));
            }
        }

        errors.sort();
        errors
    }
}
