//! Nutrient goals and daily water/sleep/mood/calorie logs.

use crate::{DailyLog, DailyLogBook, Error, NutrientGoals, NutrientGoalsPatch, Result};
use chrono::NaiveDate;

impl NutrientGoals {
    /// Merge a partial update; absent fields are left as they are
    pub fn apply(&mut self, patch: &NutrientGoalsPatch) {
        if let Some(v) = patch.calories {
            self.calories = v;
        }
        if let Some(v) = patch.protein_g {
            self.protein_g = v;
        }
        if let Some(v) = patch.carbs_g {
            self.carbs_g = v;
        }
        if let Some(v) = patch.fat_g {
            self.fat_g = v;
        }
        if let Some(v) = patch.water_ml {
            self.water_ml = v;
        }
    }
}

impl NutrientGoalsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl DailyLogBook {
    pub fn day(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.days.get(&date)
    }

    fn day_mut(&mut self, date: NaiveDate) -> &mut DailyLog {
        self.days.entry(date).or_default()
    }

    /// Add a glass/bottle of water. Returns the day's new total.
    pub fn add_water(&mut self, date: NaiveDate, ml: u32) -> u32 {
        let log = self.day_mut(date);
        log.water_ml = log.water_ml.saturating_add(ml);
        log.water_ml
    }

    pub fn add_calories(&mut self, date: NaiveDate, kcal: u32) -> u32 {
        let log = self.day_mut(date);
        log.calories = log.calories.saturating_add(kcal);
        log.calories
    }

    /// Record the night's sleep (replaces an earlier entry for the day)
    pub fn log_sleep(&mut self, date: NaiveDate, hours: f32) -> Result<()> {
        if !(0.0..=24.0).contains(&hours) {
            return Err(Error::Validation(format!(
                "sleep must be between 0 and 24 hours (got {})",
                hours
            )));
        }
        self.day_mut(date).sleep_hours = Some(hours);
        Ok(())
    }

    /// Record mood on a 1 (awful) to 5 (great) scale
    pub fn log_mood(&mut self, date: NaiveDate, mood: u8) -> Result<()> {
        if !(1..=5).contains(&mood) {
            return Err(Error::Validation(format!(
                "mood must be between 1 and 5 (got {})",
                mood
            )));
        }
        self.day_mut(date).mood = Some(mood);
        Ok(())
    }

    /// Share of the water goal reached on `date`, clamped to 1.0
    pub fn water_progress(&self, date: NaiveDate, goals: &NutrientGoals) -> f64 {
        if goals.water_ml == 0 {
            return 1.0;
        }
        let drunk = self.day(date).map(|d| d.water_ml).unwrap_or(0);
        (f64::from(drunk) / f64::from(goals.water_ml)).min(1.0)
    }

    /// Average sleep over the days in `[from, to]` that have an entry
    pub fn average_sleep(&self, from: NaiveDate, to: NaiveDate) -> Option<f32> {
        let hours: Vec<f32> = self
            .days
            .range(from..=to)
            .filter_map(|(_, log)| log.sleep_hours)
            .collect();
        if hours.is_empty() {
            None
        } else {
            Some(hours.iter().sum::<f32>() / hours.len() as f32)
        }
    }
}
