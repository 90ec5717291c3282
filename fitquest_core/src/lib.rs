#![forbid(unsafe_code)]

//! Core domain model and business logic for FitQuest.
//!
//! This crate provides:
//! - Domain types (workouts, sets, goals, XP ledger, daily logs)
//! - Content library (body parts, exercises, training plans)
//! - Rest timer state machine
//! - XP/penalty ledger with derived levels
//! - Goal progress tracking
//! - Nutrition goals and achievements
//! - Persistence (JSON documents, workout history, CSV export)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod history;
pub mod csv_export;
pub mod rest_timer;
pub mod xp;
pub mod goals;
pub mod nutrition;
pub mod achievements;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use store::Store;
pub use history::{JsonlSink, WorkoutSink};
pub use rest_timer::{RestFeedback, RestTimer, RestTimerEvent, RestTimerState};
pub use xp::{level_for_xp, PenaltyResolution, XpAward};
pub use goals::{AddGoalOutcome, GoalBook, GoalUpdate};
pub use engine::{Dashboard, FitQuest, WorkoutSummary};
