use chrono::{NaiveDate, TimeZone, Utc};
use clap::{ArgAction, Parser, Subcommand};
use fitquest_core::achievements::ACHIEVEMENTS;
use fitquest_core::rest_timer::{Tone, TICK_INTERVAL_MS};
use fitquest_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

mod parse;

#[derive(Parser)]
#[command(name = "fitquest")]
#[command(about = "Gamified workout, goal and nutrition tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a specific config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show level, streak, goals and today's log (default)
    Dashboard,

    /// Browse the exercise library
    Exercises {
        /// Only exercises training this body part
        #[arg(long)]
        body_part: Option<String>,
    },

    /// Rest timer between sets
    Timer {
        #[command(subcommand)]
        command: TimerCommands,
    },

    /// Log and review workouts
    Workout {
        #[command(subcommand)]
        command: WorkoutCommands,
    },

    /// Experience points and penalties
    Xp {
        #[command(subcommand)]
        command: XpCommands,
    },

    /// Body-part goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },

    /// Nutrient goals and daily water/sleep/mood/calorie logs
    Nutrition {
        #[command(subcommand)]
        command: NutritionCommands,
    },

    /// Browse academy articles
    Articles {
        /// Only articles about this body part
        #[arg(long)]
        body_part: Option<String>,
    },

    /// List achievements
    Achievements,
}

#[derive(Subcommand)]
enum TimerCommands {
    /// Count down a rest period (blocks until it ends)
    Start {
        /// Rest length in seconds (defaults to the configured rest)
        #[arg(long)]
        seconds: Option<u32>,

        /// Don't print the countdown
        #[arg(long)]
        quiet: bool,
    },

    /// Show or change rest timer preferences
    Config {
        #[arg(long)]
        default_seconds: Option<u32>,

        #[arg(long, action = ArgAction::Set)]
        sound: Option<bool>,

        #[arg(long, action = ArgAction::Set)]
        vibration: Option<bool>,
    },
}

#[derive(Subcommand)]
enum WorkoutCommands {
    /// Log a finished workout, e.g. `workout log bench_press:8x60@7,8x60@8 plank:1`
    Log {
        /// EXERCISE:SET[,SET...] with SET = REPS[xKG][@RPE]
        #[arg(required = true)]
        entries: Vec<String>,

        /// Workout length in minutes
        #[arg(long)]
        duration_min: Option<u32>,

        #[arg(long)]
        notes: Option<String>,

        /// Day the workout was performed (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List logged workouts, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Export every logged set to CSV
    Export { path: PathBuf },
}

#[derive(Subcommand)]
enum XpCommands {
    /// Show XP, level and outstanding penalties
    Show,

    /// Charge penalties for missed days
    Check {
        /// Evaluate as of this day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Pay off a penalty for a 50% XP refund
    Resolve { penalty_id: Uuid },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// List training plans
    Plans {
        #[arg(long)]
        body_part: Option<String>,
    },

    /// Start a goal for a body part
    Add {
        body_part: String,
        plan: String,

        /// Current self-assessed progress (0-100)
        #[arg(long, default_value_t = 0)]
        start: u8,

        /// Target progress (0-100)
        #[arg(long, default_value_t = 100)]
        target: u8,
    },

    /// List goals (active only unless --all)
    List {
        #[arg(long)]
        all: bool,
    },

    /// Count one workout toward a goal
    Workout { goal_id: Uuid },

    /// Abandon a goal (kept in history)
    Remove { goal_id: Uuid },

    /// Rate a completed goal from 1 to 5
    Rate { goal_id: Uuid, rating: u8 },
}

#[derive(Subcommand)]
enum NutritionCommands {
    /// Show or change nutrient goals
    Goals {
        #[arg(long)]
        calories: Option<u32>,
        #[arg(long)]
        protein: Option<u32>,
        #[arg(long)]
        carbs: Option<u32>,
        #[arg(long)]
        fat: Option<u32>,
        #[arg(long)]
        water: Option<u32>,
    },

    /// Add water in millilitres
    Water {
        ml: u32,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record hours slept
    Sleep {
        hours: f32,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Record mood from 1 (awful) to 5 (great)
    Mood {
        mood: u8,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add calories eaten
    Calories {
        kcal: u32,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List meal plans, closest to your calorie goal first
    MealPlans {
        /// Compare against this many kcal instead of the calorie goal
        #[arg(long)]
        calories: Option<u32>,
    },

    /// Show the day's log against goals
    Today {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn main() -> Result<()> {
    fitquest_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let fq = FitQuest::new(Store::new(data_dir), config);

    let errors = fq.catalog().validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => cmd_dashboard(&fq),
        Commands::Exercises { body_part } => cmd_exercises(&fq, body_part.as_deref()),
        Commands::Timer { command } => cmd_timer(&fq, command),
        Commands::Workout { command } => cmd_workout(&fq, command),
        Commands::Xp { command } => cmd_xp(&fq, command),
        Commands::Goal { command } => cmd_goal(&fq, command),
        Commands::Nutrition { command } => cmd_nutrition(&fq, command),
        Commands::Articles { body_part } => cmd_articles(&fq, body_part.as_deref()),
        Commands::Achievements => cmd_achievements(&fq),
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn cmd_dashboard(fq: &FitQuest) -> Result<()> {
    let dash = fq.dashboard(today())?;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  LEVEL {} · {}", dash.level, dash.level_name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  XP: {} ({:.0}% to next level)",
        dash.total_xp,
        dash.level_progress * 100.0
    );
    println!("  Streak: {} days", dash.streak_days);
    println!("  Workouts logged: {}", dash.total_workouts);
    if let Some(last) = dash.last_workout {
        println!("  Last workout: {}", last);
    }
    if dash.outstanding_debt > 0 {
        println!("  ⚠ Outstanding penalty debt: {} XP", dash.outstanding_debt);
    }
    println!();
    println!("  Active goals: {}", dash.active_goals.len());
    for goal in &dash.active_goals {
        println!(
            "    → {} ({}): {}/{} workouts, week {}",
            goal.body_part_id,
            goal.plan_id,
            goal.completed_workouts,
            goal.total_workouts_needed,
            goal.week_number
        );
    }
    println!();
    println!(
        "  Water today: {} ml ({:.0}%)",
        dash.today.water_ml,
        dash.water_progress * 100.0
    );
    println!("  Achievements: {}/{}", dash.achievements_unlocked, ACHIEVEMENTS.len());
    println!();
    Ok(())
}

fn cmd_exercises(fq: &FitQuest, body_part: Option<&str>) -> Result<()> {
    let mut exercises: Vec<_> = fq
        .catalog()
        .exercises
        .values()
        .filter(|e| body_part.map_or(true, |b| e.body_parts.iter().any(|p| p == b)))
        .collect();
    exercises.sort_by(|a, b| a.id.cmp(&b.id));

    if exercises.is_empty() {
        println!("No exercises found.");
        return Ok(());
    }
    for e in exercises {
        println!(
            "  {:<20} {:<24} {:?}, rest {}s [{}]",
            e.id,
            e.name,
            e.equipment,
            e.default_rest_seconds,
            e.body_parts.join(", ")
        );
    }
    Ok(())
}

// ============================================================================
// Timer
// ============================================================================

/// Terminal bell for tones; terminals have no vibration motor
struct TerminalFeedback;

impl RestFeedback for TerminalFeedback {
    fn beep(&mut self, tones: &[Tone]) -> Result<()> {
        let mut out = io::stdout();
        for tone in tones {
            std::thread::sleep(Duration::from_millis(u64::from(tone.delay_ms)));
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        Ok(())
    }

    fn vibrate(&mut self, _pattern_ms: &[u32]) -> Result<()> {
        Err(Error::Other("vibration is not available in a terminal".into()))
    }
}

fn cmd_timer(fq: &FitQuest, command: TimerCommands) -> Result<()> {
    match command {
        TimerCommands::Start { seconds, quiet } => {
            let mut timer = fq.rest_timer()?;
            let mut feedback = TerminalFeedback;
            timer.start(seconds)?;

            let mut last_shown = None;
            loop {
                if let Some(RestTimerEvent::Finished { total_seconds }) =
                    timer.tick(&mut feedback)
                {
                    if !quiet {
                        println!("\r  Rest: 00:00");
                    }
                    println!("✓ Rest over ({}s). Next set!", total_seconds);
                    break;
                }

                let left = timer.state().time_left;
                if !quiet && last_shown != Some(left) {
                    print!("\r  Rest: {:02}:{:02}", left / 60, left % 60);
                    io::stdout().flush()?;
                    last_shown = Some(left);
                }
                std::thread::sleep(Duration::from_millis(TICK_INTERVAL_MS));
            }
            Ok(())
        }

        TimerCommands::Config {
            default_seconds,
            sound,
            vibration,
        } => {
            let mut cfg = fq.rest_timer_config()?;
            let changed = default_seconds.is_some() || sound.is_some() || vibration.is_some();
            if let Some(s) = default_seconds {
                cfg.default_seconds = s;
            }
            if let Some(s) = sound {
                cfg.sound_enabled = s;
            }
            if let Some(v) = vibration {
                cfg.vibration_enabled = v;
            }
            if changed {
                fq.set_rest_timer_config(&cfg)?;
                println!("✓ Rest timer preferences saved");
            }
            println!("  Default rest: {}s", cfg.default_seconds);
            println!("  Sound: {}", on_off(cfg.sound_enabled));
            println!("  Vibration: {}", on_off(cfg.vibration_enabled));
            Ok(())
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

// ============================================================================
// Workouts
// ============================================================================

fn cmd_workout(fq: &FitQuest, command: WorkoutCommands) -> Result<()> {
    match command {
        WorkoutCommands::Log {
            entries,
            duration_min,
            notes,
            date,
        } => {
            let exercises = entries
                .iter()
                .map(|e| parse::parse_entry(e))
                .collect::<Result<Vec<_>>>()?;

            let performed_at = match date {
                Some(day) => Utc.from_utc_datetime(
                    &day.and_hms_opt(12, 0, 0)
                        .ok_or_else(|| Error::Validation(format!("invalid date {}", day)))?,
                ),
                None => Utc::now(),
            };

            let mut session = WorkoutSession::new(performed_at, exercises);
            session.duration_seconds = duration_min
                .map(|m| {
                    m.checked_mul(60).ok_or_else(|| {
                        Error::Validation(format!("workout duration of {} minutes is too long", m))
                    })
                })
                .transpose()?;
            session.notes = notes;

            let summary = fq.complete_workout(session)?;
            display_summary(&summary);
            Ok(())
        }

        WorkoutCommands::History { limit } => {
            let sessions = fq.history()?;
            if sessions.is_empty() {
                println!("No workouts logged yet.");
                return Ok(());
            }
            for session in sessions.iter().rev().take(limit) {
                let names: Vec<_> = session
                    .exercises
                    .iter()
                    .map(|e| e.exercise_id.as_str())
                    .collect();
                println!(
                    "  {}  {} sets  {:.0} kg  [{}]  {}",
                    session.performed_at.format("%Y-%m-%d %H:%M"),
                    session.total_sets(),
                    session.total_volume_kg(),
                    names.join(", "),
                    session.id
                );
            }
            Ok(())
        }

        WorkoutCommands::Export { path } => {
            let count =
                fitquest_core::csv_export::export_history(&fq.store().history_path(), &path)?;
            println!("✓ Exported {} sets to CSV", count);
            println!("  CSV: {}", path.display());
            Ok(())
        }
    }
}

fn display_summary(summary: &WorkoutSummary) {
    println!("\n✓ Workout logged!");
    println!(
        "  {} sets, {:.0} kg volume, trained: {}",
        summary.total_sets,
        summary.volume_kg,
        summary.body_parts.join(", ")
    );
    println!(
        "  +{} XP (streak {} days) → {} XP total",
        summary.xp.xp, summary.streak_days, summary.xp.total_xp
    );
    if !summary.penalties.is_empty() {
        let lost: u64 = summary.penalties.iter().map(|p| p.xp_lost).sum();
        println!(
            "  ⚠ {} missed days charged before this workout (-{} XP)",
            summary.penalties.len(),
            lost
        );
    }
    if let Some(level) = summary.xp.new_level {
        println!("  ★ Level up! You are now level {} ({})", level, summary.level_name);
    }
    for update in &summary.goal_updates {
        if update.completed_now {
            println!("  ✓ Goal {} completed!", update.goal_id);
        } else {
            println!(
                "  → Goal {}: {} workouts done, week {}",
                update.goal_id, update.completed_workouts, update.week_number
            );
        }
    }
    for achievement in &summary.achievements {
        println!("  🏆 Achievement unlocked: {}", achievement.name);
    }
}

// ============================================================================
// XP
// ============================================================================

fn cmd_xp(fq: &FitQuest, command: XpCommands) -> Result<()> {
    match command {
        XpCommands::Show => {
            let profile = fq.xp_profile()?;
            println!(
                "  Level {} ({}), {} XP",
                profile.current_level, profile.level_name, profile.total_xp
            );
            if let Some(next) = fitquest_core::xp::next_level(profile.total_xp) {
                println!(
                    "  {} XP to level {} ({})",
                    next.min_xp - profile.total_xp,
                    next.level,
                    next.name
                );
            }
            println!("  Penalty streak: {}", profile.penalty_streak);

            let outstanding: Vec<_> = profile.outstanding_penalties().collect();
            if outstanding.is_empty() {
                println!("  No outstanding penalties.");
            } else {
                println!("  Outstanding penalties:");
                for p in outstanding {
                    println!("    {}  -{} XP  {}", p.id, p.xp_lost, p.description);
                }
            }
            Ok(())
        }

        XpCommands::Check { date } => {
            let created = fq.check_penalties(date.unwrap_or_else(today))?;
            if created.is_empty() {
                println!("✓ No new penalties.");
            } else {
                for p in &created {
                    println!("  ⚠ {}  -{} XP  {}", p.id, p.xp_lost, p.description);
                }
                println!("{} new penalties", created.len());
            }
            Ok(())
        }

        XpCommands::Resolve { penalty_id } => {
            match fq.resolve_penalty(penalty_id)? {
                PenaltyResolution::Refunded { xp } => {
                    println!("✓ Penalty resolved, {} XP refunded", xp)
                }
                PenaltyResolution::AlreadyResolved => {
                    println!("Penalty was already resolved.")
                }
            }
            Ok(())
        }
    }
}

// ============================================================================
// Goals
// ============================================================================

fn cmd_goal(fq: &FitQuest, command: GoalCommands) -> Result<()> {
    match command {
        GoalCommands::Plans { body_part } => {
            let mut plans: Vec<_> = fq
                .catalog()
                .plans
                .values()
                .filter(|p| body_part.as_deref().map_or(true, |b| p.body_part_id == b))
                .collect();
            plans.sort_by(|a, b| a.id.cmp(&b.id));
            for p in plans {
                println!(
                    "  {:<18} {:<18} {:<10} {} workouts over {} weeks",
                    p.id, p.name, p.body_part_id, p.total_workouts, p.weeks
                );
            }
            Ok(())
        }

        GoalCommands::Add {
            body_part,
            plan,
            start,
            target,
        } => {
            match fq.add_goal(&body_part, &plan, start, target)? {
                AddGoalOutcome::Added(id) => println!("✓ Goal added: {}", id),
                AddGoalOutcome::AlreadyTracked(id) => {
                    println!("A goal for {} is already active: {}", body_part, id)
                }
                AddGoalOutcome::LimitReached { active } => println!(
                    "Goal limit reached ({} active). Finish or remove one first.",
                    active
                ),
            }
            Ok(())
        }

        GoalCommands::List { all } => {
            let book = fq.goals()?;
            let goals: Vec<_> = book.goals.iter().filter(|g| all || g.is_active()).collect();
            if goals.is_empty() {
                println!("No goals.");
                return Ok(());
            }
            for g in goals {
                let rating = g
                    .user_rating
                    .map(|r| format!(" rated {}/5", r))
                    .unwrap_or_default();
                println!(
                    "  {}  {:<10} {:<18} {:?}  {}/{} workouts  week {}  progress {:.0}{}",
                    g.id,
                    g.body_part_id,
                    g.plan_id,
                    g.status,
                    g.completed_workouts,
                    g.total_workouts_needed,
                    g.week_number,
                    g.current_progress(),
                    rating
                );
            }
            Ok(())
        }

        GoalCommands::Workout { goal_id } => {
            let update = fq.increment_goal(goal_id)?;
            if update.completed_now {
                println!("✓ Goal completed!");
            } else {
                println!(
                    "  {} workouts done, week {}",
                    update.completed_workouts, update.week_number
                );
            }
            Ok(())
        }

        GoalCommands::Remove { goal_id } => {
            if fq.remove_goal(goal_id)? {
                println!("✓ Goal abandoned");
            } else {
                println!("Goal is already finished.");
            }
            Ok(())
        }

        GoalCommands::Rate { goal_id, rating } => {
            fq.rate_goal(goal_id, rating)?;
            println!("✓ Rated {}/5", rating);
            Ok(())
        }
    }
}

// ============================================================================
// Nutrition
// ============================================================================

fn cmd_nutrition(fq: &FitQuest, command: NutritionCommands) -> Result<()> {
    match command {
        NutritionCommands::Goals {
            calories,
            protein,
            carbs,
            fat,
            water,
        } => {
            let patch = NutrientGoalsPatch {
                calories,
                protein_g: protein,
                carbs_g: carbs,
                fat_g: fat,
                water_ml: water,
            };
            let goals = if patch.is_empty() {
                fq.nutrient_goals()?
            } else {
                let goals = fq.update_nutrient_goals(&patch)?;
                println!("✓ Nutrient goals updated");
                goals
            };
            println!("  Calories: {} kcal", goals.calories);
            println!("  Protein: {} g", goals.protein_g);
            println!("  Carbs: {} g", goals.carbs_g);
            println!("  Fat: {} g", goals.fat_g);
            println!("  Water: {} ml", goals.water_ml);
            Ok(())
        }

        NutritionCommands::Water { ml, date } => {
            let total = fq.add_water(date.unwrap_or_else(today), ml)?;
            println!("✓ Water today: {} ml", total);
            Ok(())
        }

        NutritionCommands::Sleep { hours, date } => {
            fq.log_sleep(date.unwrap_or_else(today), hours)?;
            println!("✓ Sleep logged: {} h", hours);
            Ok(())
        }

        NutritionCommands::Mood { mood, date } => {
            fq.log_mood(date.unwrap_or_else(today), mood)?;
            println!("✓ Mood logged: {}/5", mood);
            Ok(())
        }

        NutritionCommands::Calories { kcal, date } => {
            let total = fq.add_calories(date.unwrap_or_else(today), kcal)?;
            println!("✓ Calories today: {} kcal", total);
            Ok(())
        }

        NutritionCommands::MealPlans { calories } => {
            let calories = match calories {
                Some(c) => c,
                None => fq.nutrient_goals()?.calories,
            };
            for m in fq.catalog().meal_plans_near(calories) {
                println!(
                    "  {:<22} {:<22} {} kcal  P{} C{} F{}",
                    m.id, m.name, m.calories, m.protein_g, m.carbs_g, m.fat_g
                );
                println!("      {}", m.meals.join(" · "));
            }
            Ok(())
        }

        NutritionCommands::Today { date } => {
            let date = date.unwrap_or_else(today);
            let log = fq.daily_log(date)?;
            let goals = fq.nutrient_goals()?;
            println!("  {}", date);
            println!("  Calories: {}/{} kcal", log.calories, goals.calories);
            println!("  Water: {}/{} ml", log.water_ml, goals.water_ml);
            match log.sleep_hours {
                Some(h) => println!("  Sleep: {} h", h),
                None => println!("  Sleep: -"),
            }
            match log.mood {
                Some(m) => println!("  Mood: {}/5", m),
                None => println!("  Mood: -"),
            }
            Ok(())
        }
    }
}

fn cmd_articles(fq: &FitQuest, body_part: Option<&str>) -> Result<()> {
    let articles = fq.catalog().articles_for(body_part);
    if articles.is_empty() {
        println!("No articles found.");
        return Ok(());
    }
    for a in articles {
        println!(
            "  {:<22} {} ({:?}, {} min)",
            a.id, a.title, a.category, a.read_minutes
        );
        println!("      {}", a.summary);
    }
    Ok(())
}

fn cmd_achievements(fq: &FitQuest) -> Result<()> {
    let unlocked = fq.achievements()?;
    for a in &ACHIEVEMENTS {
        match unlocked.unlocked.get(a.id) {
            Some(at) => println!(
                "  🏆 {:<22} {} (unlocked {})",
                a.name,
                a.description,
                at.format("%Y-%m-%d")
            ),
            None => println!("  ·  {:<22} {}", a.name, a.description),
        }
    }
    Ok(())
}
