//! Workout history: an append-only JSON Lines log with file locking.
//!
//! Sessions are appended one per line; readers skip corrupted lines with a
//! warning instead of failing.

use crate::{Result, WorkoutSession};
use chrono::{Duration, NaiveDate};
use fs2::FileExt;
use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink for finished workouts
pub trait WorkoutSink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()>;
}

/// JSONL-based workout sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl WorkoutSink for JsonlSink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended workout {} to history", session.id);
        Ok(())
    }
}

/// Read all workouts from a history file, oldest first
pub fn read_sessions(path: &Path) -> Result<Vec<WorkoutSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse workout at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    sessions.sort_by(|a, b| a.performed_at.cmp(&b.performed_at));
    tracing::debug!("Read {} workouts from history", sessions.len());
    Ok(sessions)
}

/// Day of the most recent workout
pub fn last_workout_day(sessions: &[WorkoutSession]) -> Option<NaiveDate> {
    sessions
        .iter()
        .map(|s| s.performed_at.date_naive())
        .max()
}

/// Number of consecutive training days ending today, or yesterday if
/// today has no workout yet. Returns 0 when the chain is broken.
pub fn training_streak(sessions: &[WorkoutSession], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = sessions
        .iter()
        .map(|s| s.performed_at.date_naive())
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseLog, SetLog};
    use chrono::{TimeZone, Utc};

    fn session_on(day: NaiveDate) -> WorkoutSession {
        let at = Utc.from_utc_datetime(&day.and_hms_opt(18, 0, 0).unwrap());
        WorkoutSession::new(
            at,
            vec![ExerciseLog {
                exercise_id: "push_up".into(),
                sets: vec![SetLog {
                    reps: 15,
                    weight_kg: None,
                    rpe: Some(7),
                }],
            }],
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_append_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history/workout_history.jsonl");

        let mut sink = JsonlSink::new(&path);
        let later = session_on(day(5));
        let earlier = session_on(day(2));
        sink.append(&later).unwrap();
        sink.append(&earlier).unwrap();

        let sessions = read_sessions(&path).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, earlier.id, "sorted oldest first");
    }

    #[test]
    fn test_read_missing_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let sessions = read_sessions(&temp_dir.path().join("none.jsonl")).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_corrupted_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("workout_history.jsonl");

        let mut sink = JsonlSink::new(&path);
        sink.append(&session_on(day(1))).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not a workout").unwrap();
        }
        sink.append(&session_on(day(2))).unwrap();

        assert_eq!(read_sessions(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let sessions = vec![session_on(day(8)), session_on(day(9)), session_on(day(10))];
        assert_eq!(training_streak(&sessions, day(10)), 3);
    }

    #[test]
    fn test_streak_allows_today_to_be_pending() {
        let sessions = vec![session_on(day(8)), session_on(day(9))];
        assert_eq!(training_streak(&sessions, day(10)), 2);
    }

    #[test]
    fn test_streak_broken_by_gap() {
        let sessions = vec![session_on(day(3)), session_on(day(5)), session_on(day(5))];
        assert_eq!(training_streak(&sessions, day(5)), 1);
        assert_eq!(training_streak(&sessions, day(8)), 0);
    }

    #[test]
    fn test_last_workout_day() {
        assert_eq!(last_workout_day(&[]), None);
        let sessions = vec![session_on(day(4)), session_on(day(2))];
        assert_eq!(last_workout_day(&sessions), Some(day(4)));
    }
}
