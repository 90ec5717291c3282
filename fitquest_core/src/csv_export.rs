//! CSV export of the workout history.
//!
//! One row per performed set. The export is written to a temp file in the
//! destination directory, fsynced, then renamed into place, so a reader never
//! sees a half-written file.

use crate::{Error, Result, WorkoutSession};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    workout_id: String,
    performed_at: String,
    exercise_id: &'a str,
    set_number: usize,
    reps: u32,
    weight_kg: Option<f32>,
    rpe: Option<u8>,
    duration_seconds: Option<u32>,
}

/// Flatten sessions into set rows
fn rows(sessions: &[WorkoutSession]) -> impl Iterator<Item = CsvRow<'_>> {
    sessions.iter().flat_map(|session| {
        session.exercises.iter().flat_map(move |exercise| {
            exercise.sets.iter().enumerate().map(move |(idx, set)| CsvRow {
                workout_id: session.id.to_string(),
                performed_at: session.performed_at.to_rfc3339(),
                exercise_id: &exercise.exercise_id,
                set_number: idx + 1,
                reps: set.reps,
                weight_kg: set.weight_kg,
                rpe: set.rpe,
                duration_seconds: session.duration_seconds,
            })
        })
    })
}

/// Export the workout history at `history_path` to `csv_path`
///
/// Returns the number of set rows written. An empty history still produces
/// a file with only the header row.
pub fn export_history(history_path: &Path, csv_path: &Path) -> Result<usize> {
    let sessions = crate::history::read_sessions(history_path)?;
    export_sessions(&sessions, csv_path)
}

/// Export already-loaded sessions to `csv_path`
pub fn export_sessions(sessions: &[WorkoutSession], csv_path: &Path) -> Result<usize> {
    let dir = match csv_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&dir)?;

    let temp = NamedTempFile::new_in(&dir)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(temp.as_file());

    writer.write_record([
        "workout_id",
        "performed_at",
        "exercise_id",
        "set_number",
        "reps",
        "weight_kg",
        "rpe",
        "duration_seconds",
    ])?;

    let mut count = 0;
    for row in rows(sessions) {
        writer.serialize(row)?;
        count += 1;
    }

    writer.flush()?;
    drop(writer);
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} sets to {:?}", count, csv_path);
    Ok(count)
}
