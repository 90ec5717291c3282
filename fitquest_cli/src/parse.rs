//! Parsing of compact workout entries from the command line.
//!
//! An entry is `EXERCISE:SET[,SET...]` where a set is `REPS[xKG][@RPE]`,
//! e.g. `bench_press:8x60@7,6x65@9` or `plank:1`.

use fitquest_core::{Error, ExerciseLog, Result, SetLog};

pub fn parse_entry(entry: &str) -> Result<ExerciseLog> {
    let (exercise_id, sets) = entry.split_once(':').ok_or_else(|| {
        Error::Validation(format!(
            "expected EXERCISE:SETS (e.g. bench_press:8x60@7), got '{}'",
            entry
        ))
    })?;

    let exercise_id = exercise_id.trim();
    if exercise_id.is_empty() {
        return Err(Error::Validation(format!("missing exercise in '{}'", entry)));
    }

    let sets = sets
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_set)
        .collect::<Result<Vec<_>>>()?;

    Ok(ExerciseLog {
        exercise_id: exercise_id.to_string(),
        sets,
    })
}

pub fn parse_set(set: &str) -> Result<SetLog> {
    let bad = |what: &str| Error::Validation(format!("invalid {} in set '{}'", what, set));

    let (body, rpe) = match set.split_once('@') {
        Some((body, rpe)) => (body, Some(rpe.trim().parse::<u8>().map_err(|_| bad("RPE"))?)),
        None => (set, None),
    };

    let (reps, weight_kg) = match body.split_once(['x', 'X']) {
        Some((reps, weight)) => (
            reps,
            Some(weight.trim().parse::<f32>().map_err(|_| bad("weight"))?),
        ),
        None => (body, None),
    };

    let reps = reps.trim().parse::<u32>().map_err(|_| bad("reps"))?;
    Ok(SetLog {
        reps,
        weight_kg,
        rpe,
    })
}
