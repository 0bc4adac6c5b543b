use chrono::NaiveDate;
use log::{error, info, warn};
use std::collections::HashMap;

use crate::error::{Result, ValidationError};
use crate::store::Store;
use crate::types::{WorkoutEntry, WorkoutRow, WorkoutValue};

/// Keep only the digits of a value typed into a tracker field.
pub fn sanitize_value_input(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parse a tracker value, falling back to 0 when it does not fit.
pub fn parse_value(raw: &str) -> i64 {
    sanitize_value_input(raw).parse().unwrap_or(0)
}

/// Value to store for an edited field; text that does not parse keeps `current`.
pub fn edited_value(raw: &str, current: i64) -> i64 {
    raw.trim().parse().unwrap_or(current)
}

/// Create an exercise and its trackers.
///
/// Nothing is written when the name or any tracker name is empty. A duplicate
/// exercise name is rejected by the store. Individual tracker inserts that fail
/// are logged and skipped.
pub async fn create_exercise(store: &Store, name: &str, trackers: &[String]) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyExerciseName.into());
    }
    if trackers.is_empty() {
        return Err(ValidationError::NoTrackers.into());
    }
    if trackers.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::EmptyTrackerName.into());
    }

    let exercise_id = store.insert_exercise(name).await.map_err(|e| {
        warn!("Failed to create exercise '{}': {}", name, e);
        e
    })?;

    for tracker in trackers {
        if let Err(e) = store.insert_tracker(exercise_id, tracker).await {
            error!("Failed to insert tracker '{}' for '{}': {}", tracker, name, e);
        }
    }

    info!("Created exercise '{}' with {} trackers", name, trackers.len());
    Ok(exercise_id)
}

/// Log one workout for `exercise` with one `(tracker, raw value)` pair per tracker.
///
/// Returns `Ok(None)` when the exercise does not exist. Every tracker of the
/// exercise needs a non-empty value, otherwise nothing is written. All values
/// share a fresh group id; a value insert that fails is logged and skipped.
pub async fn log_workout(
    store: &Store,
    exercise: &str,
    date: NaiveDate,
    fields: &[(String, String)],
) -> Result<Option<i64>> {
    if exercise.is_empty() {
        return Err(ValidationError::NoExerciseSelected.into());
    }
    if let Some((tracker, _)) = fields.iter().find(|(_, raw)| raw.is_empty()) {
        return Err(ValidationError::MissingValue(tracker.clone()).into());
    }

    let Some(exercise_id) = store.get_exercise_id_by_name(exercise).await? else {
        warn!("Cannot log workout: no exercise named '{}'", exercise);
        return Ok(None);
    };

    let trackers = store.get_trackers_for_exercise(exercise_id).await?;
    if let Some(missing) = trackers
        .iter()
        .find(|tracker| !fields.iter().any(|(name, _)| name == *tracker))
    {
        return Err(ValidationError::MissingValue(missing.clone()).into());
    }

    let group = store.get_next_group_id().await?;
    let workout_id = store.insert_workout(exercise_id, date).await?;

    let mut written = 0;
    for (tracker, raw) in fields {
        match store
            .insert_workout_value(workout_id, tracker, parse_value(raw), group)
            .await
        {
            Ok(_) => written += 1,
            Err(e) => error!("Failed to insert value for '{}': {}", tracker, e),
        }
    }

    info!(
        "Logged {} workout on {} ({}/{} values)",
        exercise,
        date,
        written,
        fields.len()
    );
    Ok(Some(workout_id))
}

/// Group joined rows by workout, keeping the first-seen workout order and each
/// workout's value order.
pub fn group_rows(rows: Vec<WorkoutRow>) -> Vec<WorkoutEntry> {
    let mut entries: Vec<WorkoutEntry> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let idx = *index.entry(row.workout.id).or_insert_with(|| {
            entries.push(WorkoutEntry {
                workout: row.workout.clone(),
                values: Vec::new(),
            });
            entries.len() - 1
        });
        entries[idx].values.push(row.value);
    }

    entries
}

/// Workouts of `exercise` with `start <= date < end`, grouped with their values.
pub async fn fetch_workouts(
    store: &Store,
    exercise: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<WorkoutEntry>> {
    let rows = store.get_workouts_in_range(exercise, start, end).await?;
    Ok(group_rows(rows))
}

/// Tracker names of an exercise; empty when the exercise does not exist.
pub async fn exercise_trackers(store: &Store, exercise: &str) -> Result<Vec<String>> {
    match store.get_exercise_id_by_name(exercise).await? {
        Some(id) => Ok(store.get_trackers_for_exercise(id).await?),
        None => Ok(Vec::new()),
    }
}

/// Write back edited values one row at a time. Returns how many rows changed.
pub async fn update_workout_values(store: &Store, values: &[WorkoutValue]) -> Result<usize> {
    let mut updated = 0;
    for value in values {
        updated += store.update_workout_value(value.id, value.value).await?;
    }
    Ok(updated)
}
