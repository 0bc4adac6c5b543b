/// Tables for exercises, their trackers, workouts and workout values.
///
/// Deleting an exercise removes its trackers and workouts; deleting a workout
/// removes its values. Both rely on `PRAGMA foreign_keys = ON`.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS trackers (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    name        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trackers_exercise ON trackers(exercise_id);

CREATE TABLE IF NOT EXISTS workouts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    date        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_workouts_exercise ON workouts(exercise_id);

CREATE TABLE IF NOT EXISTS workout_values (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    value      INTEGER NOT NULL,
    "group"    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_workout_values_workout ON workout_values(workout_id);
"#;
