pub mod logbook;

pub use logbook::{
    create_exercise, edited_value, exercise_trackers, fetch_workouts, group_rows, log_workout,
    parse_value, sanitize_value_input, update_workout_values,
};
