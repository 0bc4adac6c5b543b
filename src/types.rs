//! # Common Types
//!
//! This module contains the relational entities stored for every exercise log,
//! the grouped shape the rest of the application works with, and the series
//! selector chosen in the UI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-defined activity, e.g. "Bench Press".
///
/// Deleting an exercise removes its trackers and workouts with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exercise {
    /// Row id assigned by the store
    pub id: i64,
    /// Display name, unique across all exercises
    pub name: String,
}

/// One named numeric field an exercise's workouts record, e.g. "Weight".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tracker {
    /// Row id assigned by the store
    pub id: i64,
    /// The exercise this tracker belongs to
    pub exercise_id: i64,
    /// Name shown next to the value field and used as the series name
    pub name: String,
}

/// One logged session for an exercise on a given date.
///
/// Several workouts may share the same exercise and date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    /// Row id assigned by the store; later workouts have larger ids
    pub id: i64,
    /// The exercise that was performed
    pub exercise_id: i64,
    /// Day the workout was logged for
    pub date: NaiveDate,
}

/// One tracker's recorded value within a workout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutValue {
    /// Row id assigned by the store; the only handle used for edits
    pub id: i64,
    /// The workout this value was recorded in
    pub workout_id: i64,
    /// Tracker name the value was entered for
    pub name: String,
    /// Recorded amount; the only field that can change after insert
    pub value: i64,
    /// Insert batch id shared by all values written together for one workout.
    /// Kept for schema compatibility; nothing reads it.
    pub group: i64,
}

/// A flattened workout/value join row, as returned by the date-range query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutRow {
    /// The workout side of the join, repeated for each of its values
    pub workout: Workout,
    /// One value of that workout
    pub value: WorkoutValue,
}

/// A workout together with its values, in store order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub workout: Workout,
    /// Values in insertion order
    pub values: Vec<WorkoutValue>,
}

/// Which series the chart shows.
///
/// Decided once at the UI boundary with [`Selector::from_choice`]; nothing
/// deeper in the pipeline compares strings against mode names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// One series per tracker name.
    #[default]
    ByTracker,
    /// A single "Additive" series holding the per-workout sum.
    Sum,
    /// A single "Multiplied" series holding the per-workout product.
    Product,
    /// Only the values of the named tracker.
    Named(String),
}

impl Selector {
    /// The aggregation modes offered ahead of the tracker names, in menu order.
    pub const MODES: [Selector; 3] = [Selector::ByTracker, Selector::Sum, Selector::Product];

    /// Parse a menu choice. Reserved mode names win over tracker names.
    pub fn from_choice(choice: &str) -> Self {
        match choice {
            "ByTracker" => Selector::ByTracker,
            "Sum" => Selector::Sum,
            "Product" => Selector::Product,
            name => Selector::Named(name.to_string()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::ByTracker => write!(f, "ByTracker"),
            Selector::Sum => write!(f, "Sum"),
            Selector::Product => write!(f, "Product"),
            Selector::Named(name) => write!(f, "{}", name),
        }
    }
}
