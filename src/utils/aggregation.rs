use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Selector, WorkoutEntry};

/// Name of the series produced by [`Selector::Sum`].
pub const SUM_SERIES: &str = "Additive";
/// Name of the series produced by [`Selector::Product`].
pub const PRODUCT_SERIES: &str = "Multiplied";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: i64,
}

/// A named, date-ordered sequence of points ready for plotting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }
}

/// Series with `name`, created at the end of the list the first time it is seen.
fn series_entry<'a>(series: &'a mut Vec<NamedSeries>, name: &str) -> &'a mut NamedSeries {
    let idx = match series.iter().position(|s| s.name == name) {
        Some(idx) => idx,
        None => {
            series.push(NamedSeries::new(name));
            series.len() - 1
        }
    };
    &mut series[idx]
}

/// Reshape workouts into named series according to `selector`.
///
/// Workouts are processed in the given order and each one appends at most one
/// point per series, so two workouts on the same date stay separate points.
/// Series appear in the order their names are first seen.
pub fn aggregate_series(entries: &[WorkoutEntry], selector: &Selector) -> Vec<NamedSeries> {
    let mut series = Vec::new();

    for entry in entries {
        let date = entry.workout.date;
        match selector {
            Selector::ByTracker => {
                for value in &entry.values {
                    series_entry(&mut series, &value.name)
                        .points
                        .push(SeriesPoint { date, value: value.value });
                }
            }
            Selector::Sum => {
                let sum = entry
                    .values
                    .iter()
                    .fold(0i64, |acc, v| acc.saturating_add(v.value));
                series_entry(&mut series, SUM_SERIES)
                    .points
                    .push(SeriesPoint { date, value: sum });
            }
            Selector::Product => {
                let product = entry
                    .values
                    .iter()
                    .fold(1i64, |acc, v| acc.saturating_mul(v.value));
                series_entry(&mut series, PRODUCT_SERIES)
                    .points
                    .push(SeriesPoint { date, value: product });
            }
            Selector::Named(tracker) => {
                // workouts without this tracker contribute nothing
                for value in entry.values.iter().filter(|v| &v.name == tracker) {
                    series_entry(&mut series, &value.name)
                        .points
                        .push(SeriesPoint { date, value: value.value });
                }
            }
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Workout, WorkoutValue};
    use pretty_assertions::assert_eq;

    fn entry(id: i64, date: &str, values: &[(&str, i64)]) -> WorkoutEntry {
        WorkoutEntry {
            workout: Workout {
                id,
                exercise_id: 1,
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            },
            values: values
                .iter()
                .enumerate()
                .map(|(i, (name, value))| WorkoutValue {
                    id: id * 100 + i as i64,
                    workout_id: id,
                    name: name.to_string(),
                    value: *value,
                    group: id,
                })
                .collect(),
        }
    }

    fn point(date: &str, value: i64) -> SeriesPoint {
        SeriesPoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            value,
        }
    }

    fn sample() -> Vec<WorkoutEntry> {
        vec![
            entry(1, "2024-01-01", &[("Weight", 100), ("Reps", 5)]),
            entry(2, "2024-01-03", &[("Weight", 105), ("Reps", 4)]),
            entry(3, "2024-01-05", &[("Reps", 8)]),
        ]
    }

    #[test]
    fn test_empty_input() {
        for selector in [Selector::ByTracker, Selector::Sum, Selector::Product] {
            assert!(aggregate_series(&[], &selector).is_empty());
        }
    }

    #[test]
    fn test_by_tracker() {
        let result = aggregate_series(&sample(), &Selector::ByTracker);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].name, "Weight");
        assert_eq!(
            result[0].points,
            vec![point("2024-01-01", 100), point("2024-01-03", 105)]
        );
        assert_eq!(result[1].name, "Reps");
        assert_eq!(
            result[1].points,
            vec![point("2024-01-01", 5), point("2024-01-03", 4), point("2024-01-05", 8)]
        );
    }

    #[test]
    fn test_sum() {
        let result = aggregate_series(&sample(), &Selector::Sum);
        assert_eq!(
            result,
            vec![NamedSeries {
                name: SUM_SERIES.to_string(),
                points: vec![
                    point("2024-01-01", 105),
                    point("2024-01-03", 109),
                    point("2024-01-05", 8),
                ],
            }]
        );
    }

    #[test]
    fn test_product() {
        let mut entries = sample();
        entries.push(entry(4, "2024-01-06", &[]));

        let result = aggregate_series(&entries, &Selector::Product);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, PRODUCT_SERIES);
        let values: Vec<i64> = result[0].points.iter().map(|p| p.value).collect();
        // an empty workout multiplies to the identity
        assert_eq!(values, vec![500, 420, 8, 1]);
    }

    #[test]
    fn test_sum_of_empty_workout_is_zero() {
        let result = aggregate_series(&[entry(1, "2024-01-01", &[])], &Selector::Sum);
        assert_eq!(result[0].points, vec![point("2024-01-01", 0)]);
    }

    #[test]
    fn test_product_saturates() {
        let entries = vec![entry(1, "2024-01-01", &[("A", i64::MAX), ("B", 2)])];
        let result = aggregate_series(&entries, &Selector::Product);
        assert_eq!(result[0].points[0].value, i64::MAX);
    }

    #[test]
    fn test_single_tracker_skips_missing() {
        let entries = vec![
            entry(1, "2024-01-01", &[("Weight", 100), ("Reps", 5)]),
            entry(2, "2024-01-02", &[("Reps", 6)]),
        ];
        let result = aggregate_series(&entries, &Selector::Named("Weight".to_string()));
        assert_eq!(
            result,
            vec![NamedSeries {
                name: "Weight".to_string(),
                points: vec![point("2024-01-01", 100)],
            }]
        );
    }

    #[test]
    fn test_unknown_tracker_is_empty() {
        let result = aggregate_series(&sample(), &Selector::Named("Tempo".to_string()));
        assert!(result.is_empty());
    }

    #[test]
    fn test_same_date_workouts_stay_separate() {
        let entries = vec![
            entry(2, "2024-01-01", &[("X", 10)]),
            entry(1, "2024-01-01", &[("X", 30)]),
        ];
        let result = aggregate_series(&entries, &Selector::ByTracker);
        assert_eq!(
            result[0].points,
            vec![point("2024-01-01", 10), point("2024-01-01", 30)]
        );
    }

    #[test]
    fn test_point_counts_match_workouts() {
        let entries = sample();
        let sum = aggregate_series(&entries, &Selector::Sum);
        assert_eq!(sum[0].points.len(), entries.len());

        let by_tracker = aggregate_series(&entries, &Selector::ByTracker);
        for series in &by_tracker {
            let containing = entries
                .iter()
                .filter(|e| e.values.iter().any(|v| v.name == series.name))
                .count();
            assert_eq!(series.points.len(), containing);
        }
    }
}
