use chrono::{Datelike, Local, Months, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::watch;

use super::observable::Observable;
use crate::error::Result;
use crate::types::{Selector, Workout, WorkoutEntry, WorkoutValue};
use crate::utils::{aggregate_series, NamedSeries};

pub const MIN_ZOOM: f64 = 0.7;
pub const MAX_ZOOM: f64 = 15.0;

/// Everything the chart screen shows, in a form that survives a process restart.
///
/// Workouts and their values are kept as parallel lists so the grouping order
/// from the store is preserved exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    /// First day of the month being viewed
    pub date: NaiveDate,
    pub selected_exercise: Option<String>,
    pub selected_series: Option<Selector>,
    pub workouts: Vec<Workout>,
    pub workout_values_per_workout: Vec<Vec<WorkoutValue>>,
    pub exercise_names: Vec<String>,
    pub tracker_names: Vec<String>,
    pub zoom_scale: f64,
    /// Horizontal pan offset in pixels
    pub zoom_center_x: f64,
}

impl ViewSnapshot {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            date: first_of_month(anchor),
            selected_exercise: None,
            selected_series: None,
            workouts: Vec::new(),
            workout_values_per_workout: Vec::new(),
            exercise_names: Vec::new(),
            tracker_names: Vec::new(),
            zoom_scale: 1.0,
            zoom_center_x: 0.0,
        }
    }

    /// Rebuild the workout/value grouping.
    pub fn entries(&self) -> Vec<WorkoutEntry> {
        self.workouts
            .iter()
            .zip(self.workout_values_per_workout.iter())
            .map(|(workout, values)| WorkoutEntry {
                workout: workout.clone(),
                values: values.clone(),
            })
            .collect()
    }

    fn set_entries(&mut self, entries: Vec<WorkoutEntry>) {
        let (workouts, values) = entries.into_iter().map(|e| (e.workout, e.values)).unzip();
        self.workouts = workouts;
        self.workout_values_per_workout = values;
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// Shift by whole months; `None` if the result leaves chrono's date range.
pub fn shift_months(date: NaiveDate, delta: i32) -> Option<NaiveDate> {
    if delta >= 0 {
        date.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(delta.unsigned_abs()))
    }
}

/// Identifies the selection a fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub exercise: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// What a completed fetch brings back from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub entries: Vec<WorkoutEntry>,
    pub tracker_names: Vec<String>,
}

/// The chart screen's state: selection, date window, cached workouts and zoom/pan.
///
/// Every mutation is published to subscribers as a whole [`ViewSnapshot`].
#[derive(Debug)]
pub struct ViewState {
    snapshot: Observable<ViewSnapshot>,
    next_generation: u64,
    applied_generation: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

impl ViewState {
    /// Start on the month containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self::restore(ViewSnapshot::new(today))
    }

    pub fn restore(snapshot: ViewSnapshot) -> Self {
        Self {
            snapshot: Observable::new(snapshot),
            next_generation: 0,
            applied_generation: 0,
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot.subscribe()
    }

    /// `[first of month, first of next month)`
    pub fn date_window(&self) -> (NaiveDate, NaiveDate) {
        let start = self.snapshot.with(|s| s.date);
        let end = shift_months(start, 1).unwrap_or(start);
        (start, end)
    }

    pub fn selected_exercise(&self) -> Option<String> {
        self.snapshot.with(|s| s.selected_exercise.clone())
    }

    pub fn selected_series(&self) -> Option<Selector> {
        self.snapshot.with(|s| s.selected_series.clone())
    }

    pub fn zoom_scale(&self) -> f64 {
        self.snapshot.with(|s| s.zoom_scale)
    }

    pub fn pan_offset(&self) -> f64 {
        self.snapshot.with(|s| s.zoom_center_x)
    }

    /// Move the window by whole months.
    pub fn set_date_window(&mut self, month_delta: i32) {
        let current = self.snapshot.with(|s| s.date);
        match shift_months(current, month_delta) {
            Some(date) => self.set_anchor_date(date),
            None => warn!("Month shift {} from {} is out of range", month_delta, current),
        }
    }

    /// Jump to the month containing `date`. Loaded workouts are dropped when
    /// the month changes since they no longer belong to the window.
    pub fn set_anchor_date(&mut self, date: NaiveDate) {
        let date = first_of_month(date);
        let changed = self.snapshot.with(|s| s.date != date);
        self.snapshot.update(|s| {
            if changed {
                s.set_entries(Vec::new());
            }
            s.date = date;
        });
        self.invalidate();
    }

    /// Select an exercise. Changing it drops the series choice, the tracker
    /// names and the loaded workouts, which all belonged to the old exercise.
    pub fn select_exercise(&mut self, name: &str) {
        let changed = self.snapshot.with(|s| s.selected_exercise.as_deref() != Some(name));
        self.snapshot.update(|s| {
            if changed {
                s.selected_series = None;
                s.tracker_names.clear();
                s.set_entries(Vec::new());
            }
            s.selected_exercise = Some(name.to_string());
        });
        self.invalidate();
    }

    pub fn select_series(&mut self, selector: Selector) {
        self.snapshot.update(|s| s.selected_series = Some(selector));
    }

    /// Zoom is clamped to `[MIN_ZOOM, MAX_ZOOM]`; NaN is ignored.
    pub fn set_zoom(&mut self, scale: f64) {
        if scale.is_nan() {
            return;
        }
        let scale = scale.clamp(MIN_ZOOM, MAX_ZOOM);
        self.snapshot.update(|s| s.zoom_scale = scale);
    }

    pub fn multiply_zoom(&mut self, factor: f64) {
        self.set_zoom(self.zoom_scale() * factor);
    }

    /// Pan is unbounded; points pushed off the canvas are culled when drawn.
    /// A delta that would leave the offset non-finite is dropped.
    pub fn pan_by(&mut self, delta_x: f64) {
        let panned = self.pan_offset() + delta_x;
        if !panned.is_finite() {
            debug!("Ignoring pan by {} from {}", delta_x, self.pan_offset());
            return;
        }
        self.snapshot.update(|s| s.zoom_center_x = panned);
    }

    pub fn reset_view(&mut self) {
        self.snapshot.update(|s| {
            s.zoom_scale = 1.0;
            s.zoom_center_x = 0.0;
        });
    }

    /// Store the exercise list, choosing the first one when nothing valid is selected.
    pub fn set_exercise_names(&mut self, names: Vec<String>) {
        let needs_default = self.snapshot.with(|s| match &s.selected_exercise {
            None => true,
            Some(selected) => !names.contains(selected),
        });
        let fallback = names.first().cloned();
        self.snapshot.update(|s| s.exercise_names = names);

        if needs_default {
            if let Some(name) = fallback {
                debug!("Defaulting exercise selection to '{}'", name);
                self.select_exercise(&name);
            }
        }
    }

    fn invalidate(&mut self) {
        self.next_generation += 1;
    }

    /// Tag a fetch with the current selection.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.next_generation += 1;
        let (start, end) = self.date_window();
        FetchTicket {
            generation: self.next_generation,
            exercise: self.selected_exercise(),
            start,
            end,
        }
    }

    /// Whether a fetch issued with `ticket` still describes what is selected.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        let (start, end) = self.date_window();
        ticket.generation > self.applied_generation
            && ticket.exercise == self.selected_exercise()
            && ticket.start == start
            && ticket.end == end
    }

    /// Apply a completed fetch unless the selection has moved on since it was
    /// issued, or a newer fetch already landed. Returns whether it was applied.
    pub fn apply_fetch(&mut self, ticket: &FetchTicket, result: FetchResult) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale fetch #{} for {:?}",
                ticket.generation, ticket.exercise
            );
            return false;
        }
        self.applied_generation = ticket.generation;
        self.snapshot.update(|s| {
            s.set_entries(result.entries);
            s.tracker_names = result.tracker_names;
            if s.selected_series.is_none() {
                s.selected_series = Some(Selector::default());
            }
        });
        true
    }

    /// The reserved aggregation modes followed by the selected exercise's trackers.
    pub fn series_options(&self) -> Vec<Selector> {
        let mut options = Selector::MODES.to_vec();
        self.snapshot.with(|s| {
            options.extend(s.tracker_names.iter().cloned().map(Selector::Named));
        });
        options
    }

    /// Series for the current selection, ready for the chart.
    pub fn series(&self) -> Vec<NamedSeries> {
        self.snapshot.with(|s| {
            let selector = s.selected_series.clone().unwrap_or_default();
            aggregate_series(&s.entries(), &selector)
        })
    }
}
