use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::{FetchResult, FetchTicket, ViewSnapshot, ViewState};
use crate::analysis;
use crate::error::{Error, Result};
use crate::plotting::{
    apply_transform, compute_geometry, render_key, ChartGeometry, ChartLayout, ChartStyle,
    ChartTheme, LabelMeasure, PlotCache, TransformDelta, Viewport,
};
use crate::store::Store;
use crate::types::{Selector, WorkoutValue};

/// The store handle and the view state it feeds.
///
/// Cloning is cheap and every clone shares the same state. The state lock is
/// never held across an `.await`, so gesture handling and redraws never wait
/// on the store.
#[derive(Clone)]
pub struct Session {
    store: Store,
    state: Arc<Mutex<ViewState>>,
    plots: Arc<PlotCache>,
}

/// Rendered charts kept by a new session until [`Session::with_render_cache`] says otherwise.
const DEFAULT_RENDER_CACHE: usize = 10;

impl Session {
    pub fn new(store: Store, state: ViewState) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(state)),
            plots: Arc::new(PlotCache::new(DEFAULT_RENDER_CACHE)),
        }
    }

    /// Keep up to `capacity` rendered charts.
    pub fn with_render_cache(mut self, capacity: usize) -> Self {
        self.plots = Arc::new(PlotCache::new(capacity));
        self
    }

    pub fn render_cache(&self) -> &PlotCache {
        &self.plots
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn lock(&self) -> Result<MutexGuard<'_, ViewState>> {
        self.state.lock().map_err(|_| Error::StatePoisoned)
    }

    /// Run a synchronous mutation against the view state.
    pub fn update_state<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> Result<R> {
        Ok(f(&mut *self.lock()?))
    }

    pub fn snapshot(&self) -> Result<ViewSnapshot> {
        Ok(self.lock()?.snapshot())
    }

    pub fn subscribe(&self) -> Result<watch::Receiver<ViewSnapshot>> {
        Ok(self.lock()?.subscribe())
    }

    pub fn begin_fetch(&self) -> Result<FetchTicket> {
        Ok(self.lock()?.begin_fetch())
    }

    /// Load what `ticket` asks for. Workouts and tracker names are queried concurrently.
    pub async fn fetch(&self, ticket: &FetchTicket) -> Result<FetchResult> {
        let Some(exercise) = ticket.exercise.as_deref() else {
            return Ok(FetchResult::default());
        };

        let (entries, tracker_names) = futures::join!(
            analysis::fetch_workouts(&self.store, exercise, ticket.start, ticket.end),
            analysis::exercise_trackers(&self.store, exercise),
        );
        Ok(FetchResult {
            entries: entries?,
            tracker_names: tracker_names?,
        })
    }

    pub fn apply(&self, ticket: &FetchTicket, result: FetchResult) -> Result<bool> {
        Ok(self.lock()?.apply_fetch(ticket, result))
    }

    /// Reload exercise names, then the selected exercise's workouts for the
    /// current window. On a store error the previous state stays in place.
    ///
    /// Returns whether the fetched data was applied; `false` means a newer
    /// selection superseded it while it was in flight.
    pub async fn refresh(&self) -> Result<bool> {
        let names = self.store.get_all_exercise_names().await.map_err(|e| {
            warn!("Failed to load exercise names: {}", e);
            e
        })?;

        let ticket = {
            let mut state = self.lock()?;
            state.set_exercise_names(names);
            state.begin_fetch()
        };

        let result = self.fetch(&ticket).await.map_err(|e| {
            warn!("Failed to fetch workouts for {:?}: {}", ticket.exercise, e);
            e
        })?;

        let applied = self.apply(&ticket, result)?;
        if applied {
            debug!(
                "Applied fetch #{} for {:?} [{}, {})",
                ticket.generation, ticket.exercise, ticket.start, ticket.end
            );
        }
        Ok(applied)
    }

    /// Refresh in the background; failures are logged.
    pub fn spawn_refresh(&self) -> JoinHandle<bool> {
        let session = self.clone();
        tokio::spawn(async move {
            match session.refresh().await {
                Ok(applied) => applied,
                Err(e) => {
                    warn!("Background refresh failed: {}", e);
                    false
                }
            }
        })
    }

    pub async fn shift_month(&self, delta: i32) -> Result<bool> {
        self.update_state(|state| state.set_date_window(delta))?;
        self.refresh().await
    }

    pub async fn select_exercise(&self, name: &str) -> Result<bool> {
        self.update_state(|state| state.select_exercise(name))?;
        self.refresh().await
    }

    /// Changing the series only re-aggregates data that is already loaded.
    pub fn select_series(&self, selector: Selector) -> Result<()> {
        self.update_state(|state| state.select_series(selector))
    }

    /// Refresh after a write that already succeeded. A failure here only
    /// leaves the view behind the store, so it is logged rather than returned.
    async fn refresh_after_write(&self, action: &str) {
        if let Err(e) = self.refresh().await {
            warn!("{} was saved but the view was not refreshed: {}", action, e);
        }
    }

    /// Create an exercise and switch the view to it.
    pub async fn create_exercise(&self, name: &str, trackers: &[String]) -> Result<i64> {
        let id = analysis::create_exercise(&self.store, name, trackers).await?;
        match self.update_state(|state| state.select_exercise(name)) {
            Ok(()) => self.refresh_after_write("New exercise").await,
            Err(e) => warn!("Created '{}' but could not select it: {}", name, e),
        }
        Ok(id)
    }

    /// Log a workout for the selected exercise on `date`.
    pub async fn log_workout(
        &self,
        date: NaiveDate,
        fields: &[(String, String)],
    ) -> Result<Option<i64>> {
        let exercise = self.lock()?.selected_exercise().unwrap_or_default();
        let id = analysis::log_workout(&self.store, &exercise, date, fields)
            .await
            .map_err(|e| {
                if let Error::Validation(ref reason) = e {
                    info!("Workout not saved: {}", reason);
                }
                e
            })?;
        if id.is_some() {
            self.refresh_after_write("Workout").await;
        }
        Ok(id)
    }

    pub async fn update_values(&self, values: &[WorkoutValue]) -> Result<usize> {
        let updated = analysis::update_workout_values(&self.store, values).await?;
        self.refresh_after_write("Edited workout").await;
        Ok(updated)
    }

    pub async fn delete_workout(&self, id: i64) -> Result<()> {
        self.store.delete_workout(id).await?;
        self.refresh_after_write("Workout deletion").await;
        Ok(())
    }

    pub async fn delete_exercise(&self, name: &str) -> Result<()> {
        let removed = self.store.delete_exercise(name).await?;
        info!("Deleted exercise '{}' ({} rows)", name, removed);
        self.refresh_after_write("Exercise deletion").await;
        Ok(())
    }

    pub async fn clear_all_data(&self) -> Result<()> {
        self.store.clear_all_data().await?;
        self.refresh_after_write("Clearing all data").await;
        Ok(())
    }

    /// Feed one gesture frame into the view state.
    pub fn on_transform(&self, delta: TransformDelta) -> Result<()> {
        self.update_state(|state| apply_transform(state, delta))
    }

    pub fn reset_view(&self) -> Result<()> {
        self.update_state(ViewState::reset_view)
    }

    /// Geometry of the current selection, or `None` when there is nothing to draw.
    pub fn chart(
        &self,
        layout: &ChartLayout,
        measure: &dyn LabelMeasure,
    ) -> Result<Option<ChartGeometry>> {
        let (series, viewport) = {
            let state = self.lock()?;
            (state.series(), Viewport::new(state.zoom_scale(), state.pan_offset()))
        };
        Ok(compute_geometry(&series, layout, &viewport, measure))
    }

    /// SVG of the current chart, served from the render cache when the data
    /// and view have not changed. `None` when there is nothing to draw.
    pub async fn render_svg(
        &self,
        layout: &ChartLayout,
        measure: &dyn LabelMeasure,
        dark_mode: bool,
        style: ChartStyle,
    ) -> Result<Option<String>> {
        let (series, viewport) = {
            let state = self.lock()?;
            (state.series(), Viewport::new(state.zoom_scale(), state.pan_offset()))
        };
        let Some(geometry) = compute_geometry(&series, layout, &viewport, measure) else {
            return Ok(None);
        };

        let key = render_key(&series, layout, &viewport, dark_mode);
        let svg = self
            .plots
            .svg(key, geometry, ChartTheme::for_mode(dark_mode), style)
            .await
            .map_err(|e| Error::Render(e.to_string()))?;
        Ok(Some(svg))
    }
}
