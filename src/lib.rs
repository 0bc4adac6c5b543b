//! # Workout Statistics Library
//!
//! `gymstats` records user-defined exercises, the numeric trackers each one
//! measures and dated workouts filling those trackers, then turns a month of
//! workouts into time series for a zoomable line chart.
//!
//! ## Features
//!
//! - SQLite store with cascading deletes
//! - Per-tracker, summed and multiplied series
//! - Observable, serialisable view state with month navigation and zoom/pan
//! - Chart geometry with adaptive date labels and smoothed curves
//! - SVG and PNG rendering through plotters
//!
//! ## Example
//!
//! ```no_run
//! use gymstats::{ChartLayout, FontMeasure, Session, Store, ViewState};
//!
//! # async fn run() -> gymstats::Result<()> {
//! let store = Store::open(std::path::Path::new("workouts.db"))?;
//! let session = Session::new(store, ViewState::default());
//!
//! session
//!     .create_exercise("Squat", &["Weight".to_string(), "Reps".to_string()])
//!     .await?;
//! let geometry = session.chart(
//!     &ChartLayout::new(1000.0, 600.0, 60.0),
//!     &FontMeasure::new("sans-serif", 15.0),
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod plotting;
pub mod store;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::{Session, ViewSnapshot, ViewState};
pub use config::Config;
pub use error::{Error, Result, StoreError, ValidationError};
pub use plotting::{ChartGeometry, ChartLayout, FontMeasure, Viewport};
pub use store::Store;
pub use types::{Exercise, Selector, Tracker, Workout, WorkoutEntry, WorkoutValue};
pub use utils::{aggregate_series, NamedSeries};
