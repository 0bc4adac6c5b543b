//! Workout Statistics Tool
//!
//! Renders the chart for one exercise and month of the workout log.
//!
//! Usage: `gymstats [EXERCISE] [MONTH_OFFSET]`

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use tokio::runtime::Runtime;

use gymstats::plotting::{render_png, ChartStyle, ChartTheme};
use std::path::Path;
use gymstats::{ChartLayout, Config, FontMeasure, Session, Store, ViewState};

fn init_logging() {
    let default_level = if cfg!(feature = "dev") { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let exercise = args.next();
    let month_offset: i32 = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid month offset '{}'", raw))?,
        None => 0,
    };

    let config = Config::load().context("failed to load config")?;
    let store = Store::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let session =
        Session::new(store, ViewState::default()).with_render_cache(config.render_cache_size);

    let rt = Runtime::new()?;
    rt.block_on(async {
        if let Some(name) = &exercise {
            session.update_state(|state| state.select_exercise(name))?;
        }
        if month_offset != 0 {
            session.update_state(|state| state.set_date_window(month_offset))?;
        }
        session.refresh().await
    })?;

    let snapshot = session.snapshot()?;
    let Some(selected) = snapshot.selected_exercise.clone() else {
        warn!("No exercises logged yet");
        return Ok(());
    };
    if exercise.as_deref().is_some_and(|name| name != selected) {
        return Err(anyhow!("no exercise named '{}'", exercise.unwrap_or_default()));
    }

    let layout = ChartLayout::from_config(&config);
    let style = ChartStyle::default();
    let measure = FontMeasure::new("sans-serif", style.font_size as f64);

    if is_svg(&config.plot_path) {
        let svg = rt.block_on(session.render_svg(&layout, &measure, config.dark_mode, style))?;
        let Some(svg) = svg else {
            info!("No workouts for {} in {}", selected, snapshot.date.format("%B %Y"));
            return Ok(());
        };
        std::fs::write(&config.plot_path, svg)
            .with_context(|| format!("failed to write {}", config.plot_path.display()))?;
        info!("Chart written to {}", config.plot_path.display());
        return Ok(());
    }

    let Some(geometry) = session.chart(&layout, &measure)? else {
        info!("No workouts for {} in {}", selected, snapshot.date.format("%B %Y"));
        return Ok(());
    };

    for series in &geometry.series {
        info!("{}: {} points in view", series.name, series.points.len());
    }

    let theme = ChartTheme::for_mode(config.dark_mode);
    render_png(&geometry, &theme, &style, &config.plot_path)
        .map_err(|e| anyhow!("failed to render chart: {}", e))?;
    info!("Chart written to {}", config.plot_path.display());
    Ok(())
}

fn is_svg(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}
