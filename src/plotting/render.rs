use lru::LruCache;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as TokioMutex;

use super::chart::{ChartGeometry, ChartLayout, CubicSegment, DateLabels, Viewport};
use super::styles::{ChartStyle, ChartTheme};
use crate::utils::NamedSeries;

pub type PlotError = Box<dyn Error + Send + Sync>;

const CACHE_TTL: Duration = Duration::from_secs(300);
const LEGEND_LINE: i32 = 20;

/// Straight-line approximation of a cubic segment, endpoints included.
pub fn flatten_segment(segment: &CubicSegment, steps: usize) -> Vec<(f64, f64)> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| segment.at(i as f64 / steps as f64))
        .collect()
}

/// Draw `geometry` onto `root`. The plot area starts at [`ChartStyle::origin`].
pub fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    geometry: &ChartGeometry,
    theme: &ChartTheme,
    style: &ChartStyle,
) -> Result<(), PlotError>
where
    DB::ErrorType: 'static,
{
    let (ox, oy) = style.origin();
    let px = |(x, y): (f64, f64)| (ox + x.round() as i32, oy + y.round() as i32);
    let ChartLayout { width, height, .. } = geometry.layout;

    root.fill(&theme.background_color)?;

    let grid_style = ShapeStyle::from(&theme.grid_color).stroke_width(1);
    for line in &geometry.grid {
        root.draw(&PathElement::new(
            vec![px((0.0, line.y)), px((width, line.y))],
            grid_style,
        ))?;
    }

    let axis_style = ShapeStyle::from(&theme.axis_color).stroke_width(style.axis_width);
    root.draw(&PathElement::new(
        vec![px((0.0, height)), px((width, height))],
        axis_style,
    ))?;
    root.draw(&PathElement::new(vec![px((0.0, 0.0)), px((0.0, height))], axis_style))?;

    for series in &geometry.series {
        let line_style = ShapeStyle::from(&series.color).stroke_width(style.line_width);
        if let Some(first) = series.points.first() {
            let mut path = vec![px(first.pos())];
            for segment in &series.segments {
                path.extend(
                    flatten_segment(segment, style.curve_steps)
                        .into_iter()
                        .skip(1)
                        .map(px),
                );
            }
            root.draw(&PathElement::new(path, line_style))?;
        }
        for point in &series.points {
            root.draw(&Circle::new(
                px(point.pos()),
                style.point_radius,
                series.color.filled(),
            ))?;
        }
    }

    if !style.draw_text {
        return Ok(());
    }

    let font = ("sans-serif", style.font_size)
        .into_font()
        .color(&theme.text_color);
    let value_font = font.clone().pos(Pos::new(HPos::Left, VPos::Center));
    for line in &geometry.grid {
        root.draw(&Text::new(
            line.label.clone(),
            (style.margin as i32, px((0.0, line.y)).1),
            value_font.clone(),
        ))?;
    }

    let date_font = font.clone().pos(Pos::new(HPos::Center, VPos::Center));
    match &geometry.dates {
        DateLabels::PerPoint(labels) => {
            for label in labels {
                let text = Text::new(label.text.clone(), px((label.x, label.y)), date_font.clone());
                root.draw(&text)?;
            }
        }
        DateLabels::Range(label) => {
            root.draw(&Text::new(label.text.clone(), px((label.x, label.y)), date_font))?;
        }
    }

    if style.draw_legend {
        let row = style.font_size as i32 + 4;
        let (right, top) = px((width, 0.0));
        let legend_font = font.clone().pos(Pos::new(HPos::Right, VPos::Center));
        for (i, series) in geometry.series.iter().enumerate() {
            let y = top + row * (i as i32 + 1);
            let line_end = right - style.margin as i32;
            root.draw(&PathElement::new(
                vec![(line_end - LEGEND_LINE, y), (line_end, y)],
                ShapeStyle::from(&series.color).stroke_width(style.line_width),
            ))?;
            root.draw(&Text::new(
                series.name.clone(),
                (line_end - LEGEND_LINE - 6, y),
                legend_font.clone(),
            ))?;
        }
    }

    Ok(())
}

fn image_size(geometry: &ChartGeometry, style: &ChartStyle) -> (u32, u32) {
    style.image_size(
        geometry.layout.width.round() as u32,
        geometry.layout.height.round() as u32,
    )
}

/// Render to an SVG document.
pub fn render_svg(
    geometry: &ChartGeometry,
    theme: &ChartTheme,
    style: &ChartStyle,
) -> Result<String, PlotError> {
    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, image_size(geometry, style)).into_drawing_area();
        draw_chart(&root, geometry, theme, style)?;
        root.present()?;
    }
    Ok(svg)
}

/// Render to a PNG file at `path`.
pub fn render_png(
    geometry: &ChartGeometry,
    theme: &ChartTheme,
    style: &ChartStyle,
    path: &Path,
) -> Result<(), PlotError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let root = BitMapBackend::new(path, image_size(geometry, style)).into_drawing_area();
    draw_chart(&root, geometry, theme, style)?;
    root.present()?;
    log::debug!("Wrote chart to {}", path.display());
    Ok(())
}

/// Identifies one rendered frame: the data, the canvas and the view transform.
pub fn render_key(
    series: &[NamedSeries],
    layout: &ChartLayout,
    viewport: &Viewport,
    dark_mode: bool,
) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    series.hash(&mut hasher);
    for v in [layout.width, layout.height, layout.left_padding, viewport.zoom, viewport.pan] {
        v.to_bits().hash(&mut hasher);
    }
    dark_mode.hash(&mut hasher);
    hasher.finish()
}

/// Recently rendered SVG charts, evicted by age (5 minutes) and by count.
pub struct PlotCache {
    entries: TokioMutex<LruCache<u64, (String, Instant)>>,
    ttl: Duration,
}

impl PlotCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_ttl(capacity, CACHE_TTL)
    }

    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: TokioMutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Cached SVG for `key`, rendering on a blocking thread when missing or expired.
    pub async fn svg(
        &self,
        key: u64,
        geometry: ChartGeometry,
        theme: ChartTheme,
        style: ChartStyle,
    ) -> Result<String, PlotError> {
        if let Some((svg, rendered_at)) = self.entries.lock().await.get(&key) {
            if rendered_at.elapsed() < self.ttl {
                return Ok(svg.clone());
            }
        }

        let svg =
            tokio::task::spawn_blocking(move || render_svg(&geometry, &theme, &style)).await??;

        self.entries.lock().await.put(key, (svg.clone(), Instant::now()));
        Ok(svg)
    }
}
