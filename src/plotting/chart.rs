use chrono::NaiveDate;
use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor};

use super::styles::series_color;
use crate::config::Config;
use crate::utils::NamedSeries;

/// `Jan 5`
pub const DATE_LABEL_FORMAT: &str = "%b %-d";
/// Number of intervals between horizontal grid lines; one more line than this is drawn.
pub const GRID_INTERVALS: usize = 5;
/// Spacing added to each measured date label.
pub const LABEL_GAP: f64 = 20.0;
pub const DEFAULT_LABEL_WIDTH: f64 = 100.0;
/// Distance of the date labels below the bottom of the plot area.
pub const DATE_LABEL_OFFSET: f64 = 64.0;
const TANGENT_DIVISOR: f64 = 20.0;

/// Size of the plot area in pixels. Grid and date labels are placed outside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    /// Offset of the first point from the left edge
    pub left_padding: f64,
}

impl ChartLayout {
    pub fn new(width: f64, height: f64, left_padding: f64) -> Self {
        Self {
            width,
            height,
            left_padding,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.canvas_width as f64,
            config.canvas_height as f64,
            config.left_padding,
        )
    }
}

/// Zoom scale and horizontal pan applied to point positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: f64,
}

impl Viewport {
    pub fn new(zoom: f64, pan: f64) -> Self {
        Self { zoom, pan }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
    pub date: NaiveDate,
    pub value: i64,
}

impl PlotPoint {
    pub fn pos(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// One cubic Bézier piece between two consecutive visible points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub from: (f64, f64),
    pub ctrl1: (f64, f64),
    pub ctrl2: (f64, f64),
    pub to: (f64, f64),
}

impl CubicSegment {
    pub fn at(&self, t: f64) -> (f64, f64) {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        (
            a * self.from.0 + b * self.ctrl1.0 + c * self.ctrl2.0 + d * self.to.0,
            a * self.from.1 + b * self.ctrl1.1 + c * self.ctrl2.1 + d * self.to.1,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGeometry {
    pub name: String,
    pub color: RGBColor,
    /// Only the points that fall horizontally inside the canvas
    pub points: Vec<PlotPoint>,
    pub segments: Vec<CubicSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    pub y: f64,
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DateLabels {
    /// Every visible point gets its own label.
    PerPoint(Vec<DateLabel>),
    /// Too crowded: one `first - last` label centred under the chart.
    Range(DateLabel),
}

/// Everything needed to draw one frame of the chart, in plot-area pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub layout: ChartLayout,
    pub min_value: f64,
    pub max_value: f64,
    pub series: Vec<SeriesGeometry>,
    pub grid: Vec<GridLine>,
    pub dates: DateLabels,
    pub label_width: f64,
}

/// Measures rendered text width in pixels.
pub trait LabelMeasure {
    fn text_width(&self, text: &str) -> f64;
}

/// Every character is the same width. Deterministic, for headless use.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance(pub f64);

impl LabelMeasure for FixedAdvance {
    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.0
    }
}

/// Measures with a real font through plotters, estimating when no font is available.
#[derive(Debug, Clone)]
pub struct FontMeasure {
    pub family: String,
    pub size: f64,
}

impl FontMeasure {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl LabelMeasure for FontMeasure {
    fn text_width(&self, text: &str) -> f64 {
        let font = FontDesc::new(FontFamily::Name(&self.family), self.size, FontStyle::Normal);
        match font.box_size(text) {
            Ok((w, _)) => w as f64,
            Err(_) => FixedAdvance(self.size * 0.6).text_width(text),
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_LABEL_FORMAT).to_string()
}

/// Value range over every point, widened to at least one unit.
pub fn value_range(series: &[NamedSeries]) -> Option<(f64, f64)> {
    let mut values = series.iter().flat_map(|s| s.points.iter().map(|p| p.value as f64));
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Some((min.min(max - 1.0), max))
}

/// Smooth the path through `points` with control points taken from each
/// point's neighbours, reusing the endpoint where a neighbour is missing.
pub fn smooth_segments(points: &[(f64, f64)]) -> Vec<CubicSegment> {
    if points.len() < 2 {
        return Vec::new();
    }
    (0..points.len() - 1)
        .map(|i| {
            let p0 = points[i.saturating_sub(1)];
            let p1 = points[i];
            let p2 = points[i + 1];
            let p3 = points[(i + 2).min(points.len() - 1)];
            CubicSegment {
                from: p1,
                ctrl1: (
                    p1.0 + (p2.0 - p0.0) / TANGENT_DIVISOR,
                    p1.1 + (p2.1 - p0.1) / TANGENT_DIVISOR,
                ),
                ctrl2: (
                    p2.0 - (p3.0 - p1.0) / TANGENT_DIVISOR,
                    p2.1 - (p3.1 - p1.1) / TANGENT_DIVISOR,
                ),
                to: p2,
            }
        })
        .collect()
}

fn grid_lines(layout: &ChartLayout, min: f64, max: f64) -> Vec<GridLine> {
    let spacing = layout.height / GRID_INTERVALS as f64;
    (0..=GRID_INTERVALS)
        .map(|i| {
            let value = max - i as f64 * (max - min) / GRID_INTERVALS as f64;
            GridLine {
                y: i as f64 * spacing,
                value,
                label: (value.trunc() as i64).to_string(),
            }
        })
        .collect()
}

/// Project `series` onto the plot area at the given zoom and pan.
///
/// Returns `None` when there are no points at all. Point spacing and the
/// label-density decision use the first series' point count.
pub fn compute_geometry(
    series: &[NamedSeries],
    layout: &ChartLayout,
    viewport: &Viewport,
    measure: &dyn LabelMeasure,
) -> Option<ChartGeometry> {
    let (min_value, max_value) = value_range(series)?;
    let lead_count = series.first().map_or(0, |s| s.points.len());

    let spacing = (layout.width - layout.left_padding) / lead_count.saturating_sub(1).max(1) as f64;
    let step = spacing * viewport.zoom;
    let span = max_value - min_value;

    let label_width = series
        .iter()
        .flat_map(|s| s.points.iter())
        .map(|p| measure.text_width(&format_date(p.date)) + LABEL_GAP)
        .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |m| m.max(w))))
        .unwrap_or(DEFAULT_LABEL_WIDTH);
    let per_point = (lead_count as f64) * label_width < viewport.zoom * layout.width;
    let label_y = layout.height + DATE_LABEL_OFFSET;

    let mut geometries = Vec::with_capacity(series.len());
    let mut point_labels = Vec::new();

    for (idx, s) in series.iter().enumerate() {
        let points: Vec<PlotPoint> = s
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| PlotPoint {
                x: layout.left_padding + i as f64 * step + viewport.pan,
                y: layout.height - (p.value as f64 - min_value) / span * layout.height,
                date: p.date,
                value: p.value,
            })
            .filter(|p| (0.0..=layout.width).contains(&p.x))
            .collect();

        if per_point {
            point_labels.extend(points.iter().map(|p| DateLabel {
                x: p.x,
                y: label_y,
                text: format_date(p.date),
            }));
        }

        let positions: Vec<(f64, f64)> = points.iter().map(PlotPoint::pos).collect();
        geometries.push(SeriesGeometry {
            name: s.name.clone(),
            color: series_color(idx),
            segments: smooth_segments(&positions),
            points,
        });
    }

    let dates = if per_point {
        DateLabels::PerPoint(point_labels)
    } else {
        let mut all = series.iter().flat_map(|s| s.points.iter());
        let first = all.next()?.date;
        let last = all.last().map_or(first, |p| p.date);
        DateLabels::Range(DateLabel {
            x: layout.width / 2.0,
            y: label_y,
            text: format!("{} - {}", format_date(first), format_date(last)),
        })
    };

    Some(ChartGeometry {
        layout: *layout,
        min_value,
        max_value,
        series: geometries,
        grid: grid_lines(layout, min_value, max_value),
        dates,
        label_width,
    })
}
