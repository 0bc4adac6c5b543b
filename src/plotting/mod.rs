pub mod chart;
pub mod gesture;
pub mod render;
pub mod styles;

pub use chart::{
    compute_geometry, format_date, smooth_segments, value_range, ChartGeometry, ChartLayout,
    CubicSegment, DateLabel, DateLabels, FixedAdvance, FontMeasure, GridLine, LabelMeasure,
    PlotPoint, SeriesGeometry, Viewport,
};
pub use gesture::{apply_transform, TransformDelta};
pub use render::{draw_chart, render_key, render_png, render_svg, PlotCache, PlotError};
pub use styles::{series_color, ChartStyle, ChartTheme, SERIES_PALETTE};
