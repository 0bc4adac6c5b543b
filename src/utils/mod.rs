mod aggregation;

pub use aggregation::{aggregate_series, NamedSeries, SeriesPoint, PRODUCT_SERIES, SUM_SERIES};
