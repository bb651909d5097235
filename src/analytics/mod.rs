//! Aggregation of simulation output into plot-ready data

pub mod binning;
pub mod overlap;
pub mod reshape;

pub use binning::{align_series, bucket_events, AlignedSeries, Bin, Event, Series};
pub use overlap::{count_overlaps, count_overlaps_by_key, Interval, OverlapPoint};
pub use reshape::{CumulativeSeries, Histogram};
