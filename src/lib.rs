//! simstats - grid simulation output evaluation
//!
//! This library queries the output database of a grid simulation, aggregates
//! transfers, files and replicas into plot-ready data and renders charts. It
//! also merges cloud billing SKU prices into simulation region configs.

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod pricing;
pub mod sql;

// Re-export commonly used items
pub use analytics::{
    align_series, bucket_events, count_overlaps, AlignedSeries, Bin, Event, Histogram, Interval,
    OverlapPoint, Series,
};
pub use config::{DatabaseConfig, PlotSettings};
pub use db::{QueryParam, SimDatabase};
pub use error::{Result, SimStatsError};
pub use output::{ChartRenderer, JsonFormatter, PlotData, PlotSummary, TextFormatter};
pub use pricing::{update_sim_config, SkuMergeReport};
pub use sql::{QueryCatalog, SqlQuery};
