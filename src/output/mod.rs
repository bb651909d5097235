//! Charts and summaries of evaluated simulation data

pub mod chart;
pub mod json;
pub mod text;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Duration;
use serde::Serialize;

use crate::analytics::{AlignedSeries, Histogram};

pub use chart::ChartRenderer;
pub use json::JsonFormatter;
pub use text::TextFormatter;

/// The data behind one rendered chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotData {
    /// Two binned series on a shared axis
    Aligned {
        labels: (String, String),
        series: AlignedSeries,
    },
    Histogram(Histogram),
    /// `(time, value)` curves keyed by storage element or similar
    Curves(BTreeMap<String, Vec<(i64, f64)>>),
}

/// What a plot subcommand produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSummary {
    pub plot: String,
    pub chart_path: PathBuf,
    /// Rows returned by the query feeding the chart
    pub rows: usize,
    pub data: PlotData,
}

/// Simulated seconds as `[Nd ]HH:MM:SS`
pub fn format_sim_time(seconds: i64) -> String {
    let duration = Duration::seconds(seconds.abs());
    let sign = if seconds < 0 { "-" } else { "" };
    let days = duration.num_days();
    let hours = duration.num_hours() % 24;
    let minutes = duration.num_minutes() % 60;
    let secs = duration.num_seconds() % 60;
    if days > 0 {
        format!("{}{}d {:02}:{:02}:{:02}", sign, days, hours, minutes, secs)
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, secs)
    }
}
