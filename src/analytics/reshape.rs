//! Turning query rows into plot-ready shapes

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::Serialize;

use crate::analytics::binning::Event;
use crate::analytics::overlap::Interval;
use crate::db::models::{ReplicaLifetime, TransferTimes, TransferTraffic};
use crate::error::{config_error, invalid_input, no_data, Result};

/// Equal-width value histogram; `edges` has one more entry than `counts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// A running total per key, as `(time, cumulative value)` points
pub type CumulativeSeries<K> = BTreeMap<K, Vec<(i64, f64)>>;

/// Queue events, one per transfer, sorted by time
pub fn queued_events(transfers: &[TransferTimes]) -> Vec<Event> {
    let mut events: Vec<Event> = transfers.iter().map(|t| Event::count(t.queued_at)).collect();
    events.sort_by_key(|e| e.timestamp);
    events
}

/// Start events of the transfers that started, sorted by time
pub fn started_events(transfers: &[TransferTimes]) -> Vec<Event> {
    let mut events: Vec<Event> = transfers
        .iter()
        .filter_map(|t| t.started_at)
        .map(Event::count)
        .collect();
    let skipped = transfers.len() - events.len();
    if skipped > 0 {
        debug!("{} transfers never started", skipped);
    }
    events.sort_by_key(|e| e.timestamp);
    events
}

/// Duration in seconds of every transfer that both started and finished
pub fn transfer_durations(transfers: &[TransferTimes]) -> Vec<f64> {
    transfers
        .iter()
        .filter_map(|t| match (t.started_at, t.finished_at) {
            (Some(started), Some(finished)) if finished >= started => {
                Some((finished - started) as f64)
            }
            (Some(started), Some(finished)) => {
                warn!(
                    "Skipping transfer finishing before it started ({} < {})",
                    finished, started
                );
                None
            }
            _ => None,
        })
        .collect()
}

/// Histogram of `values` with `bins` equal-width bins over `[min, max]`.
///
/// The last bin includes `max`. When all values are equal the range is
/// widened by 0.5 on each side. Non-finite values are skipped.
pub fn value_histogram(values: &[f64], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(config_error("histogram needs at least one bin", Some("bins")));
    }

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < values.len() {
        warn!("Skipping {} non-finite values", values.len() - finite.len());
    }
    if finite.is_empty() {
        return Err(no_data("no values to build a histogram from"));
    }

    let mut min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    if !(max - min).is_finite() {
        return Err(invalid_input(format!(
            "value range [{}, {}] is too wide to bin",
            min, max
        )));
    }

    let width = (max - min) / bins as f64;
    let edges = (0..=bins)
        .map(|i| if i == bins { max } else { min + width * i as f64 })
        .collect();

    let mut counts = vec![0u64; bins];
    for value in finite {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}

/// Replica lifetimes grouped by storage element, one `+1` interval each.
///
/// Replicas that were never removed stay live until `horizon`, or until the
/// latest timestamp seen in `rows` when no horizon is given.
pub fn replica_intervals(
    rows: &[ReplicaLifetime],
    horizon: Option<i64>,
) -> BTreeMap<String, Vec<Interval>> {
    let horizon = horizon.unwrap_or_else(|| {
        rows.iter()
            .map(|r| r.removed_at.unwrap_or(r.created_at).max(r.created_at))
            .max()
            .unwrap_or(0)
    });

    let mut groups: BTreeMap<String, Vec<Interval>> = BTreeMap::new();
    for row in rows {
        let end = row.removed_at.unwrap_or(horizon).max(row.created_at);
        groups
            .entry(row.storage_element.clone())
            .or_default()
            .push(Interval::new(row.created_at, end, 1));
    }
    groups
}

/// Running total of `(key, time, value)` samples per key, ordered by time
pub fn cumulative_by_key<K, I>(samples: I) -> CumulativeSeries<K>
where
    K: Ord,
    I: IntoIterator<Item = (K, i64, f64)>,
{
    let mut grouped: BTreeMap<K, Vec<(i64, f64)>> = BTreeMap::new();
    for (key, time, value) in samples {
        grouped.entry(key).or_default().push((time, value));
    }

    for points in grouped.values_mut() {
        points.sort_by_key(|&(time, _)| time);
        let mut total = 0.0;
        for point in points.iter_mut() {
            total += point.1;
            point.1 = total;
        }
    }
    grouped
}

/// Cumulative traffic per destination storage element
pub fn cumulative_traffic(rows: &[TransferTraffic]) -> CumulativeSeries<String> {
    cumulative_by_key(
        rows.iter()
            .map(|r| (r.storage_element.clone(), r.finished_at, r.traffic)),
    )
}
