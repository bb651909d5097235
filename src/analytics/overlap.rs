//! Counting how many intervals overlap each boundary timestamp
//!
//! Used for the number of live replicas at a storage element over time. The
//! count is taken with a sweep over the sorted distinct boundaries: `+delta`
//! where an interval starts, `-delta` at the boundary right after it ends,
//! then a prefix sum.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{invalid_input, Result};

/// Closed interval `[start, end]` contributing `delta` while it is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
    pub delta: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64, delta: i64) -> Self {
        Self { start, end, delta }
    }
}

/// Net overlap count at one boundary timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverlapPoint {
    pub time: i64,
    pub count: i64,
}

/// Net count of overlapping intervals at every distinct start/end timestamp.
///
/// Input order does not matter. Runs in O(n log n).
pub fn count_overlaps(intervals: &[Interval]) -> Result<Vec<OverlapPoint>> {
    if let Some(bad) = intervals.iter().find(|i| i.end < i.start) {
        return Err(invalid_input(format!(
            "interval ends before it starts: [{}, {}]",
            bad.start, bad.end
        )));
    }

    let mut coords: Vec<i64> = intervals
        .iter()
        .flat_map(|i| [i.start, i.end])
        .collect();
    coords.sort_unstable();
    coords.dedup();

    // one extra slot so the removal after the last coordinate has somewhere to go
    let mut diff = vec![0i64; coords.len() + 1];
    for interval in intervals {
        let first = position(&coords, interval.start);
        let last = position(&coords, interval.end);
        diff[first] += interval.delta;
        diff[last + 1] -= interval.delta;
    }

    let mut count = 0;
    Ok(coords
        .into_iter()
        .zip(diff)
        .map(|(time, change)| {
            count += change;
            OverlapPoint { time, count }
        })
        .collect())
}

/// `count_overlaps` applied to every group independently
pub fn count_overlaps_by_key<K: Ord>(
    groups: BTreeMap<K, Vec<Interval>>,
) -> Result<BTreeMap<K, Vec<OverlapPoint>>> {
    groups
        .into_iter()
        .map(|(key, intervals)| Ok((key, count_overlaps(&intervals)?)))
        .collect()
}

fn position(coords: &[i64], value: i64) -> usize {
    // every start and end was inserted into coords
    coords.binary_search(&value).unwrap_or_else(|idx| idx)
}
