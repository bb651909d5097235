//! Time-bucketed aggregation of event streams
//!
//! Events carry an integer timestamp in simulated seconds and a weight. They
//! are folded into fixed-width bins starting at t = 0 with a single cursor, so
//! input must already be sorted by timestamp.

use serde::Serialize;

use crate::error::{config_error, invalid_input, no_data, Result};

/// A timestamped occurrence with a weight (a count, a size, a duration)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Event {
    pub timestamp: i64,
    pub weight: f64,
}

impl Event {
    pub fn new(timestamp: i64, weight: f64) -> Self {
        Self { timestamp, weight }
    }

    /// An event counting as one occurrence
    pub fn count(timestamp: i64) -> Self {
        Self::new(timestamp, 1.0)
    }
}

/// Half-open interval `[start, end)` with the weight accumulated into it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub start: i64,
    pub end: i64,
    pub weight: f64,
}

impl Bin {
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

/// Contiguous bins from t = 0 aligned to multiples of `interval`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub interval: i64,
    pub bins: Vec<Bin>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.bins.iter().map(|b| b.weight).sum()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.weight).collect()
    }

    /// A series with no bins, standing in for an event stream that never
    /// produced anything
    pub fn empty(interval: i64) -> Self {
        Self {
            interval,
            bins: Vec::new(),
        }
    }

    /// Index of the bin holding `timestamp`, if any
    pub fn bin_index(&self, timestamp: i64) -> Option<usize> {
        self.bins.iter().position(|b| b.contains(timestamp))
    }
}

/// Two series sharing one bin axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    pub interval: i64,
    /// Shared axis; bin weights are unused and left at zero
    pub axis: Vec<Bin>,
    pub first: Vec<f64>,
    pub second: Vec<f64>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    pub fn starts(&self) -> Vec<i64> {
        self.axis.iter().map(|b| b.start).collect()
    }
}

/// Fold sorted events into bins of width `interval`.
///
/// Bins run from 0 to the last event's timestamp. Every full bin ends on a
/// multiple of `interval`; the final bin ends right after the last timestamp.
/// An event on a boundary belongs to the bin starting there.
pub fn bucket_events(events: &[Event], interval: i64) -> Result<Series> {
    if interval <= 0 {
        return Err(config_error(
            format!("bin interval must be positive, got {}", interval),
            Some("interval"),
        ));
    }

    let last = match events.last() {
        Some(event) => event.timestamp,
        None => return Err(no_data("cannot bin an empty event sequence")),
    };

    let final_end = last.checked_add(1).ok_or_else(|| {
        invalid_input(format!("timestamp {} leaves no room for a final bin", last))
    })?;

    let mut bins = Vec::with_capacity(((last / interval).max(0) as usize + 1).min(4096));
    let mut cursor = 0;
    let mut previous = 0;
    let mut start = 0;
    let mut boundary = interval;

    while boundary <= last {
        let mut weight = 0.0;
        while cursor < events.len() && events[cursor].timestamp < boundary {
            let event = &events[cursor];
            check_order(event, previous)?;
            previous = event.timestamp;
            weight += event.weight;
            cursor += 1;
        }
        bins.push(Bin {
            start,
            end: boundary,
            weight,
        });
        start = boundary;
        boundary = match boundary.checked_add(interval) {
            Some(next) => next,
            // the next boundary lies past any representable timestamp
            None => break,
        };
    }

    let mut weight = 0.0;
    for event in &events[cursor..] {
        check_order(event, previous)?;
        previous = event.timestamp;
        weight += event.weight;
    }
    bins.push(Bin {
        start,
        end: final_end,
        weight,
    });

    Ok(Series { interval, bins })
}

fn check_order(event: &Event, previous: i64) -> Result<()> {
    if event.timestamp < 0 {
        return Err(invalid_input(format!(
            "negative event timestamp {}",
            event.timestamp
        )));
    }
    if event.timestamp < previous {
        return Err(invalid_input(format!(
            "events are not sorted: {} follows {}",
            event.timestamp, previous
        )));
    }
    Ok(())
}

/// Put two independently binned series on one bin axis.
///
/// The axis reuses the first series' bins and is extended with the second
/// series' bins past its end. Weights missing on either side are zero.
pub fn align_series(first: &Series, second: &Series) -> Result<AlignedSeries> {
    if first.interval != second.interval {
        return Err(config_error(
            format!(
                "cannot align series binned with different intervals ({} vs {})",
                first.interval, second.interval
            ),
            Some("interval"),
        ));
    }

    let len = first.len().max(second.len());
    let mut axis = Vec::with_capacity(len);
    let mut first_weights = Vec::with_capacity(len);
    let mut second_weights = Vec::with_capacity(len);

    for idx in 0..len {
        let a = first.bins.get(idx);
        let b = second.bins.get(idx);
        let (start, end) = match (a, b) {
            (Some(a), Some(b)) => (a.start, a.end.max(b.end)),
            (Some(a), None) => (a.start, a.end),
            (None, Some(b)) => (b.start, b.end),
            (None, None) => unreachable!("index below the longer series length"),
        };
        axis.push(Bin {
            start,
            end,
            weight: 0.0,
        });
        first_weights.push(a.map_or(0.0, |bin| bin.weight));
        second_weights.push(b.map_or(0.0, |bin| bin.weight));
    }

    Ok(AlignedSeries {
        interval: first.interval,
        axis,
        first: first_weights,
        second: second_weights,
    })
}
