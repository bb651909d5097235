//! Unit tests for time-bucket aggregation and series alignment
//!
//! Property checks run over seeded random event sequences so failures are
//! reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simstats::{align_series, bucket_events, Bin, Event, Series, SimStatsError};

/// Sorted events with random timestamps in `[0, max_time]` and weights in `[0, 5)`
fn random_events(rng: &mut StdRng, count: usize, max_time: i64) -> Vec<Event> {
    let mut events: Vec<Event> = (0..count)
        .map(|_| Event::new(rng.gen_range(0..=max_time), rng.gen_range(0.0..5.0)))
        .collect();
    events.sort_by_key(|e| e.timestamp);
    events
}

#[test]
fn test_bucket_worked_example() {
    let events = vec![
        Event::new(0, 1.0),
        Event::new(5, 2.0),
        Event::new(9, 1.0),
        Event::new(10, 3.0),
    ];
    let series = bucket_events(&events, 10).unwrap();

    assert_eq!(series.interval, 10);
    assert_eq!(
        series.bins,
        vec![
            Bin { start: 0, end: 10, weight: 4.0 },
            Bin { start: 10, end: 11, weight: 3.0 },
        ]
    );
    assert_eq!(series.weights(), vec![4.0, 3.0]);
}

#[test]
fn test_single_event_at_zero() {
    let series = bucket_events(&[Event::count(0)], 60).unwrap();
    assert_eq!(series.bins, vec![Bin { start: 0, end: 1, weight: 1.0 }]);
}

#[test]
fn test_leading_empty_bins_are_kept() {
    let series = bucket_events(&[Event::count(250)], 100).unwrap();
    assert_eq!(series.weights(), vec![0.0, 0.0, 1.0]);
    assert_eq!(series.bins[2], Bin { start: 200, end: 251, weight: 1.0 });
}

#[test]
fn test_empty_input_is_no_data() {
    let err = bucket_events(&[], 3600).unwrap_err();
    assert!(matches!(err, SimStatsError::NoData { .. }));
}

#[test]
fn test_non_positive_interval_is_rejected() {
    let events = vec![Event::count(1)];
    assert!(matches!(
        bucket_events(&events, 0),
        Err(SimStatsError::Configuration { .. })
    ));
    assert!(matches!(
        bucket_events(&events, -5),
        Err(SimStatsError::Configuration { .. })
    ));
}

#[test]
fn test_unsorted_and_negative_input_is_rejected() {
    let unsorted = vec![Event::count(30), Event::count(5), Event::count(40)];
    assert!(matches!(
        bucket_events(&unsorted, 10),
        Err(SimStatsError::InvalidInput { .. })
    ));

    let negative = vec![Event::count(-3), Event::count(5)];
    assert!(matches!(
        bucket_events(&negative, 10),
        Err(SimStatsError::InvalidInput { .. })
    ));
}

#[test]
fn test_timestamp_at_i64_max_is_rejected() {
    let err = bucket_events(&[Event::count(i64::MAX)], i64::MAX).unwrap_err();
    assert!(matches!(err, SimStatsError::InvalidInput { .. }));

    let err = bucket_events(&[Event::count(0), Event::count(i64::MAX)], 1 << 62).unwrap_err();
    assert!(matches!(err, SimStatsError::InvalidInput { .. }));
}

#[test]
fn test_boundaries_near_i64_max_do_not_overflow() {
    let last = i64::MAX - 1;
    let series = bucket_events(&[Event::count(3), Event::count(last)], last).unwrap();
    assert_eq!(
        series.bins,
        vec![
            Bin { start: 0, end: last, weight: 1.0 },
            Bin { start: last, end: i64::MAX, weight: 1.0 },
        ]
    );

    let interval = i64::MAX / 2 + 1;
    let series = bucket_events(&[Event::count(last)], interval).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.bins[1].start, interval);
    assert_eq!(series.bins[1].end, i64::MAX);
}

#[test]
fn test_weight_is_conserved() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let count = rng.gen_range(1..60);
        let interval = rng.gen_range(1..50);
        let events = random_events(&mut rng, count, 1_000);

        let series = bucket_events(&events, interval).unwrap();
        let expected: f64 = events.iter().map(|e| e.weight).sum();
        assert!((series.total_weight() - expected).abs() < 1e-9);
    }
}

#[test]
fn test_every_event_lands_in_its_bin() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let count = rng.gen_range(1..40);
        let interval = rng.gen_range(1..30);
        let events = random_events(&mut rng, count, 500);

        let series = bucket_events(&events, interval).unwrap();
        for event in &events {
            let idx = series.bin_index(event.timestamp).unwrap();
            let bin = &series.bins[idx];
            assert!(bin.contains(event.timestamp));
            assert_eq!(bin.start, idx as i64 * interval);
        }
    }
}

#[test]
fn test_bins_tile_the_axis() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..200 {
        let count = rng.gen_range(1..40);
        let interval = rng.gen_range(1..30);
        let events = random_events(&mut rng, count, 500);
        let last = events[events.len() - 1].timestamp;

        let series = bucket_events(&events, interval).unwrap();
        assert_eq!(series.len() as i64, last / interval + 1);
        assert_eq!(series.bins[0].start, 0);
        for pair in series.bins.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_eq!(pair[0].end - pair[0].start, interval);
        }
        assert_eq!(series.bins[series.len() - 1].end, last + 1);
    }
}

#[test]
fn test_align_pads_shorter_series_with_zero() {
    let first = bucket_events(&[Event::count(10), Event::count(99)], 50).unwrap();
    let second = bucket_events(&[Event::count(20), Event::count(150)], 50).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 4);

    let aligned = align_series(&first, &second).unwrap();
    assert_eq!(aligned.len(), 4);
    assert_eq!(aligned.starts(), vec![0, 50, 100, 150]);
    assert_eq!(aligned.axis[2].start, 100);
    assert_eq!(aligned.axis[2].end, 150);
    assert_eq!(aligned.first, vec![1.0, 1.0, 0.0, 0.0]);
    assert_eq!(aligned.second, vec![1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn test_align_uses_the_later_end_of_shared_bins() {
    let first = bucket_events(&[Event::count(12)], 10).unwrap();
    let second = bucket_events(&[Event::count(17)], 10).unwrap();

    let aligned = align_series(&first, &second).unwrap();
    assert_eq!(aligned.axis[1].start, 10);
    assert_eq!(aligned.axis[1].end, 18);
}

#[test]
fn test_align_preserves_totals() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..100 {
        let a = random_events(&mut rng, 30, 800);
        let b = random_events(&mut rng, 30, 400);
        let first = bucket_events(&a, 25).unwrap();
        let second = bucket_events(&b, 25).unwrap();

        let aligned = align_series(&first, &second).unwrap();
        assert_eq!(aligned.len(), first.len().max(second.len()));
        assert_eq!(aligned.first.len(), aligned.second.len());
        let total_first: f64 = aligned.first.iter().sum();
        let total_second: f64 = aligned.second.iter().sum();
        assert!((total_first - first.total_weight()).abs() < 1e-9);
        assert!((total_second - second.total_weight()).abs() < 1e-9);
    }
}

#[test]
fn test_align_with_empty_second_series() {
    let queued = bucket_events(&[Event::count(10), Event::count(130)], 60).unwrap();
    let aligned = align_series(&queued, &Series::empty(60)).unwrap();

    assert_eq!(aligned.len(), 3);
    assert_eq!(aligned.starts(), vec![0, 60, 120]);
    assert_eq!(aligned.first, vec![1.0, 0.0, 1.0]);
    assert_eq!(aligned.second, vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_align_rejects_mismatched_intervals() {
    let first = bucket_events(&[Event::count(5)], 10).unwrap();
    let second = bucket_events(&[Event::count(5)], 20).unwrap();
    assert!(align_series(&first, &second).is_err());
}
