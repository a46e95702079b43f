//! End-to-end analytics scenarios over small hand-checked series

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::{DateTime, Duration, TimeZone, Utc};
use strata_model::timeseries::{self, HysteresisConfig, SeriesExt};
use strata_model::{SeriesSummary, Sample};

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn series(points: &[(i64, f64)]) -> Vec<Sample> {
    points.iter().map(|&(t, v)| Sample::new(ts(t), v)).collect()
}

#[test]
fn two_point_average_and_delta() {
    let samples = series(&[(0, 4.0), (60, 10.0)]);
    assert_eq!(timeseries::average(&samples, ts(0), ts(60)), 7.0);
    assert_eq!(timeseries::delta(&samples, ts(0), ts(60)), 6.0);
}

#[test]
fn above_threshold_scenario() {
    let samples = series(&[(0, 10.0), (10, 20.0), (20, 10.0)]);

    let clipped: Vec<(DateTime<Utc>, f64)> = samples
        .iter()
        .above(15.0)
        .map(|s| (s.timestamp, s.numeric_value))
        .collect();

    assert!(clipped.contains(&(ts(5), 0.0)));
    assert!(clipped.contains(&(ts(10), 5.0)));
    assert!(clipped.contains(&(ts(15), 0.0)));

    assert_eq!(
        timeseries::average_above(&samples, ts(0), ts(20), 15.0),
        1.25
    );
}

#[test]
fn above_and_below_are_complementary() {
    let samples = series(&[(0, 3.0), (7, 12.0), (9, 8.0), (15, 8.0), (22, -4.0), (30, 9.5)]);
    let v = 8.0;

    let above: Vec<Sample> = timeseries::above(&samples, v).collect();
    let below: Vec<Sample> = timeseries::below(&samples, v).collect();

    for original in &samples {
        let a = above
            .iter()
            .find(|s| s.timestamp == original.timestamp)
            .unwrap();
        let b = below
            .iter()
            .find(|s| s.timestamp == original.timestamp)
            .unwrap();
        assert_eq!(a.numeric_value - b.numeric_value, original.numeric_value - v);
    }
}

#[test]
fn hysteresis_suppresses_chatter() {
    let config = HysteresisConfig::high(80.0, 70.0);

    // Trips once, then hovers in the dead band without clearing
    let chatter = series(&[(0, 60.0), (1, 85.0), (2, 75.0), (3, 79.0), (4, 72.0), (5, 78.0)]);
    assert!(timeseries::hysteresis(&chatter, &config));

    // Never trips: dead band alone cannot raise a fault
    let hovering = series(&[(0, 60.0), (1, 75.0), (2, 79.0), (3, 72.0)]);
    assert!(!timeseries::hysteresis(&hovering, &config));
}

#[test]
fn timeliness_boundary() {
    let mut summary = SeriesSummary::new(Some(Duration::seconds(60)));
    summary.observe(&Sample::new(ts(0), 1.0)).unwrap();
    summary.observe(&Sample::new(ts(60), 1.0)).unwrap();

    assert!(summary.is_timely(ts(60 + 180)));
    assert!(!summary.is_timely(ts(60 + 180) + Duration::milliseconds(1)));
}

#[test]
fn duty_cycle_and_edges_on_switch_series() {
    let samples = vec![
        Sample::boolean(ts(0), false),
        Sample::boolean(ts(100), false),
        Sample::boolean(ts(100), true),
        Sample::boolean(ts(150), true),
        Sample::boolean(ts(150), false),
        Sample::boolean(ts(200), false),
    ];

    assert_eq!(timeseries::average_true(&samples, ts(0), ts(200)), 0.25);
    assert_eq!(timeseries::count_leading_edge(&samples, ts(0), ts(200)), 1.0);
    assert_eq!(
        timeseries::duration_above_zero(&samples, ts(0), ts(200)),
        Duration::seconds(50)
    );
}
