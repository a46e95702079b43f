//! Windowed Aggregates
//!
//! Folds over interpolated segments. None of these functions fail: an
//! empty or degenerate window falls back to a documented value so a data
//! gap never aborts a rule evaluation.

use std::borrow::Borrow;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::interpolate::Interpolated;
use super::threshold::{above, below};
use crate::sample::{millis, selectors, Sample};

/// Smallest interpolated reading in the window
///
/// # Arguments
/// * `samples` - Ordered samples
/// * `start` / `end` - Window bounds
/// * `default` - Sample whose numeric payload is returned when no segment qualifies
pub fn min<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>, default: &Sample) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    extreme(samples, start, end, default, f64::MAX, f64::min)
}

/// Largest interpolated reading in the window
pub fn max<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>, default: &Sample) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    extreme(samples, start, end, default, f64::MIN, f64::max)
}

fn extreme<I>(
    samples: I,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    default: &Sample,
    init: f64,
    pick: fn(f64, f64) -> f64,
) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    let mut count = 0usize;
    let mut acc = init;

    for segment in Interpolated::new(samples.into_iter(), start, end, selectors::reading) {
        count += 1;
        acc = pick(pick(acc, segment.previous_value), segment.current_value);
    }

    if count == 0 {
        return default.numeric_value;
    }
    acc
}

/// Time-weighted average of the numeric reading over the covered part of the window
///
/// Falls back to the first sample's value when no segment qualifies (NaN
/// for an empty input), and to the last segment's starting sample when the
/// window or the covered time has zero length.
pub fn average<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    let mut iter = samples.into_iter().peekable();
    let first = iter
        .peek()
        .map(|s| s.borrow().numeric_value)
        .unwrap_or(f64::NAN);

    let mut count = 0usize;
    let mut integral = 0.0;
    let mut total_ms = 0.0;
    let mut last_previous = f64::NAN;

    for segment in Interpolated::new(iter, start, end, selectors::numeric) {
        count += 1;
        last_previous = segment.previous.borrow().numeric_value;
        integral += segment.riemann_sum();
        total_ms += millis(segment.duration());
    }

    if count == 0 {
        debug!("average: no segments in window, using first sample");
        return first;
    }
    if end == start || total_ms == 0.0 {
        debug!("average: zero-length window, using point value");
        return last_previous;
    }
    integral / total_ms
}

/// Fraction of the full requested window during which the boolean reading was on
pub fn average_true<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    let mut iter = samples.into_iter().peekable();
    let first = iter
        .peek()
        .map(|s| selectors::boolean(s.borrow()))
        .unwrap_or(f64::NAN);

    let mut count = 0usize;
    let mut integral = 0.0;
    let mut last_previous = f64::NAN;

    for segment in Interpolated::new(iter, start, end, selectors::boolean) {
        count += 1;
        last_previous = segment.previous.borrow().numeric_value;
        integral += segment.riemann_sum();
    }

    if count == 0 {
        return first;
    }
    if end == start {
        return last_previous;
    }
    integral / millis(end - start)
}

/// Last interpolated value minus first interpolated value; zero when empty
pub fn delta<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    let mut first = None;
    let mut last = 0.0;

    for segment in Interpolated::new(samples.into_iter(), start, end, selectors::numeric) {
        first.get_or_insert(segment.previous_value);
        last = segment.current_value;
    }

    first.map_or(0.0, |first| last - first)
}

/// Total time of segments where either endpoint is positive
pub fn duration_above_zero<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>) -> Duration
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    if end == start {
        return Duration::zero();
    }

    Interpolated::new(samples.into_iter(), start, end, selectors::numeric)
        .filter(|segment| segment.previous_value > 0.0 || segment.current_value > 0.0)
        .fold(Duration::zero(), |total, segment| total + segment.duration())
}

/// Average distance above `v`, treating the portion below `v` as zero
pub fn average_above<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>, v: f64) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    average(above(samples, v), start, end)
}

/// Average distance below `v`, treating the portion above `v` as zero
pub fn average_below<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>, v: f64) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    average(below(samples, v), start, end)
}
