//! Interpolation Primitive
//!
//! Walks consecutive sample pairs and clips each pair to a `[start, end]`
//! window, linearly interpolating the boundary values. Every windowed
//! aggregate in this crate is a fold over these segments.

use std::borrow::Borrow;

use chrono::{DateTime, Duration, Utc};

use crate::sample::{millis, Sample};

/// One pair of adjacent samples clipped to the request window
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<S> {
    /// Raw sample at the start of the pair
    pub previous: S,
    /// Selected value at `previous_time` (interpolated when clipped)
    pub previous_value: f64,
    /// Segment start, never earlier than the window start
    pub previous_time: DateTime<Utc>,
    /// Raw sample at the end of the pair
    pub current: S,
    /// Selected value at `current_time` (interpolated when clipped)
    pub current_value: f64,
    /// Segment end, never later than the window end
    pub current_time: DateTime<Utc>,
}

impl<S> Segment<S> {
    /// Time covered by the clipped segment
    pub fn duration(&self) -> Duration {
        self.current_time - self.previous_time
    }

    /// Trapezoidal area under the segment, in value-milliseconds
    pub fn riemann_sum(&self) -> f64 {
        (self.previous_value + self.current_value) / 2.0 * millis(self.duration())
    }
}

/// Linear interpolation between `(d1, v1)` and `(d2, v2)` evaluated at `t`
///
/// A zero-length segment yields the mean of both values.
pub fn linear_interpolate(
    v1: f64,
    v2: f64,
    d1: DateTime<Utc>,
    d2: DateTime<Utc>,
    t: DateTime<Utc>,
) -> f64 {
    let span = millis(d2 - d1);
    if span == 0.0 {
        return (v1 + v2) / 2.0;
    }
    let slope = (v2 - v1) / span;
    v1 + slope * millis(t - d1)
}

/// Lazy, single-pass sequence of [`Segment`]s over a window
///
/// The iterator owns its input, so it cannot be walked twice; collect it
/// first when the segments are needed more than once.
///
/// ```compile_fail
/// use chrono::{TimeZone, Utc};
/// use strata_model::timeseries::SeriesExt;
/// use strata_model::{selectors, Sample};
///
/// let t0 = Utc.timestamp_opt(0, 0).unwrap();
/// let t1 = Utc.timestamp_opt(10, 0).unwrap();
/// let samples = vec![Sample::new(t0, 1.0), Sample::new(t1, 2.0)];
///
/// let segments = samples.iter().interpolated(t0, t1, selectors::numeric);
/// let first_pass: Vec<_> = segments.collect();
/// let second_pass: Vec<_> = segments.collect();
/// ```
#[derive(Debug, Clone)]
pub struct Interpolated<I: Iterator, F> {
    iter: I,
    previous: Option<I::Item>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    selector: F,
    finished: bool,
}

impl<I, F> Interpolated<I, F>
where
    I: Iterator,
    I::Item: Borrow<Sample> + Clone,
    F: Fn(&Sample) -> f64,
{
    pub fn new(iter: I, start: DateTime<Utc>, end: DateTime<Utc>, selector: F) -> Self {
        Self {
            iter,
            previous: None,
            start,
            end,
            selector,
            finished: false,
        }
    }
}

impl<I, F> Iterator for Interpolated<I, F>
where
    I: Iterator,
    I::Item: Borrow<Sample> + Clone,
    F: Fn(&Sample) -> f64,
{
    type Item = Segment<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let current = self.iter.next()?;
            let Some(previous) = self.previous.replace(current.clone()) else {
                continue;
            };

            let (prev, curr) = (previous.borrow(), current.borrow());

            // Entirely before the window
            if curr.timestamp < self.start {
                continue;
            }

            // Entirely after the window; input is ordered so nothing later qualifies
            if prev.timestamp > self.end {
                self.finished = true;
                return None;
            }

            let raw_start = (self.selector)(prev);
            let raw_end = (self.selector)(curr);

            let (previous_value, previous_time) = if prev.timestamp <= self.start {
                let v = linear_interpolate(
                    raw_start,
                    raw_end,
                    prev.timestamp,
                    curr.timestamp,
                    self.start,
                );
                (v, self.start)
            } else {
                (raw_start, prev.timestamp)
            };

            let (current_value, current_time) = if curr.timestamp > self.end {
                let v = linear_interpolate(
                    raw_start,
                    raw_end,
                    prev.timestamp,
                    curr.timestamp,
                    self.end,
                );
                (v, self.end)
            } else {
                (raw_end, curr.timestamp)
            };

            return Some(Segment {
                previous,
                previous_value,
                previous_time,
                current,
                current_value,
                current_time,
            });
        }
    }
}

/// Interpolated segments flattened into `(time, value)` points
///
/// The first segment contributes both of its endpoints, every later
/// segment only its end.
pub struct InterpolatedMerged<I: Iterator, F> {
    segments: Interpolated<I, F>,
    pending: Option<(DateTime<Utc>, f64)>,
    started: bool,
}

impl<I, F> InterpolatedMerged<I, F>
where
    I: Iterator,
    I::Item: Borrow<Sample> + Clone,
    F: Fn(&Sample) -> f64,
{
    pub fn new(segments: Interpolated<I, F>) -> Self {
        Self {
            segments,
            pending: None,
            started: false,
        }
    }
}

impl<I, F> Iterator for InterpolatedMerged<I, F>
where
    I: Iterator,
    I::Item: Borrow<Sample> + Clone,
    F: Fn(&Sample) -> f64,
{
    type Item = (DateTime<Utc>, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(point) = self.pending.take() {
            return Some(point);
        }

        let segment = self.segments.next()?;
        let end_point = (segment.current_time, segment.current_value);

        if self.started {
            return Some(end_point);
        }

        self.started = true;
        self.pending = Some(end_point);
        Some((segment.previous_time, segment.previous_value))
    }
}
