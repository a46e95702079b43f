//! Time Series Analytics
//!
//! Pure functions and lazy iterators over ordered sample sequences.
//!
//! Every function assumes its input is non-decreasing by timestamp and
//! never re-sorts. Windowed functions take `start` / `end` bounds and a
//! value selector from [`crate::sample::selectors`] where the reading
//! matters. Lazy producers ([`Interpolated`], [`Clipped`], [`Union`],
//! [`Multiply`]) take ownership of their input iterator and can be
//! traversed once.

mod aggregate;
mod combine;
mod edges;
mod hysteresis;
mod interpolate;
mod regression;
mod threshold;

pub use aggregate::{
    average, average_above, average_below, average_true, delta, duration_above_zero, max, min,
};
pub use combine::{multiply, union, Multiply, Union};
pub use edges::{count_leading_edge, EdgeState};
pub use hysteresis::{hysteresis, HysteresisConfig, HysteresisState};
pub use interpolate::{linear_interpolate, Interpolated, InterpolatedMerged, Segment};
pub use regression::{forecast, slope, LinearRegression};
pub use threshold::{above, below, intersect, Clipped, Side};

use std::borrow::Borrow;

use chrono::{DateTime, Utc};

use crate::sample::Sample;

/// Iterator adaptors for sample sequences
pub trait SeriesExt: Iterator + Sized
where
    Self::Item: Borrow<Sample>,
{
    /// Window-clipped segments of consecutive samples
    fn interpolated<F>(
        self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        selector: F,
    ) -> Interpolated<Self, F>
    where
        Self::Item: Clone,
        F: Fn(&Sample) -> f64,
    {
        Interpolated::new(self, start, end, selector)
    }

    /// Window-clipped segments flattened into `(time, value)` points
    fn interpolated_merged<F>(
        self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        selector: F,
    ) -> InterpolatedMerged<Self, F>
    where
        Self::Item: Clone,
        F: Fn(&Sample) -> f64,
    {
        InterpolatedMerged::new(Interpolated::new(self, start, end, selector))
    }

    /// Distance above `v`, with crossing points inserted
    fn above(self, v: f64) -> Clipped<Self> {
        Clipped::new(self, Side::Above, v)
    }

    /// Distance below `v`, with crossing points inserted
    fn below(self, v: f64) -> Clipped<Self> {
        Clipped::new(self, Side::Below, v)
    }
}

impl<I> SeriesExt for I
where
    I: Iterator,
    I::Item: Borrow<Sample>,
{
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::sample::selectors;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_extension_methods_match_free_functions() {
        let samples = vec![
            Sample::new(ts(0), 10.0),
            Sample::new(ts(10), 20.0),
            Sample::new(ts(20), 10.0),
        ];

        let via_ext: Vec<Sample> = samples.iter().above(15.0).collect();
        let via_fn: Vec<Sample> = above(&samples, 15.0).collect();
        assert_eq!(via_ext, via_fn);

        let via_ext: Vec<Sample> = samples.iter().below(15.0).collect();
        let via_fn: Vec<Sample> = below(&samples, 15.0).collect();
        assert_eq!(via_ext, via_fn);
    }

    #[test]
    fn test_collected_segments_can_be_reused() {
        let samples = vec![Sample::new(ts(0), 1.0), Sample::new(ts(10), 3.0)];
        let segments: Vec<_> = samples
            .iter()
            .interpolated(ts(0), ts(10), selectors::numeric)
            .collect();

        let first: f64 = segments.iter().map(|s| s.riemann_sum()).sum();
        let second: f64 = segments.iter().map(|s| s.riemann_sum()).sum();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exhausted_iterator_stays_exhausted() {
        let samples = vec![Sample::new(ts(0), 1.0), Sample::new(ts(10), 3.0)];
        let mut points = samples
            .iter()
            .interpolated_merged(ts(0), ts(10), selectors::numeric);

        assert_eq!(points.by_ref().count(), 2);
        assert_eq!(points.next(), None);
    }
}
