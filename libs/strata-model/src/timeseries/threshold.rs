//! Threshold Clipping
//!
//! Keeps only the part of a curve on one side of the line `y = v`,
//! re-expressed as distance from the line. Exact crossing points are
//! inserted as zero-valued samples so that integrating the clipped curve
//! gives the area between the curve and the threshold.

use std::borrow::Borrow;

use chrono::{DateTime, Utc};

use crate::sample::{from_millis, millis, Sample};

/// Which side of the threshold survives clipping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Above,
    Below,
}

impl Side {
    /// Distance of `value` past the threshold on this side, zero otherwise
    fn clip(self, value: f64, threshold: f64) -> f64 {
        match self {
            Side::Above if value > threshold => value - threshold,
            Side::Below if value < threshold => threshold - value,
            _ => 0.0,
        }
    }
}

/// Lazy, single-pass clipped sequence produced by [`above`] and [`below`]
///
/// One output sample is produced per input sample, plus one zero-valued
/// sample for every strict crossing of the threshold.
#[derive(Debug, Clone)]
pub struct Clipped<I> {
    iter: I,
    side: Side,
    threshold: f64,
    previous: Option<Sample>,
    pending: Option<Sample>,
}

impl<I> Clipped<I>
where
    I: Iterator,
    I::Item: Borrow<Sample>,
{
    pub fn new(iter: I, side: Side, threshold: f64) -> Self {
        Self {
            iter,
            side,
            threshold,
            previous: None,
            pending: None,
        }
    }
}

impl<I> Iterator for Clipped<I>
where
    I: Iterator,
    I::Item: Borrow<Sample>,
{
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if let Some(queued) = self.pending.take() {
            return Some(queued);
        }

        let item = self.iter.next()?;
        let current = item.borrow();
        let clipped = Sample::new(
            current.timestamp,
            self.side.clip(current.numeric_value, self.threshold),
        );

        let crossing = self
            .previous
            .as_ref()
            .and_then(|previous| intersect(previous, current, self.threshold));

        // Keep the raw point, not the clipped one, for the next crossing test
        self.previous = Some(current.clone());

        match crossing {
            Some(at) => {
                self.pending = Some(clipped);
                Some(Sample::new(at, 0.0))
            },
            None => Some(clipped),
        }
    }
}

/// Where the segment `a -> b` crosses `y = v`, if its endpoints lie strictly
/// on opposite sides of the line
///
/// The crossing instant is rounded to the nearest microsecond.
pub fn intersect(a: &Sample, b: &Sample, v: f64) -> Option<DateTime<Utc>> {
    let (d1, d2) = (a.numeric_value, b.numeric_value);
    let opposite = (d1 < v && d2 > v) || (d1 > v && d2 < v);
    if !opposite {
        return None;
    }

    let span = millis(b.timestamp - a.timestamp);
    let slope = (d2 - d1) / span;
    let offset = (v - d1) / slope;
    Some(a.timestamp + from_millis(offset))
}

/// Portion of the curve above `v`, as distance above `v`
pub fn above<I>(samples: I, v: f64) -> Clipped<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    Clipped::new(samples.into_iter(), Side::Above, v)
}

/// Portion of the curve below `v`, as distance below `v`
pub fn below<I>(samples: I, v: f64) -> Clipped<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    Clipped::new(samples.into_iter(), Side::Below, v)
}
