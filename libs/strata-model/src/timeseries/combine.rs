//! Combining Two Series
//!
//! Both inputs must already be ordered by timestamp.

use std::borrow::Borrow;
use std::iter::Peekable;

use crate::sample::Sample;

/// Stable merge of two ordered series; the left series wins timestamp ties
pub struct Union<A: Iterator, B: Iterator> {
    left: Peekable<A>,
    right: Peekable<B>,
}

impl<A, B, S> Iterator for Union<A, B>
where
    A: Iterator<Item = S>,
    B: Iterator<Item = S>,
    S: Borrow<Sample>,
{
    type Item = S;

    fn next(&mut self) -> Option<S> {
        let take_left = match (self.left.peek(), self.right.peek()) {
            (Some(l), Some(r)) => l.borrow().timestamp <= r.borrow().timestamp,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if take_left {
            self.left.next()
        } else {
            self.right.next()
        }
    }
}

/// Merge two ordered series without de-duplicating timestamps
pub fn union<A, B, S>(left: A, right: B) -> Union<A::IntoIter, B::IntoIter>
where
    A: IntoIterator<Item = S>,
    B: IntoIterator<Item = S>,
    S: Borrow<Sample>,
{
    Union {
        left: left.into_iter().peekable(),
        right: right.into_iter().peekable(),
    }
}

/// Product of the latest value of each series, emitted at every input timestamp
///
/// Values are held, not interpolated. Nothing is emitted until both
/// series have produced a value.
pub struct Multiply<A: Iterator, B: Iterator> {
    left: Peekable<A>,
    right: Peekable<B>,
    last_left: Option<f64>,
    last_right: Option<f64>,
}

impl<A, B> Iterator for Multiply<A, B>
where
    A: Iterator,
    B: Iterator,
    A::Item: Borrow<Sample>,
    B::Item: Borrow<Sample>,
{
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        loop {
            let take_left = match (self.left.peek(), self.right.peek()) {
                (Some(l), Some(r)) => l.borrow().timestamp <= r.borrow().timestamp,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => return None,
            };

            let timestamp = if take_left {
                let sample = self.left.next()?;
                let sample = sample.borrow();
                self.last_left = Some(sample.numeric_value);
                sample.timestamp
            } else {
                let sample = self.right.next()?;
                let sample = sample.borrow();
                self.last_right = Some(sample.numeric_value);
                sample.timestamp
            };

            if let (Some(l), Some(r)) = (self.last_left, self.last_right) {
                return Some(Sample::new(timestamp, l * r));
            }
        }
    }
}

/// Multiply one series by another; booleans act as a 1 / 0 gate
pub fn multiply<A, B>(left: A, right: B) -> Multiply<A::IntoIter, B::IntoIter>
where
    A: IntoIterator,
    B: IntoIterator,
    A::Item: Borrow<Sample>,
    B::Item: Borrow<Sample>,
{
    Multiply {
        left: left.into_iter().peekable(),
        right: right.into_iter().peekable(),
        last_left: None,
        last_right: None,
    }
}
