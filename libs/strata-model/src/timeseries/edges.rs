//! Rising-edge counting over a boolean-as-numeric reading

use std::borrow::Borrow;
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};

use crate::sample::Sample;

/// Running state for [`count_leading_edge`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeState {
    /// Last known on/off reading, including readings before the window
    pub current: bool,
    /// Rising edges seen inside the window
    pub count: usize,
}

impl EdgeState {
    /// Apply one sample; `Break` once the sample lies after `end`
    pub fn step(
        self,
        sample: &Sample,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ControlFlow<EdgeState, EdgeState> {
        let on = sample.numeric_value > 0.0;

        if sample.timestamp < start {
            return ControlFlow::Continue(EdgeState {
                current: on,
                ..self
            });
        }
        if sample.timestamp > end {
            return ControlFlow::Break(self);
        }

        let count = if on && !self.current {
            self.count + 1
        } else {
            self.count
        };
        ControlFlow::Continue(EdgeState { current: on, count })
    }
}

/// Count false -> true transitions within `[start, end]`
pub fn count_leading_edge<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    let state = samples
        .into_iter()
        .try_fold(EdgeState::default(), |state, sample| {
            state.step(sample.borrow(), start, end)
        });

    let (ControlFlow::Continue(state) | ControlFlow::Break(state)) = state;
    state.count as f64
}
