//! Hysteresis Fault Detection
//!
//! Separate trip and reset thresholds keep a fault raised while the
//! signal hovers in the dead band between them.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::sample::Sample;

/// Trip and reset thresholds; an absent value disables that check
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HysteresisConfig {
    /// Reading above this raises a high fault
    #[serde(default)]
    pub high_limit: Option<f64>,
    /// Reading below this raises a low fault
    #[serde(default)]
    pub low_limit: Option<f64>,
    /// A high fault is held while the reading stays above this
    #[serde(default)]
    pub high_reset: Option<f64>,
    /// A low fault is held while the reading stays below this
    #[serde(default)]
    pub low_reset: Option<f64>,
}

impl HysteresisConfig {
    pub fn high(limit: f64, reset: f64) -> Self {
        Self {
            high_limit: Some(limit),
            high_reset: Some(reset),
            ..Self::default()
        }
    }

    pub fn low(limit: f64, reset: f64) -> Self {
        Self {
            low_limit: Some(limit),
            low_reset: Some(reset),
            ..Self::default()
        }
    }
}

/// Per-step state of the hysteresis fold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HysteresisState {
    /// High fault on the last step
    pub high: bool,
    /// Low fault on the last step
    pub low: bool,
    /// Any fault on any step so far
    pub output: bool,
}

impl HysteresisState {
    /// Advance by one reading
    pub fn step(self, sample: &Sample, config: &HysteresisConfig) -> Self {
        let value = sample.numeric_value;
        let flagged = sample.bool_value.unwrap_or(false);

        let high = match config.high_limit {
            Some(limit) if value > limit => true,
            Some(_) => config
                .high_reset
                .is_some_and(|reset| (flagged || self.high) && value > reset),
            None => false,
        };

        let low = match config.low_limit {
            Some(limit) if value < limit => true,
            Some(_) => config
                .low_reset
                .is_some_and(|reset| (flagged || self.low) && value < reset),
            None => false,
        };

        Self {
            high,
            low,
            output: self.output || high || low,
        }
    }
}

/// Whether any reading in the pass faulted, honouring reset dead bands
pub fn hysteresis<I>(samples: I, config: &HysteresisConfig) -> bool
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    samples
        .into_iter()
        .fold(HysteresisState::default(), |state, sample| {
            state.step(sample.borrow(), config)
        })
        .output
}
