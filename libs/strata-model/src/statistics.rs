//! Statistics Summary
//!
//! Min / average / max of a series over a window, with a NaN sentinel
//! for "no data". NaN is never compared; only display logic inspects it.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sample::Sample;
use crate::timeseries;

/// Summary statistics for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub min: f64,
    pub average: f64,
    pub max: f64,
    #[serde(default)]
    pub unit: String,
}

impl Stat {
    pub fn new(min: f64, average: f64, max: f64, unit: impl Into<String>) -> Self {
        Self {
            min,
            average,
            max,
            unit: unit.into(),
        }
    }

    /// Sentinel for a series with no usable samples
    pub fn none(unit: impl Into<String>) -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN, unit)
    }

    pub fn is_none(&self) -> bool {
        self.min.is_nan() && self.average.is_nan() && self.max.is_nan()
    }

    fn suffix(&self) -> String {
        if self.unit.is_empty() {
            String::new()
        } else {
            format!(" {}", self.unit)
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "n/a");
        }
        if self.min == self.max {
            return write!(f, "{:.2}{}", self.min, self.suffix());
        }
        write!(
            f,
            "{:.2}/{:.2}/{:.2}{}",
            self.min,
            self.average,
            self.max,
            self.suffix()
        )
    }
}

/// Summarise `samples` over `[window_start, now]`
///
/// # Returns
/// [`Stat::none`] when there are no samples, when every sample precedes the
/// window, or when every sample follows `now`.
pub fn calculate_statistics<S>(
    samples: &[S],
    window_start: DateTime<Utc>,
    now: DateTime<Utc>,
    unit: &str,
) -> Stat
where
    S: Borrow<Sample> + Clone,
{
    if samples.is_empty()
        || samples.iter().all(|s| s.borrow().timestamp < window_start)
        || samples.iter().all(|s| s.borrow().timestamp > now)
    {
        return Stat::none(unit);
    }

    let invalid = Sample::invalid();
    let average = timeseries::average(samples.iter().cloned(), window_start, now);
    let min = timeseries::min(samples.iter().cloned(), window_start, now, &invalid);
    let max = timeseries::max(samples.iter().cloned(), window_start, now, &invalid);

    Stat::new(min, average, max, unit)
}

/// Population standard deviation of the numeric payloads; NaN when empty
pub fn standard_deviation<I>(samples: I) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    let values: Vec<f64> = samples
        .into_iter()
        .map(|s| s.borrow().numeric_value)
        .collect();

    if values.is_empty() {
        return f64::NAN;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn series(points: &[(i64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(t, v)| Sample::new(ts(t), v)).collect()
    }

    #[test]
    fn test_none_sentinel() {
        let stat = Stat::none("degC");
        assert!(stat.is_none());
        assert_eq!(stat.to_string(), "n/a");
        assert!(!Stat::new(1.0, 1.0, 1.0, "degC").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Stat::new(2.0, 2.0, 2.0, "kW").to_string(), "2.00 kW");
        assert_eq!(Stat::new(1.0, 2.5, 4.0, "").to_string(), "1.00/2.50/4.00");
    }

    #[test]
    fn test_calculate_statistics() {
        let samples = series(&[(0, 10.0), (10, 20.0), (20, 10.0)]);
        let stat = calculate_statistics(&samples, ts(0), ts(20), "degC");
        assert_eq!(stat.min, 10.0);
        assert_eq!(stat.max, 20.0);
        assert_eq!(stat.average, 15.0);
        assert_eq!(stat.unit, "degC");
    }

    #[test]
    fn test_calculate_statistics_outside_window() {
        let samples = series(&[(0, 10.0), (10, 20.0)]);
        assert!(calculate_statistics(&samples, ts(100), ts(200), "").is_none());
        assert!(calculate_statistics(&samples, ts(-100), ts(-50), "").is_none());

        let empty: Vec<Sample> = Vec::new();
        assert!(calculate_statistics(&empty, ts(0), ts(10), "").is_none());
    }

    #[test]
    fn test_standard_deviation() {
        let samples = series(&[(0, 2.0), (1, 4.0), (2, 4.0), (3, 4.0), (4, 5.0), (5, 5.0), (6, 7.0), (7, 9.0)]);
        assert_eq!(standard_deviation(&samples), 2.0);

        let empty: Vec<Sample> = Vec::new();
        assert!(standard_deviation(&empty).is_nan());
    }
}
