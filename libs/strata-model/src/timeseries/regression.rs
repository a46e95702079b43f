//! Linear Regression
//!
//! Ordinary least squares with time on the x-axis measured in days from
//! the first point.

use std::borrow::Borrow;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::interpolate::{Interpolated, InterpolatedMerged};
use crate::sample::{millis, selectors, Sample};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fitted line `value = intercept + slope * days_since_origin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    /// Change in value per day; NaN when fitted on no points
    pub slope: f64,
    /// Value at the origin
    pub intercept: f64,
    /// Number of points fitted
    pub count: usize,
    origin: Option<DateTime<Utc>>,
}

impl LinearRegression {
    /// Fit a line through `(time, value)` points
    ///
    /// With no spread in time the line is flat through the mean value.
    pub fn fit<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, f64)>,
    {
        let mut iter = points.into_iter().peekable();
        let Some(&(origin, _)) = iter.peek() else {
            return Self {
                slope: f64::NAN,
                intercept: f64::NAN,
                count: 0,
                origin: None,
            };
        };

        let xy: Vec<(f64, f64)> = iter.map(|(t, v)| (days(t - origin), v)).collect();
        let n = xy.len() as f64;
        let mean_x = xy.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = xy.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (sxx, sxy) = xy.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });

        let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };

        Self {
            slope,
            intercept: mean_y - slope * mean_x,
            count: xy.len(),
            origin: Some(origin),
        }
    }

    /// Value of the fitted line at `at`
    pub fn extrapolate(&self, at: DateTime<Utc>) -> f64 {
        match self.origin {
            Some(origin) => self.intercept + self.slope * days(at - origin),
            None => f64::NAN,
        }
    }
}

fn days(duration: Duration) -> f64 {
    millis(duration) / MILLIS_PER_DAY
}

/// Regression slope (per day) over the interpolated window
pub fn slope<I>(samples: I, start: DateTime<Utc>, end: DateTime<Utc>) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample> + Clone,
{
    let points = InterpolatedMerged::new(Interpolated::new(
        samples.into_iter(),
        start,
        end,
        selectors::numeric,
    ));
    LinearRegression::fit(points).slope
}

/// Extrapolate the regression line to `horizon` past the last sample
///
/// No samples gives NaN; a single sample is returned as-is. A target past
/// the representable range also gives NaN.
pub fn forecast<I>(samples: I, horizon: Duration) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<Sample>,
{
    let points: Vec<(DateTime<Utc>, f64)> = samples
        .into_iter()
        .map(|s| {
            let s = s.borrow();
            (s.timestamp, s.numeric_value)
        })
        .collect();

    match points.as_slice() {
        [] => f64::NAN,
        [(_, only)] => *only,
        [.., (last, _)] => match last.checked_add_signed(horizon) {
            Some(target) => LinearRegression::fit(points.iter().copied()).extrapolate(target),
            None => {
                debug!(%last, ?horizon, "forecast: target out of range");
                f64::NAN
            },
        },
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(n * 86_400, 0).unwrap()
    }

    #[test]
    fn test_fit_exact_line() {
        let fit = LinearRegression::fit(vec![(day(0), 1.0), (day(1), 3.0), (day(2), 5.0)]);
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.extrapolate(day(5)) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_empty_is_nan() {
        let fit = LinearRegression::fit(Vec::new());
        assert!(fit.slope.is_nan());
        assert!(fit.extrapolate(day(1)).is_nan());
    }

    #[test]
    fn test_fit_no_time_spread_is_flat() {
        let fit = LinearRegression::fit(vec![(day(3), 2.0), (day(3), 4.0)]);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 3.0);
    }

    #[test]
    fn test_slope_per_day() {
        let samples = vec![Sample::new(day(0), 10.0), Sample::new(day(4), 2.0)];
        let s = slope(&samples, day(0), day(4));
        assert!((s + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast() {
        let samples = vec![
            Sample::new(day(0), 0.0),
            Sample::new(day(1), 1.0),
            Sample::new(day(2), 2.0),
        ];
        let f = forecast(&samples, Duration::days(2));
        assert!((f - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecast_degenerate() {
        let empty: Vec<Sample> = Vec::new();
        assert!(forecast(&empty, Duration::days(1)).is_nan());
        assert_eq!(forecast(&[Sample::new(day(0), 7.5)], Duration::days(1)), 7.5);
    }

    #[test]
    fn test_forecast_past_representable_range_is_nan() {
        let samples = vec![Sample::new(day(0), 1.0), Sample::new(day(1), 2.0)];
        assert!(forecast(&samples, Duration::MAX).is_nan());
        assert!(forecast(&samples, Duration::MIN).is_nan());
    }
}
