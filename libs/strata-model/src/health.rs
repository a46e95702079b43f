//! Series Health
//!
//! A rolling per-point summary updated one sample at a time, and the
//! timeliness / health classifiers evaluated against it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{HealthConfig, TimelinessConfig};
use crate::error::{ModelError, Result};
use crate::sample::{millis, Sample};

/// Rolling summary of one point's telemetry
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    /// Configured reporting interval, when known
    pub trend_interval: Option<Duration>,
    /// Model id of the point, consulted for stuck exemptions
    pub model_id: Option<String>,
    /// Unit of measure
    pub unit: Option<String>,
    /// Timestamp of the newest accepted sample
    pub last_seen: Option<DateTime<Utc>>,
    /// Gap between the two newest accepted samples
    pub last_gap: Duration,
    /// Smoothed sampling period
    pub estimated_period: Duration,
    /// Accepted samples
    pub count: u64,
    /// Smallest numeric payload seen
    pub min_value: f64,
    /// Largest numeric payload seen
    pub max_value: f64,
    /// Text payload of the newest sample, if it was textual
    pub last_text: Option<String>,
    smoothing: f64,
}

/// Health flags for one series at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesHealth {
    pub offline: bool,
    pub stuck: bool,
    pub period_out_of_range: bool,
}

impl SeriesHealth {
    pub fn is_healthy(&self) -> bool {
        !(self.offline || self.stuck || self.period_out_of_range)
    }
}

impl SeriesSummary {
    pub fn new(trend_interval: Option<Duration>) -> Self {
        Self {
            trend_interval,
            model_id: None,
            unit: None,
            last_seen: None,
            last_gap: Duration::zero(),
            estimated_period: Duration::zero(),
            count: 0,
            min_value: f64::INFINITY,
            max_value: f64::NEG_INFINITY,
            last_text: None,
            smoothing: HealthConfig::default().period_smoothing,
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Use the period smoothing factor from `config`
    pub fn with_health_config(mut self, config: &HealthConfig) -> Self {
        self.smoothing = config.period_smoothing;
        self
    }

    /// Fold one sample into the summary
    ///
    /// Samples must arrive strictly in time order; older or duplicate
    /// timestamps are rejected and leave the summary unchanged.
    pub fn observe(&mut self, sample: &Sample) -> Result<()> {
        if let Some(last_seen) = self.last_seen {
            if sample.timestamp < last_seen {
                return Err(ModelError::OutOfOrder {
                    last_seen,
                    incoming: sample.timestamp,
                });
            }
            if sample.timestamp == last_seen {
                return Err(ModelError::DuplicateTimestamp(sample.timestamp));
            }

            self.last_gap = sample.timestamp - last_seen;
            self.estimated_period = if self.estimated_period.is_zero() {
                self.last_gap
            } else {
                let est = millis(self.estimated_period);
                let smoothed = est + self.smoothing * (millis(self.last_gap) - est);
                Duration::microseconds((smoothed * 1000.0).round() as i64)
            };
        }

        self.last_seen = Some(sample.timestamp);
        self.count += 1;

        if sample.is_text() {
            self.last_text = sample.text_value.clone();
        } else {
            self.last_text = None;
            self.min_value = self.min_value.min(sample.numeric_value);
            self.max_value = self.max_value.max(sample.numeric_value);
        }

        Ok(())
    }

    pub fn is_text(&self) -> bool {
        self.last_text.is_some()
    }

    /// Larger of the estimated period and the configured interval, in seconds
    fn effective_interval_secs(&self) -> f64 {
        let trend = self.trend_interval.map_or(0.0, |t| millis(t) / 1000.0);
        (millis(self.estimated_period) / 1000.0).max(trend)
    }

    /// Staleness check with the default three-interval tolerance
    pub fn is_timely(&self, now: DateTime<Utc>) -> bool {
        self.is_timely_with(now, &TimelinessConfig::default())
    }

    /// Whether the newest data is recent and regular enough to trust
    ///
    /// # Returns
    /// * `true` for text series, which report on events rather than a cadence
    /// * `false` with fewer than two samples
    /// * `true` when no trend interval is configured
    /// * otherwise `true` only if neither the silence since the last sample
    ///   nor the last gap exceeds `gap_multiplier` effective intervals
    pub fn is_timely_with(&self, now: DateTime<Utc>, config: &TimelinessConfig) -> bool {
        if self.is_text() {
            return true;
        }
        if self.count < 2 {
            return false;
        }
        let Some(last_seen) = self.last_seen else {
            return false;
        };
        if self.trend_interval.is_none() {
            return true;
        }

        let long_gap_secs = config.gap_multiplier * self.effective_interval_secs();
        let silence_secs = millis(now - last_seen) / 1000.0;

        if silence_secs > long_gap_secs {
            debug!(silence_secs, long_gap_secs, "series silent too long");
            return false;
        }

        millis(self.last_gap) / 1000.0 <= long_gap_secs
    }

    /// Offline / stuck / irregular-period classification at `now`
    pub fn health(&self, now: DateTime<Utc>, config: &HealthConfig) -> SeriesHealth {
        let text = self.is_text();

        let offline = match self.last_seen {
            Some(last_seen) => {
                let silence_secs = millis(now - last_seen) / 1000.0;
                let too_old = silence_secs > config.offline_max_age_secs as f64;
                let too_quiet = self.trend_interval.is_some()
                    && silence_secs > config.offline_multiplier * self.effective_interval_secs();
                (too_old || too_quiet) && !text
            },
            None => false,
        };

        let model_id = self.model_id.as_deref().unwrap_or("");
        let exempt = config
            .stuck_exempt_models
            .iter()
            .any(|suffix| model_id.ends_with(suffix.as_str()))
            || self
                .unit
                .as_deref()
                .is_some_and(|unit| unit.eq_ignore_ascii_case("bool"));

        let stuck = self.count > config.stuck_min_samples
            && self.min_value == self.max_value
            && self.min_value != 0.0
            && !text
            && !exempt;

        let period_out_of_range = match self.trend_interval {
            Some(trend) if self.count > 1 => {
                let est = millis(self.estimated_period);
                let trend = millis(trend);
                est < config.period_low_ratio * trend || est > config.period_high_ratio * trend
            },
            _ => false,
        };

        SeriesHealth {
            offline,
            stuck,
            period_out_of_range,
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn summary(trend: Option<i64>, points: &[(i64, f64)]) -> SeriesSummary {
        let mut summary = SeriesSummary::new(trend.map(Duration::seconds));
        for &(t, v) in points {
            summary.observe(&Sample::new(ts(t), v)).unwrap();
        }
        summary
    }

    #[test]
    fn test_observe_tracks_gap_and_range() {
        let s = summary(None, &[(0, 3.0), (60, 1.0), (180, 2.0)]);
        assert_eq!(s.count, 3);
        assert_eq!(s.last_seen, Some(ts(180)));
        assert_eq!(s.last_gap, Duration::seconds(120));
        assert_eq!(s.min_value, 1.0);
        assert_eq!(s.max_value, 3.0);
    }

    #[test]
    fn test_observe_smooths_period() {
        let s = summary(None, &[(0, 1.0), (60, 1.0), (160, 1.0)]);
        // 60 + 0.2 * (100 - 60)
        assert_eq!(s.estimated_period, Duration::seconds(68));
    }

    #[test]
    fn test_observe_rejects_out_of_order() {
        let mut s = summary(None, &[(10, 1.0)]);
        assert!(matches!(
            s.observe(&Sample::new(ts(5), 1.0)),
            Err(ModelError::OutOfOrder { .. })
        ));
        assert_eq!(
            s.observe(&Sample::new(ts(10), 1.0)),
            Err(ModelError::DuplicateTimestamp(ts(10)))
        );
        assert_eq!(s.count, 1);
    }

    #[test]
    fn test_text_series_always_timely() {
        let mut s = SeriesSummary::new(Some(Duration::seconds(60)));
        s.observe(&Sample::text(ts(0), "alarm")).unwrap();
        assert!(s.is_timely(ts(1_000_000)));
    }

    #[test]
    fn test_needs_two_samples() {
        let s = summary(Some(60), &[(0, 1.0)]);
        assert!(!s.is_timely(ts(1)));
    }

    #[test]
    fn test_no_trend_interval_is_timely() {
        let s = summary(None, &[(0, 1.0), (10, 1.0)]);
        assert!(s.is_timely(ts(1_000_000)));
    }

    #[test]
    fn test_long_last_gap_is_untimely() {
        let s = summary(Some(60), &[(0, 1.0), (1000, 1.0)]);
        // Estimated period absorbs the gap on the first update
        assert!(s.is_timely(ts(1000)));

        let mut s = summary(Some(60), &[(0, 1.0), (60, 1.0), (120, 1.0)]);
        s.observe(&Sample::new(ts(1000), 1.0)).unwrap();
        assert!(!s.is_timely(ts(1000)));
    }

    #[test]
    fn test_custom_gap_multiplier() {
        let s = summary(Some(60), &[(0, 1.0), (60, 1.0)]);
        let strict = TimelinessConfig {
            gap_multiplier: 1.0,
        };
        assert!(s.is_timely_with(ts(120), &strict));
        assert!(!s.is_timely_with(ts(121), &strict));
    }

    #[test]
    fn test_offline() {
        let config = HealthConfig::default();
        let s = summary(Some(60), &[(0, 1.0), (60, 2.0)]);
        assert!(!s.health(ts(600), &config).offline);
        assert!(s.health(ts(661), &config).offline);

        let no_interval = summary(None, &[(0, 1.0), (60, 2.0)]);
        assert!(!no_interval.health(ts(100_000), &config).offline);
        assert!(no_interval.health(ts(60 + 7 * 86_400 + 1), &config).offline);
    }

    #[test]
    fn test_stuck() {
        let config = HealthConfig {
            stuck_min_samples: 3,
            ..HealthConfig::default()
        };
        let points: Vec<(i64, f64)> = (0..5).map(|i| (i * 60, 21.5)).collect();
        assert!(summary(Some(60), &points).health(ts(300), &config).stuck);

        let zeros: Vec<(i64, f64)> = (0..5).map(|i| (i * 60, 0.0)).collect();
        assert!(!summary(Some(60), &zeros).health(ts(300), &config).stuck);

        let setpoint = summary(Some(60), &points).with_model_id("dtmi:com:example:Setpoint;1");
        assert!(!setpoint.health(ts(300), &config).stuck);

        let boolean = summary(Some(60), &points).with_unit("Bool");
        assert!(!boolean.health(ts(300), &config).stuck);
    }

    #[test]
    fn test_period_out_of_range() {
        let config = HealthConfig::default();
        let fast = summary(Some(600), &[(0, 1.0), (10, 2.0)]);
        assert!(fast.health(ts(10), &config).period_out_of_range);

        let regular = summary(Some(60), &[(0, 1.0), (60, 2.0)]);
        let health = regular.health(ts(60), &config);
        assert!(!health.period_out_of_range);
        assert!(health.is_healthy());
    }
}
