//! Sample Model
//!
//! An immutable time-stamped reading as delivered by the telemetry store.
//! Exactly one payload is meaningful for a given series; analytics pick
//! the payload through a selector function.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single time-stamped reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,

    /// Numeric payload (also carries 1.0 / 0.0 for boolean points)
    pub numeric_value: f64,

    /// Boolean payload, when the point is binary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,

    /// Text payload, for event-style points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_value: Option<String>,
}

impl Sample {
    /// Create a numeric sample
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            numeric_value: value,
            bool_value: None,
            text_value: None,
        }
    }

    /// Create a boolean sample; the numeric payload mirrors the flag as 1.0 / 0.0
    pub fn boolean(timestamp: DateTime<Utc>, value: bool) -> Self {
        Self {
            timestamp,
            numeric_value: if value { 1.0 } else { 0.0 },
            bool_value: Some(value),
            text_value: None,
        }
    }

    /// Create a text sample
    pub fn text(timestamp: DateTime<Utc>, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            numeric_value: 0.0,
            bool_value: None,
            text_value: Some(value.into()),
        }
    }

    /// A sample whose numeric payload is NaN, used as a "no value" default
    pub fn invalid() -> Self {
        Self::new(DateTime::<Utc>::MIN_UTC, f64::NAN)
    }

    /// Attach a boolean flag to a numeric sample
    pub fn with_flag(mut self, flag: bool) -> Self {
        self.bool_value = Some(flag);
        self
    }

    /// Same timestamp and same payload
    pub fn is_same(&self, other: &Sample) -> bool {
        self.timestamp == other.timestamp
            && self.numeric_value.to_bits() == other.numeric_value.to_bits()
            && self.bool_value == other.bool_value
            && self.text_value == other.text_value
    }

    /// Whether this sample carries a text payload
    pub fn is_text(&self) -> bool {
        self.text_value.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Value selectors passed to the analytics functions
pub mod selectors {
    use super::Sample;

    /// Numeric payload as-is
    pub fn numeric(sample: &Sample) -> f64 {
        sample.numeric_value
    }

    /// Boolean payload as 1.0 / 0.0, falling back to `numeric > 0`
    pub fn boolean(sample: &Sample) -> f64 {
        let on = sample.bool_value.unwrap_or(sample.numeric_value > 0.0);
        if on {
            1.0
        } else {
            0.0
        }
    }

    /// Boolean payload when present, numeric payload otherwise
    pub fn reading(sample: &Sample) -> f64 {
        match sample.bool_value {
            Some(_) => boolean(sample),
            None => sample.numeric_value,
        }
    }
}

/// Duration as fractional milliseconds (microsecond resolution)
pub(crate) fn millis(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(us) => us as f64 / 1000.0,
        None => duration.num_milliseconds() as f64,
    }
}

/// Fractional milliseconds back to a duration, rounded to the microsecond
pub(crate) fn from_millis(ms: f64) -> Duration {
    Duration::microseconds((ms * 1000.0).round() as i64)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_boolean_sample_mirrors_numeric() {
        let on = Sample::boolean(ts(0), true);
        assert_eq!(on.numeric_value, 1.0);
        assert_eq!(selectors::boolean(&on), 1.0);
        assert_eq!(selectors::reading(&on), 1.0);
    }

    #[test]
    fn test_boolean_selector_falls_back_to_numeric() {
        assert_eq!(selectors::boolean(&Sample::new(ts(0), 3.5)), 1.0);
        assert_eq!(selectors::boolean(&Sample::new(ts(0), 0.0)), 0.0);
        assert_eq!(selectors::boolean(&Sample::new(ts(0), -2.0)), 0.0);
    }

    #[test]
    fn test_reading_prefers_bool_payload() {
        let flagged = Sample::new(ts(0), 42.0).with_flag(false);
        assert_eq!(selectors::reading(&flagged), 0.0);
        assert_eq!(selectors::reading(&Sample::new(ts(0), 42.0)), 42.0);
    }

    #[test]
    fn test_is_same() {
        let a = Sample::new(ts(10), 1.5);
        assert!(a.is_same(&Sample::new(ts(10), 1.5)));
        assert!(!a.is_same(&Sample::new(ts(11), 1.5)));
        assert!(!a.is_same(&Sample::new(ts(10), 1.6)));
        assert!(Sample::invalid().is_same(&Sample::invalid()));
    }

    #[test]
    fn test_millis_round_trip() {
        let d = Duration::milliseconds(1500) + Duration::microseconds(250);
        assert_eq!(millis(d), 1500.25);
        assert_eq!(from_millis(1500.25), d);
    }

    #[test]
    fn test_serde_skips_absent_payloads() {
        let json = serde_json::to_string(&Sample::new(ts(0), 1.0)).unwrap();
        assert!(!json.contains("bool_value"));
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Sample::new(ts(0), 1.0));
    }
}
