//! Analytics Configuration
//!
//! Tunables for the timeliness and health classifiers. Both structs
//! deserialize with defaults for every missing field so they can sit in
//! a layered service configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Staleness rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelinessConfig {
    /// Missed-interval tolerance: data older than this many effective
    /// intervals is stale
    pub gap_multiplier: f64,
}

impl Default for TimelinessConfig {
    fn default() -> Self {
        Self {
            gap_multiplier: 3.0,
        }
    }
}

impl TimelinessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gap_multiplier.is_nan() || self.gap_multiplier <= 0.0 {
            return Err(ModelError::invalid_config(
                "gap_multiplier",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Series health rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Offline once silent for this many effective intervals
    pub offline_multiplier: f64,
    /// Offline once silent for this long regardless of interval
    pub offline_max_age_secs: u64,
    /// Minimum samples before a constant series counts as stuck
    pub stuck_min_samples: u64,
    /// Period below this fraction of the trend interval is out of range
    pub period_low_ratio: f64,
    /// Period above this multiple of the trend interval is out of range
    pub period_high_ratio: f64,
    /// Smoothing factor for the sampling period estimate, in `(0, 1]`
    pub period_smoothing: f64,
    /// Model ids ending with any of these never count as stuck
    pub stuck_exempt_models: Vec<String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            offline_multiplier: 10.0,
            offline_max_age_secs: 7 * 24 * 3600,
            stuck_min_samples: 50,
            period_low_ratio: 0.1,
            period_high_ratio: 1.9,
            period_smoothing: 0.2,
            stuck_exempt_models: vec![
                "Actuator;1".to_string(),
                "Setpoint;1".to_string(),
                "Energy;1".to_string(),
                "dtmi:com:willowinc:Sensor;1".to_string(),
            ],
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.offline_multiplier.is_nan() || self.offline_multiplier <= 0.0 {
            return Err(ModelError::invalid_config(
                "offline_multiplier",
                "must be greater than zero",
            ));
        }
        if self.period_low_ratio.is_nan() || self.period_low_ratio >= self.period_high_ratio {
            return Err(ModelError::invalid_config(
                "period_low_ratio",
                "must be below period_high_ratio",
            ));
        }
        if !(0.0..=1.0).contains(&self.period_smoothing) || self.period_smoothing == 0.0 {
            return Err(ModelError::invalid_config(
                "period_smoothing",
                "must be in (0, 1]",
            ));
        }
        Ok(())
    }
}
