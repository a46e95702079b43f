//! Variable bindings
//!
//! A binding ties one expression variable to an analytics function applied
//! to one named series over the evaluation window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strata_expr::{Value, ValueType};
use strata_model::timeseries::{self, HysteresisConfig};
use strata_model::{standard_deviation, Sample};

use crate::error::{Result, RuleError};

/// Analytics function reducing a window of samples to one value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum Aggregate {
    /// Newest sample's payload, whatever its kind
    Last,
    Min,
    Max,
    Average,
    /// Fraction of the window spent true
    AverageTrue,
    AverageAbove { threshold: f64 },
    AverageBelow { threshold: f64 },
    Delta,
    /// Regression slope per day
    Slope,
    Forecast { horizon_secs: i64 },
    CountLeadingEdge,
    DurationAboveZero,
    StandardDeviation,
    Hysteresis(HysteresisConfig),
}

impl Aggregate {
    /// Type of the value [`Aggregate::apply`] produces; `None` when it
    /// depends on the payload
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Aggregate::Last => None,
            Aggregate::DurationAboveZero => Some(ValueType::Duration),
            Aggregate::Hysteresis(_) => Some(ValueType::Bool),
            _ => Some(ValueType::Number),
        }
    }

    /// Reject parameters that cannot be applied, such as a forecast
    /// horizon too large to express as a duration
    pub fn check(&self) -> Result<()> {
        if let Aggregate::Forecast { horizon_secs } = *self {
            forecast_horizon(horizon_secs)?;
        }
        Ok(())
    }

    /// Reduce `samples` over `[start, end]`
    pub fn apply(
        &self,
        samples: &[Sample],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Value> {
        let value = match *self {
            Aggregate::Last => samples.last().map_or(Value::Number(f64::NAN), latest),
            Aggregate::Min => timeseries::min(samples, start, end, &Sample::invalid()).into(),
            Aggregate::Max => timeseries::max(samples, start, end, &Sample::invalid()).into(),
            Aggregate::Average => timeseries::average(samples, start, end).into(),
            Aggregate::AverageTrue => timeseries::average_true(samples, start, end).into(),
            Aggregate::AverageAbove { threshold } => {
                timeseries::average_above(samples, start, end, threshold).into()
            },
            Aggregate::AverageBelow { threshold } => {
                timeseries::average_below(samples, start, end, threshold).into()
            },
            Aggregate::Delta => timeseries::delta(samples, start, end).into(),
            Aggregate::Slope => timeseries::slope(samples, start, end).into(),
            Aggregate::Forecast { horizon_secs } => {
                timeseries::forecast(samples, forecast_horizon(horizon_secs)?).into()
            },
            Aggregate::CountLeadingEdge => timeseries::count_leading_edge(samples, start, end).into(),
            Aggregate::DurationAboveZero => {
                timeseries::duration_above_zero(samples, start, end).into()
            },
            Aggregate::StandardDeviation => standard_deviation(samples).into(),
            Aggregate::Hysteresis(config) => timeseries::hysteresis(samples, &config).into(),
        };
        Ok(value)
    }
}

fn forecast_horizon(horizon_secs: i64) -> Result<Duration> {
    Duration::try_seconds(horizon_secs).ok_or_else(|| {
        RuleError::InvalidAggregate(format!(
            "forecast horizon of {} seconds is out of range",
            horizon_secs
        ))
    })
}

fn latest(sample: &Sample) -> Value {
    match (&sample.text_value, sample.bool_value) {
        (Some(text), _) => Value::Text(text.clone()),
        (None, Some(flag)) => Value::Bool(flag),
        (None, None) => Value::Number(sample.numeric_value),
    }
}

/// `variable = aggregate(series)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBinding {
    /// Expression variable receiving the result
    pub variable: String,
    /// Series the samples come from
    pub series: String,
    #[serde(flatten)]
    pub aggregate: Aggregate,
}

impl VariableBinding {
    pub fn new(variable: impl Into<String>, series: impl Into<String>, aggregate: Aggregate) -> Self {
        Self {
            variable: variable.into(),
            series: series.into(),
            aggregate,
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(s: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(s, 0).unwrap()
    }

    fn triangle() -> Vec<Sample> {
        vec![
            Sample::new(t(0), 10.0),
            Sample::new(t(10), 20.0),
            Sample::new(t(20), 10.0),
        ]
    }

    #[test]
    fn test_apply_numeric_aggregates() {
        let samples = triangle();
        let (s, e) = (t(0), t(20));

        assert_eq!(Aggregate::Average.apply(&samples, s, e).unwrap(), Value::Number(15.0));
        assert_eq!(
            Aggregate::AverageAbove { threshold: 15.0 }.apply(&samples, s, e).unwrap(),
            Value::Number(1.25)
        );
        assert_eq!(Aggregate::Max.apply(&samples, s, e).unwrap(), Value::Number(20.0));
        assert_eq!(Aggregate::Delta.apply(&samples, s, e).unwrap(), Value::Number(0.0));
        assert_eq!(
            Aggregate::DurationAboveZero.apply(&samples, s, e).unwrap(),
            Value::Duration(Duration::seconds(20))
        );
    }

    #[test]
    fn test_last_keeps_payload_kind() {
        let samples = vec![Sample::new(t(0), 1.0), Sample::boolean(t(1), true)];
        assert_eq!(Aggregate::Last.apply(&samples, t(0), t(1)).unwrap(), Value::Bool(true));

        let samples = vec![Sample::text(t(0), "occupied")];
        assert_eq!(
            Aggregate::Last.apply(&samples, t(0), t(1)).unwrap(),
            Value::Text("occupied".to_string())
        );

        let empty: Vec<Sample> = Vec::new();
        assert!(matches!(
            Aggregate::Last.apply(&empty, t(0), t(1)).unwrap(),
            Value::Number(n) if n.is_nan()
        ));
    }

    #[test]
    fn test_hysteresis_binding() {
        let samples = vec![
            Sample::new(t(0), 20.0),
            Sample::new(t(60), 31.0),
            Sample::new(t(120), 29.0),
        ];
        let aggregate = Aggregate::Hysteresis(HysteresisConfig::high(30.0, 28.0));
        assert_eq!(aggregate.value_type(), Some(ValueType::Bool));
        assert_eq!(aggregate.apply(&samples, t(0), t(120)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_forecast_horizon_out_of_range() {
        let aggregate = Aggregate::Forecast {
            horizon_secs: i64::MAX,
        };
        assert!(matches!(aggregate.check(), Err(RuleError::InvalidAggregate(_))));

        let samples = triangle();
        let err = aggregate.apply(&samples, t(0), t(20)).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let aggregate = Aggregate::Forecast { horizon_secs: 600 };
        assert!(aggregate.check().is_ok());
        assert!(aggregate.apply(&samples, t(0), t(20)).is_ok());
    }

    #[test]
    fn test_binding_serde_shape() {
        let binding = VariableBinding::new(
            "zone_avg",
            "zone-air-temp",
            Aggregate::AverageAbove { threshold: 24.0 },
        );
        let json = serde_json::to_value(&binding).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "variable": "zone_avg",
                "series": "zone-air-temp",
                "function": "average_above",
                "threshold": 24.0
            })
        );
    }
}
