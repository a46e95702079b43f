//! Integration tests for rule evaluation over bound series

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::{DateTime, Duration, TimeZone, Utc};
use rustc_hash::FxHashMap;
use strata_expr::{Expr, Value, ValueType};
use strata_model::{Sample, SeriesSummary};
use strata_rules::{Aggregate, Outcome, RuleError, RuleEvaluator, SeriesData, VariableBinding};

fn t(s: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(s, 0).unwrap()
}

/// Summary of a series reporting every minute up to `t(120)`
fn timely_summary() -> SeriesSummary {
    let mut summary = SeriesSummary::new(Some(Duration::seconds(60)));
    for i in 0..3 {
        summary.observe(&Sample::new(t(i * 60), 20.0)).unwrap();
    }
    summary
}

fn projected_rule(horizon_secs: i64) -> RuleEvaluator {
    RuleEvaluator::new(
        Expr::variable("projected", ValueType::Number),
        vec![VariableBinding::new(
            "projected",
            "zone",
            Aggregate::Forecast { horizon_secs },
        )],
    )
    .unwrap()
}

fn series(samples: Vec<Sample>) -> FxHashMap<String, SeriesData> {
    let mut map = FxHashMap::default();
    map.insert("zone".to_string(), SeriesData::new(samples, timely_summary()));
    map
}

#[test]
fn test_forecast_over_empty_window_is_nan() {
    let outcome = projected_rule(3600)
        .evaluate(&series(Vec::new()), t(0), t(120), t(150))
        .unwrap();
    assert!(matches!(outcome, Outcome::Value(Value::Number(n)) if n.is_nan()));
}

#[test]
fn test_forecast_over_single_sample_returns_it() {
    let outcome = projected_rule(3600)
        .evaluate(&series(vec![Sample::new(t(60), 22.5)]), t(0), t(120), t(150))
        .unwrap();
    assert_eq!(outcome, Outcome::Value(Value::Number(22.5)));
}

#[test]
fn test_forecast_extrapolates_trend() {
    let samples = vec![Sample::new(t(0), 20.0), Sample::new(t(60), 21.0), Sample::new(t(120), 22.0)];
    let outcome = projected_rule(120)
        .evaluate(&series(samples), t(0), t(120), t(150))
        .unwrap();
    match outcome {
        Outcome::Value(Value::Number(n)) => assert!((n - 24.0).abs() < 1e-6, "forecast {}", n),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_forecast_horizon_out_of_range_rejected() {
    let err = RuleEvaluator::new(
        Expr::variable("projected", ValueType::Number),
        vec![VariableBinding::new(
            "projected",
            "zone",
            Aggregate::Forecast {
                horizon_secs: i64::MIN,
            },
        )],
    )
    .unwrap_err();
    assert!(matches!(err, RuleError::InvalidAggregate(_)));
}

#[test]
fn test_horizon_from_rule_file_is_checked() {
    let binding: VariableBinding = serde_json::from_str(
        r#"{ "variable": "projected", "series": "zone", "function": "forecast", "horizon_secs": 9223372036854775807 }"#,
    )
    .unwrap();
    let err = RuleEvaluator::new(Expr::variable("projected", ValueType::Number), vec![binding])
        .unwrap_err();
    assert!(err.to_string().contains("forecast horizon"));
}
