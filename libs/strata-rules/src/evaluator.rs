//! Rule Evaluator - single pass of one rule over one entity's telemetry
//!
//! Flow:
//! 1. Every bound series must be present and timely, otherwise the pass
//!    reports insufficient data instead of a verdict
//! 2. Each binding reduces its series over the window into one variable
//! 3. The expression is evaluated against those variables
//! 4. A bool result is a fault verdict; anything else is a reported value

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use strata_expr::{Env, Evaluator, Expr, NoRelations, RelationResolver, Value};
use strata_model::{Sample, SeriesSummary, TimelinessConfig};
use tracing::{debug, warn};

use crate::binding::VariableBinding;
use crate::error::{Result, RuleError};

/// Telemetry for one series: the window's samples plus its rolling summary
#[derive(Debug, Clone)]
pub struct SeriesData {
    pub samples: Vec<Sample>,
    pub summary: SeriesSummary,
}

impl SeriesData {
    pub fn new(samples: Vec<Sample>, summary: SeriesSummary) -> Self {
        Self { samples, summary }
    }

    /// Build the summary by observing every sample in order
    pub fn from_samples(
        samples: Vec<Sample>,
        trend_interval: Option<chrono::Duration>,
    ) -> strata_model::Result<Self> {
        let mut summary = SeriesSummary::new(trend_interval);
        for sample in &samples {
            summary.observe(sample)?;
        }
        Ok(Self { samples, summary })
    }
}

/// Result of one evaluation pass
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Listed series were missing or stale; no verdict
    InsufficientData { series: Vec<String> },
    Faulted,
    Healthy,
    /// Non-boolean result, e.g. an impact score
    Value(Value),
}

impl Outcome {
    pub fn is_faulted(&self) -> bool {
        matches!(self, Outcome::Faulted)
    }
}

/// Compiled rule: expression plus the bindings feeding its variables
pub struct RuleEvaluator {
    expression: Expr,
    bindings: Vec<VariableBinding>,
    timeliness: TimelinessConfig,
    resolver: Arc<dyn RelationResolver>,
}

impl std::fmt::Debug for RuleEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEvaluator")
            .field("expression", &self.expression.to_string())
            .field("bindings", &self.bindings)
            .field("timeliness", &self.timeliness)
            .finish()
    }
}

impl RuleEvaluator {
    /// Pair `expression` with its bindings
    ///
    /// Fails when an aggregate's parameters are out of range, when an
    /// expression variable has no binding, or when a binding produces a
    /// type other than the one the variable was declared with.
    pub fn new(expression: Expr, bindings: Vec<VariableBinding>) -> Result<Self> {
        let by_name: FxHashMap<&str, &VariableBinding> = bindings
            .iter()
            .map(|b| (b.variable.as_str(), b))
            .collect();

        for binding in &bindings {
            binding.aggregate.check()?;
        }

        for (name, declared) in expression.variables() {
            let binding = by_name
                .get(name.as_str())
                .ok_or_else(|| RuleError::UnboundVariable(name.clone()))?;

            if let Some(produced) = binding.aggregate.value_type() {
                let compatible =
                    produced == declared || (produced.is_numeric() && declared.is_numeric());
                if !compatible {
                    return Err(RuleError::BindingType {
                        variable: name,
                        expected: declared,
                        produced,
                    });
                }
            }
        }

        Ok(Self {
            expression,
            bindings,
            timeliness: TimelinessConfig::default(),
            resolver: Arc::new(NoRelations),
        })
    }

    pub fn with_timeliness(mut self, config: TimelinessConfig) -> Self {
        self.timeliness = config;
        self
    }

    /// Graph consulted for relation nodes
    pub fn with_resolver(mut self, resolver: Arc<dyn RelationResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn bindings(&self) -> &[VariableBinding] {
        &self.bindings
    }

    /// Evaluate over `[start, end]`, judging staleness at `now`
    ///
    /// # Arguments
    /// * `series` - Telemetry keyed by series name
    /// * `start` / `end` - Window passed to every aggregate
    /// * `now` - Instant used for the timeliness check
    ///
    /// # Returns
    /// * `Ok(Outcome)` - Verdict, value or insufficient data
    /// * `Err(RuleError)` - An aggregate or the expression failed to evaluate
    pub fn evaluate(
        &self,
        series: &FxHashMap<String, SeriesData>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Outcome> {
        let mut missing = Vec::new();
        let mut checked = FxHashSet::default();

        for binding in &self.bindings {
            if !checked.insert(binding.series.as_str()) {
                continue;
            }
            let timely = series
                .get(&binding.series)
                .is_some_and(|data| data.summary.is_timely_with(now, &self.timeliness));
            if !timely {
                missing.push(binding.series.clone());
            }
        }

        if !missing.is_empty() {
            debug!(series = ?missing, "Insufficient data for rule");
            return Ok(Outcome::InsufficientData { series: missing });
        }

        let mut env = Env::new();
        for binding in &self.bindings {
            let samples = series
                .get(&binding.series)
                .map(|data| data.samples.as_slice())
                .unwrap_or_default();
            let value = binding.aggregate.apply(samples, start, end)?;
            debug!(variable = %binding.variable, value = %value, "Bound variable");
            env.set(binding.variable.as_str(), value);
        }

        let result = Evaluator::new(&env)
            .with_resolver(self.resolver.as_ref())
            .evaluate(&self.expression)
            .map_err(|e| {
                warn!(expression = %self.expression, error = %e, "Rule evaluation failed");
                RuleError::from(e)
            })?;

        Ok(match result {
            Value::Bool(true) => Outcome::Faulted,
            Value::Bool(false) => Outcome::Healthy,
            other => Outcome::Value(other),
        })
    }
}
