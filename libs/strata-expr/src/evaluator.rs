//! Evaluator - computes the runtime value of an expression tree
//!
//! Supports:
//! - Arithmetic: +, -, *, /, ^ over numbers (booleans read as 1 / 0)
//! - Temporal arithmetic: instant ± duration, instant - instant, duration ± duration
//! - Text concatenation with +
//! - Comparison: <, >, <=, >=, ==, !=, is
//! - Logic: &, |, ! (short-circuiting)
//! - Match against ranges, literal sets and regular expressions
//! - Relation navigation through a [`RelationResolver`]

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::EvalError;
use crate::node::{BinaryOp, Expr, NaryOp, Pattern, UnaryOp};
use crate::relation::{NoRelations, RelationResolver};
use crate::types::ValueType;
use crate::value::Value;
use crate::visitor::Visitor;

pub type EvalResult = std::result::Result<Value, EvalError>;

/// Variable bindings for one evaluation
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Env {
    variables: FxHashMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Evaluation visitor
///
/// # Example
/// ```
/// use strata_expr::{Env, Evaluator, Expr, Value, ValueType};
///
/// let temp = Expr::variable("temp", ValueType::Number);
/// let too_hot = Expr::greater(temp, Expr::number(26.0));
///
/// let env = Env::new().with("temp", 27.5);
/// let result = Evaluator::new(&env).evaluate(&too_hot).unwrap();
/// assert_eq!(result, Value::Bool(true));
/// ```
pub struct Evaluator<'a> {
    env: &'a Env,
    resolver: &'a dyn RelationResolver,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator with no relation resolver
    pub fn new(env: &'a Env) -> Self {
        Self {
            env,
            resolver: &NoRelations,
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn RelationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        let result = expr.accept(self);
        if let Err(e) = &result {
            debug!(expression = %expr, error = %e, "evaluation failed");
        }
        result
    }
}

impl Expr {
    /// Evaluate against `env` without relation support
    pub fn evaluate(&self, env: &Env) -> EvalResult {
        Evaluator::new(env).evaluate(self)
    }
}

impl Visitor for Evaluator<'_> {
    type Output = EvalResult;

    fn visit_constant(&mut self, _expr: &Expr, value: &Value) -> EvalResult {
        Ok(value.clone())
    }

    fn visit_variable(&mut self, _expr: &Expr, name: &str, _value_type: ValueType) -> EvalResult {
        self.env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::unbound(name))
    }

    fn visit_unary(&mut self, _expr: &Expr, op: UnaryOp, child: &Expr) -> EvalResult {
        let value = child.accept(self)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!value.truth(op.symbol())?)),
            UnaryOp::Negate => match value {
                Value::Duration(d) => Ok(Value::Duration(-d)),
                other => Ok(Value::Number(-other.number(op.symbol())?)),
            },
        }
    }

    fn visit_binary(&mut self, _expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult {
        let l = left.accept(self)?;
        let r = right.accept(self)?;
        apply_binary(op, &l, &r)
    }

    fn visit_nary(&mut self, _expr: &Expr, op: NaryOp, children: &[Expr]) -> EvalResult {
        match op {
            NaryOp::And => {
                for child in children {
                    if !child.accept(self)?.truth(op.symbol())? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            },
            NaryOp::Or => {
                for child in children {
                    if child.accept(self)?.truth(op.symbol())? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            },
            NaryOp::Multiply => {
                let mut product = 1.0;
                for child in children {
                    product *= child.accept(self)?.number(op.symbol())?;
                }
                Ok(Value::Number(product))
            },
            NaryOp::Add => {
                let values = children
                    .iter()
                    .map(|child| child.accept(self))
                    .collect::<Result<Vec<_>, _>>()?;
                add_values(values)
            },
        }
    }

    fn visit_relation(
        &mut self,
        _expr: &Expr,
        name: &str,
        source: &Expr,
        result_type: ValueType,
    ) -> EvalResult {
        let source = source.accept(self)?;
        let related = self.resolver.resolve(name, &source).ok_or_else(|| {
            EvalError::UnresolvedRelation {
                relation: name.to_string(),
                source_type: source.value_type(),
            }
        })?;

        let found = related.value_type();
        if found != result_type && !(found.is_numeric() && result_type.is_numeric()) {
            return Err(EvalError::type_mismatch(name, result_type.as_str(), found));
        }
        Ok(related)
    }

    fn visit_match(&mut self, _expr: &Expr, left: &Expr, pattern: &Pattern) -> EvalResult {
        let value = left.accept(self)?;
        let matched = match pattern {
            Pattern::Range { low, high } => {
                let n = value.number("matches")?;
                *low <= n && n <= *high
            },
            Pattern::Set(candidates) => candidates.iter().any(|c| loose_eq(&value, c)),
            Pattern::Regex(re) => match &value {
                Value::Text(s) | Value::Entity(s) => re.is_match(s),
                other => {
                    return Err(EvalError::type_mismatch(
                        "matches",
                        "text",
                        other.value_type(),
                    ))
                },
            },
        };
        Ok(Value::Bool(matched))
    }
}

// ============================================================================
// Operator semantics
// ============================================================================

fn apply_binary(op: BinaryOp, l: &Value, r: &Value) -> EvalResult {
    let sym = op.symbol();
    match op {
        BinaryOp::Subtract => subtract(l, r),
        BinaryOp::Divide => Ok(Value::Number(l.number(sym)? / r.number(sym)?)),
        BinaryOp::Power => Ok(Value::Number(l.number(sym)?.powf(r.number(sym)?))),
        BinaryOp::Equals => Ok(Value::Bool(loose_eq(l, r))),
        BinaryOp::NotEquals => Ok(Value::Bool(!loose_eq(l, r))),
        BinaryOp::Is => Ok(Value::Bool(l.value_type() == r.value_type() && l == r)),
        BinaryOp::Greater | BinaryOp::GreaterOrEqual | BinaryOp::Less | BinaryOp::LessOrEqual => {
            compare(op, l, r)
        },
    }
}

fn subtract(l: &Value, r: &Value) -> EvalResult {
    match (l, r) {
        (Value::Instant(a), Value::Instant(b)) => Ok(Value::Duration(a.signed_duration_since(*b))),
        (Value::Instant(a), Value::Duration(d)) => a
            .checked_sub_signed(*d)
            .map(Value::Instant)
            .ok_or_else(|| EvalError::temporal_overflow("-")),
        (Value::Duration(a), Value::Duration(b)) => a
            .checked_sub(b)
            .map(Value::Duration)
            .ok_or_else(|| EvalError::temporal_overflow("-")),
        _ => Ok(Value::Number(l.number("-")? - r.number("-")?)),
    }
}

/// Equality with booleans coerced to 1 / 0 against numbers
fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l.as_number(), r.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => l == r,
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> EvalResult {
    use std::cmp::Ordering;

    let ordering = match (l, r) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Instant(a), Value::Instant(b)) => Some(a.cmp(b)),
        (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
        _ => match (l.as_number(), r.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(EvalError::type_mismatch(
                    op.symbol(),
                    l.value_type().as_str(),
                    r.value_type(),
                ))
            },
        },
    };

    // NaN compares false either way
    let result = ordering.is_some_and(|o| match op {
        BinaryOp::Greater => o == Ordering::Greater,
        BinaryOp::GreaterOrEqual => o != Ordering::Less,
        BinaryOp::Less => o == Ordering::Less,
        BinaryOp::LessOrEqual => o != Ordering::Greater,
        _ => false,
    });
    Ok(Value::Bool(result))
}

fn add_values(values: Vec<Value>) -> EvalResult {
    if values.iter().any(|v| matches!(v, Value::Text(_))) {
        let joined: String = values.iter().map(ToString::to_string).collect();
        return Ok(Value::Text(joined));
    }

    let instants: Vec<_> = values
        .iter()
        .filter_map(|v| match v {
            Value::Instant(t) => Some(*t),
            _ => None,
        })
        .collect();
    let durations: Vec<_> = values
        .iter()
        .filter_map(|v| match v {
            Value::Duration(d) => Some(*d),
            _ => None,
        })
        .collect();

    if !values.is_empty() && durations.len() == values.len() {
        let total = durations
            .into_iter()
            .try_fold(chrono::Duration::zero(), |acc, d| acc.checked_add(&d))
            .ok_or_else(|| EvalError::temporal_overflow("+"))?;
        return Ok(Value::Duration(total));
    }

    if let [instant] = instants.as_slice() {
        if instants.len() + durations.len() == values.len() {
            let shifted = durations
                .into_iter()
                .try_fold(*instant, |acc, d| acc.checked_add_signed(d))
                .ok_or_else(|| EvalError::temporal_overflow("+"))?;
            return Ok(Value::Instant(shifted));
        }
    }

    let mut sum = 0.0;
    for v in &values {
        sum += v.number("+")?;
    }
    Ok(Value::Number(sum))
}
