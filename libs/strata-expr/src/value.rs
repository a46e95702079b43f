//! Runtime values produced by evaluation

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::EvalError;
use crate::types::ValueType;

/// A typed runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Instant(DateTime<Utc>),
    Duration(Duration),
    /// Opaque id of a related entity
    Entity(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Bool,
            Value::Text(_) => ValueType::Text,
            Value::Instant(_) => ValueType::Instant,
            Value::Duration(_) => ValueType::Duration,
            Value::Entity(_) => ValueType::Entity,
        }
    }

    /// Numeric reading; booleans read as 1 / 0
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Truth reading; numbers are true when non-zero
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0 && !n.is_nan()),
            _ => None,
        }
    }

    pub(crate) fn number(&self, operation: &str) -> Result<f64, EvalError> {
        self.as_number()
            .ok_or_else(|| EvalError::type_mismatch(operation, "number", self.value_type()))
    }

    pub(crate) fn truth(&self, operation: &str) -> Result<bool, EvalError> {
        self.as_bool()
            .ok_or_else(|| EvalError::type_mismatch(operation, "bool", self.value_type()))
    }

    /// Bitwise identity of the payload; NaN equals NaN
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Instant(t)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Value::Duration(d)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) | Value::Entity(s) => f.write_str(s),
            Value::Instant(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Duration(d) => write!(f, "{}", d),
        }
    }
}
