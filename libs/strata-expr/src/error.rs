//! Error types for strata-expr

use thiserror::Error;

use crate::types::ValueType;

/// Construction-time errors, raised while building a tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    /// Left side of a match is boolean or is itself a comparison, logical or match node
    #[error("Invalid match operand: {operand}")]
    InvalidMatchOperand { operand: String },

    #[error("Invalid match pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ExprError {
    pub fn invalid_match_operand(operand: impl Into<String>) -> Self {
        Self::InvalidMatchOperand {
            operand: operand.into(),
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Evaluation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Variable not found: {0}")]
    UnboundVariable(String),

    #[error("Type mismatch in {operation}: expected {expected}, found {found}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: ValueType,
    },

    #[error("Relation '{relation}' could not be resolved from {source_type}")]
    UnresolvedRelation {
        relation: String,
        source_type: ValueType,
    },

    /// Instant or duration arithmetic left the representable range
    #[error("Temporal overflow in {operation}")]
    TemporalOverflow { operation: String },
}

impl EvalError {
    pub fn unbound(name: impl Into<String>) -> Self {
        Self::UnboundVariable(name.into())
    }

    pub fn type_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        found: ValueType,
    ) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            found,
        }
    }

    pub fn temporal_overflow(operation: impl Into<String>) -> Self {
        Self::TemporalOverflow {
            operation: operation.into(),
        }
    }
}

/// Failure reported by an external expression parser
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}{}", .position.map(|p| format!(" at position {}", p)).unwrap_or_default())]
pub struct ParseError {
    pub message: String,
    /// Character offset of the failure, when the parser knows it
    pub position: Option<usize>,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExprError>;

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        assert_eq!(ParseError::new("unexpected end").to_string(), "unexpected end");
        assert_eq!(
            ParseError::at("unexpected ')'", 7).to_string(),
            "unexpected ')' at position 7"
        );
    }

    #[test]
    fn test_eval_error_display() {
        let err = EvalError::type_mismatch("and", "bool", ValueType::Number);
        assert_eq!(
            err.to_string(),
            "Type mismatch in and: expected bool, found number"
        );
    }
}
