//! Rule Engine Error Types

use serde::Serialize;
use strata_expr::{EvalError, ValueType};
use thiserror::Error;

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Rule engine errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    /// Expression variable with no series binding
    #[error("Variable '{0}' has no binding")]
    UnboundVariable(String),

    /// Binding produces a different type than the expression declares
    #[error("Binding for '{variable}' produces {produced}, expression expects {expected}")]
    BindingType {
        variable: String,
        expected: ValueType,
        produced: ValueType,
    },

    /// Aggregate parameters outside their usable range
    #[error("Invalid aggregate: {0}")]
    InvalidAggregate(String),

    /// Expression evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    /// Descriptor failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

// ============================================================================
// Validation
// ============================================================================

/// Which check a descriptor failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Constraint {
    /// Field missing or blank
    Required,
    /// Name contains characters outside its allowed set
    InvalidCharacters,
    /// Parameter name without any letter
    MissingLetter,
    /// Expression text rejected by the parser
    Unparseable,
    /// Expression parsed but applies an operator to incompatible operands
    TypeMismatch,
}

/// Non-fatal validation failure
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ValidationError {
    pub constraint: Constraint,
    /// Field of the descriptor that failed
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(constraint: Constraint, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            constraint,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn required(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Constraint::Required, field, message)
    }
}
