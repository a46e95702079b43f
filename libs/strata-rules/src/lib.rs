//! Strata Rules - rule validation and evaluation
//!
//! Rule, global and parameter descriptors arrive from an external CRUD
//! layer. This crate provides:
//! - Validators returning structured, non-fatal errors
//! - Id normalisation helpers
//! - Variable bindings from telemetry series to expression variables
//! - Single-pass rule evaluation for one entity
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Descriptor  │────▶│  Validation  │────▶│ ParsedExpr   │
//! │ (CRUD layer) │     │ (+ parser)   │     │ (strata-expr)│
//! └──────────────┘     └──────────────┘     └──────┬───────┘
//!                                                  │
//! ┌──────────────┐     ┌──────────────┐            ▼
//! │   Samples    │────▶│   Bindings   │────▶ RuleEvaluator ──▶ Outcome
//! │ (per series) │     │ (analytics)  │
//! └──────────────┘     └──────────────┘
//! ```

mod binding;
mod error;
mod evaluator;
mod id;
pub mod types;
mod validation;

// Re-export public API
pub use binding::{Aggregate, VariableBinding};
pub use error::{Constraint, Result, RuleError, ValidationError};
pub use evaluator::{Outcome, RuleEvaluator, SeriesData};
pub use id::{is_id_standard, to_id_standard};
pub use validation::{
    validate_expression, validate_function_name, validate_global, validate_global_name,
    validate_rule, ReportEntry, Validation, ValidationReport,
};

// Re-export descriptor types for convenience
pub use types::{FunctionParameter, GlobalVariable, GlobalVariableType, RuleDescriptor, RuleParameter};
