//! Descriptor validation
//!
//! Validators never fail hard: each returns the first problem found as a
//! [`ValidationError`] tagged with the [`Constraint`] it broke. Parse
//! failures from the external parser are caught, logged with their root
//! cause and reported as [`Constraint::Unparseable`].

use serde::Serialize;
use strata_expr::{Expr, ExpressionParser};
use tracing::{debug, warn};

use crate::error::{Constraint, ValidationError};
use crate::types::{FunctionParameter, GlobalVariable, RuleDescriptor, RuleParameter};

/// Outcome of a single validator
pub type Validation = std::result::Result<(), ValidationError>;

// ============================================================================
// Names
// ============================================================================

/// Global names: letters and digits only
pub fn validate_global_name(global: &GlobalVariable) -> Validation {
    let label = format!("{} Name", global.variable_type);

    if global.name.is_empty() {
        return Err(ValidationError::required(
            "name",
            format!("{} is required", label),
        ));
    }

    if !global.name.chars().all(char::is_alphanumeric) {
        return Err(ValidationError::new(
            Constraint::InvalidCharacters,
            "name",
            format!("{} may only contain letters and digits", label),
        ));
    }

    Ok(())
}

/// Parameter names: letters, digits and underscores, with at least one
/// letter and no leading digit
pub fn validate_function_name(parameter: &FunctionParameter) -> Validation {
    let name = &parameter.name;

    if name.is_empty() {
        return Err(ValidationError::required(
            "name",
            "Parameter name is required",
        ));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::new(
            Constraint::InvalidCharacters,
            "name",
            "Parameter name may only contain letters, digits and underscores",
        ));
    }

    if !name.chars().any(char::is_alphabetic) {
        return Err(ValidationError::new(
            Constraint::MissingLetter,
            "name",
            "Parameter name must contain at least one letter",
        ));
    }

    if name.starts_with(|c: char| c.is_numeric()) {
        return Err(ValidationError::new(
            Constraint::InvalidCharacters,
            "name",
            "Parameter name must start with a letter or underscore",
        ));
    }

    Ok(())
}

/// Global name plus every parameter name
pub fn validate_global(global: &GlobalVariable) -> Validation {
    validate_global_name(global)?;
    global
        .parameters
        .iter()
        .try_for_each(validate_function_name)
}

// ============================================================================
// Expressions
// ============================================================================

/// Parse `text`, converting a parser failure into [`Constraint::Unparseable`]
///
/// # Arguments
/// * `field` - Descriptor field holding the text, echoed in the error
/// * `text` - Expression source
/// * `parser` - External grammar
pub fn validate_expression(
    field: &str,
    text: &str,
    parser: &dyn ExpressionParser,
) -> std::result::Result<Expr, ValidationError> {
    parser.parse(text).map_err(|err| {
        warn!(expression = %text, error = %err, "Could not parse expression");
        ValidationError::new(
            Constraint::Unparseable,
            field,
            format!("Could not parse {}: {}", text, err),
        )
    })
}

fn check_named(kind: &str, parameter: &RuleParameter) -> Validation {
    if parameter.name.trim().is_empty() {
        return Err(ValidationError::required(
            "name",
            format!("{} {} is missing the 'Name' field", kind, parameter.field_id),
        ));
    }
    if parameter.field_id.trim().is_empty() {
        return Err(ValidationError::required(
            "field_id",
            format!("{} {} is missing the 'FieldId' field", kind, parameter.name),
        ));
    }
    Ok(())
}

/// Structural checks, then every expression must parse and type-check
///
/// The type check is stricter than a parse-only check: a rule whose
/// operands are incompatible, e.g. `occupied & zone_temp` over a numeric
/// `zone_temp`, is rejected here with [`Constraint::TypeMismatch`] rather
/// than failing later at evaluation time.
pub fn validate_rule(rule: &RuleDescriptor, parser: &dyn ExpressionParser) -> Validation {
    debug!(rule_id = %rule.id, "Validating rule");

    if rule.primary_model_id.trim().is_empty() {
        return Err(ValidationError::required(
            "primary_model_id",
            "PrimaryModelId field is required",
        ));
    }

    for parameter in &rule.parameters {
        check_named("Capability", parameter)?;
    }
    for score in &rule.impact_scores {
        check_named("ImpactScore", score)?;
    }

    for parameter in rule.parameters.iter().chain(&rule.impact_scores) {
        let expr = validate_expression(&parameter.name, &parameter.point_expression, parser)?;

        if let Err(issues) = expr.type_check() {
            let detail: Vec<String> = issues.iter().map(ToString::to_string).collect();
            return Err(ValidationError::new(
                Constraint::TypeMismatch,
                parameter.name.as_str(),
                format!(
                    "{} has incompatible operands: {}",
                    parameter.point_expression,
                    detail.join("; ")
                ),
            ));
        }
    }

    Ok(())
}

// ============================================================================
// Reports
// ============================================================================

/// One failed descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Rule id or global name
    pub id: String,
    pub error: ValidationError,
}

/// Validation results over many descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    checked: usize,
    entries: Vec<ReportEntry>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of validating descriptor `id`
    pub fn record(&mut self, id: impl Into<String>, validation: Validation) {
        self.checked += 1;
        if let Err(error) = validation {
            self.entries.push(ReportEntry {
                id: id.into(),
                error,
            });
        }
    }

    pub fn validate_rules<'a>(
        rules: impl IntoIterator<Item = &'a RuleDescriptor>,
        parser: &dyn ExpressionParser,
    ) -> Self {
        let mut report = Self::new();
        for rule in rules {
            report.record(rule.id.as_str(), validate_rule(rule, parser));
        }
        report
    }

    pub fn validate_globals<'a>(globals: impl IntoIterator<Item = &'a GlobalVariable>) -> Self {
        let mut report = Self::new();
        for global in globals {
            report.record(global.name.as_str(), validate_global(global));
        }
        report
    }

    pub fn is_ok(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors validated so far
    pub fn checked(&self) -> usize {
        self.checked
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Failures that broke `constraint`
    pub fn with_constraint(&self, constraint: Constraint) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(move |e| e.error.constraint == constraint)
    }
}
