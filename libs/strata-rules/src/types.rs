//! Rule descriptor type definitions
//!
//! Descriptors are owned and persisted by the surrounding CRUD layer; this
//! crate only reads them for validation and evaluation:
//! - RuleDescriptor: a rule with its capability parameters and impact scores
//! - RuleParameter: one named expression feeding a rule
//! - GlobalVariable: a shared macro or function usable from any rule
//! - FunctionParameter: a formal parameter of a global function

use serde::{Deserialize, Serialize};

// ============================================================================
// Rules
// ============================================================================

/// Rule definition as stored by the rule library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleDescriptor {
    /// Unique identifier (id-standard, see [`crate::to_id_standard`])
    pub id: String,

    /// Display name
    pub name: String,

    /// Twin model the rule applies to
    pub primary_model_id: String,

    /// Capability parameters, evaluated in order
    pub parameters: Vec<RuleParameter>,

    /// Impact score expressions
    pub impact_scores: Vec<RuleParameter>,
}

impl RuleDescriptor {
    pub fn new(id: impl Into<String>, primary_model_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            primary_model_id: primary_model_id.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, parameter: RuleParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_impact_score(mut self, score: RuleParameter) -> Self {
        self.impact_scores.push(score);
        self
    }
}

/// One named expression of a rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParameter {
    /// Variable name other parameters refer to
    pub name: String,

    /// Field id used by the result store
    pub field_id: String,

    /// Expression text
    pub point_expression: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

impl RuleParameter {
    pub fn new(
        name: impl Into<String>,
        field_id: impl Into<String>,
        point_expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_id: field_id.into(),
            point_expression: point_expression.into(),
            units: None,
        }
    }
}

// ============================================================================
// Globals
// ============================================================================

/// Kind of global variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalVariableType {
    /// Named expression expanded in place
    #[default]
    Macro,
    /// Expression taking parameters
    Function,
}

impl std::fmt::Display for GlobalVariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlobalVariableType::Macro => write!(f, "Macro"),
            GlobalVariableType::Function => write!(f, "Function"),
        }
    }
}

/// Shared macro or function definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalVariable {
    pub name: String,
    pub variable_type: GlobalVariableType,
    pub expression: String,
    pub parameters: Vec<FunctionParameter>,
}

impl GlobalVariable {
    pub fn new(name: impl Into<String>, variable_type: GlobalVariableType) -> Self {
        Self {
            name: name.into(),
            variable_type,
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(FunctionParameter::new(name));
        self
    }
}

/// Formal parameter of a global function
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionParameter {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}
