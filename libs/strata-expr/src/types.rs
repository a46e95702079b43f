//! Static value types of expression nodes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type of an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Bool,
    Text,
    Instant,
    Duration,
    /// Handle to a related entity in the building graph
    Entity,
}

impl ValueType {
    /// Numbers and booleans mix freely in arithmetic and equality
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Number | ValueType::Bool)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ValueType::Instant | ValueType::Duration)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
            ValueType::Instant => "instant",
            ValueType::Duration => "duration",
            ValueType::Entity => "entity",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
