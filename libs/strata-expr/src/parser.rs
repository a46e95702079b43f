//! Textual parser contract
//!
//! The grammar lives outside this crate. Callers that accept raw rule
//! text plug an implementation in through [`ExpressionParser`]; the rules
//! validator only needs the resulting tree or the [`ParseError`].

use crate::error::ParseError;
use crate::node::Expr;

/// Turns expression text into a typed tree
pub trait ExpressionParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Expr, ParseError>;
}

impl<F> ExpressionParser for F
where
    F: Fn(&str) -> Result<Expr, ParseError> + Send + Sync,
{
    fn parse(&self, text: &str) -> Result<Expr, ParseError> {
        self(text)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn identifiers_only(text: &str) -> Result<Expr, ParseError> {
        let name = text.trim();
        match name.chars().position(|c| !c.is_ascii_alphanumeric() && c != '_') {
            Some(pos) => Err(ParseError::at("unexpected character", pos)),
            None if name.is_empty() => Err(ParseError::new("empty expression")),
            None => Ok(Expr::variable(name, ValueType::Number)),
        }
    }

    #[test]
    fn test_closure_is_a_parser() {
        let parser: &dyn ExpressionParser = &identifiers_only;
        assert_eq!(
            parser.parse(" zone_temp ").unwrap(),
            Expr::variable("zone_temp", ValueType::Number)
        );

        let err = parser.parse("a+").unwrap_err();
        assert_eq!(err.position, Some(1));
        assert_eq!(err.to_string(), "unexpected character at position 1");
    }
}
