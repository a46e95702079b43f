//! Text rendering of expression trees
//!
//! Parentheses are emitted only where precedence requires them, so the
//! output re-parses to the same tree.

use std::fmt;

use crate::node::{BinaryOp, Expr, NaryOp, NodeKind, Pattern, UnaryOp};
use crate::types::ValueType;
use crate::value::Value;
use crate::visitor::Visitor;

/// Formatting visitor
pub struct ExprFormatter;

impl ExprFormatter {
    /// Render `child`, parenthesised when it binds looser than `parent`
    /// (or equally loose, when `strict`)
    fn operand(&mut self, child: &Expr, parent: u8, strict: bool) -> String {
        let text = child.accept(self);
        let prec = child.precedence();
        if prec < parent || (strict && prec == parent) {
            format!("({})", text)
        } else {
            text
        }
    }
}

impl Visitor for ExprFormatter {
    type Output = String;

    fn visit_constant(&mut self, _expr: &Expr, value: &Value) -> String {
        literal(value)
    }

    fn visit_variable(&mut self, _expr: &Expr, name: &str, _value_type: ValueType) -> String {
        name.to_string()
    }

    fn visit_unary(&mut self, expr: &Expr, op: UnaryOp, child: &Expr) -> String {
        let strict = op == UnaryOp::Negate;
        format!("{}{}", op.symbol(), self.operand(child, expr.precedence(), strict))
    }

    fn visit_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> String {
        let prec = expr.precedence();
        // Power is right-associative, comparisons do not chain
        let (left_strict, right_strict) = match op {
            BinaryOp::Power => (true, false),
            BinaryOp::Subtract | BinaryOp::Divide => (false, true),
            _ => (true, true),
        };
        let mut lhs = self.operand(left, prec, left_strict);
        // `-2 ^ 2` reads as -(2 ^ 2)
        if op == BinaryOp::Power && leads_with_minus(left) {
            lhs = format!("({})", lhs);
        }
        format!("{} {} {}", lhs, op.symbol(), self.operand(right, prec, right_strict))
    }

    fn visit_nary(&mut self, expr: &Expr, op: NaryOp, children: &[Expr]) -> String {
        let prec = expr.precedence();
        let parts: Vec<String> = children
            .iter()
            .enumerate()
            .map(|(i, child)| self.operand(child, prec, i > 0))
            .collect();
        parts.join(&format!(" {} ", op.symbol()))
    }

    fn visit_relation(
        &mut self,
        expr: &Expr,
        name: &str,
        source: &Expr,
        _result_type: ValueType,
    ) -> String {
        format!("{}.{}", self.operand(source, expr.precedence(), false), name)
    }

    fn visit_match(&mut self, expr: &Expr, left: &Expr, pattern: &Pattern) -> String {
        format!(
            "{} matches {}",
            self.operand(left, expr.precedence(), true),
            pattern
        )
    }
}

fn leads_with_minus(expr: &Expr) -> bool {
    match expr.kind() {
        NodeKind::Constant(Value::Number(n)) => n.is_sign_negative() && !n.is_nan(),
        NodeKind::Unary {
            op: UnaryOp::Negate,
            ..
        } => true,
        _ => false,
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Text(s) => format!("{:?}", s),
        Value::Instant(t) => format!("instant({:?})", t.to_rfc3339()),
        Value::Duration(d) => format!("duration({:?})", d.to_string()),
        Value::Entity(id) => format!("entity({:?})", id),
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Range { low, high } => write!(f, "[{}, {}]", low, high),
            Pattern::Set(values) => {
                let items: Vec<String> = values.iter().map(literal).collect();
                write!(f, "{{{}}}", items.join(", "))
            },
            Pattern::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.accept(&mut ExprFormatter))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn v(name: &str) -> Expr {
        Expr::variable(name, ValueType::Number)
    }

    #[test]
    fn test_minimal_parentheses() {
        let sum = Expr::add(v("a"), v("b"));
        assert_eq!(Expr::multiply(sum.clone(), v("c")).to_string(), "(a + b) * c");
        assert_eq!(Expr::add(Expr::multiply(v("a"), v("b")), v("c")).to_string(), "a * b + c");
        assert_eq!(Expr::subtract(v("a"), sum.clone()).to_string(), "a - (a + b)");
        assert_eq!(
            Expr::subtract(Expr::subtract(v("a"), v("b")), v("c")).to_string(),
            "a - b - c"
        );
        assert_eq!(
            Expr::subtract(v("a"), Expr::subtract(v("b"), v("c"))).to_string(),
            "a - (b - c)"
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let pow = |l, r| Expr::binary(BinaryOp::Power, l, r);
        assert_eq!(pow(v("a"), pow(v("b"), v("c"))).to_string(), "a ^ b ^ c");
        assert_eq!(pow(pow(v("a"), v("b")), v("c")).to_string(), "(a ^ b) ^ c");
    }

    #[test]
    fn test_negative_power_base_parenthesised() {
        let pow = |l, r| Expr::binary(BinaryOp::Power, l, r);
        let squared = pow(Expr::number(-2.0), Expr::number(2.0));
        assert_eq!(squared.to_string(), "(-2) ^ 2");
        assert_eq!(
            squared.evaluate(&crate::evaluator::Env::new()).unwrap(),
            Value::Number(4.0)
        );

        assert_eq!(pow(Expr::negate(v("a")), Expr::number(2.0)).to_string(), "(-a) ^ 2");
        assert_eq!(pow(v("a"), Expr::number(-2.0)).to_string(), "a ^ -2");
        assert_eq!(pow(Expr::number(2.0), v("a")).to_string(), "2 ^ a");
    }

    #[test]
    fn test_logical_and_unary() {
        let p = Expr::variable("p", ValueType::Bool);
        let q = Expr::variable("q", ValueType::Bool);
        let r = Expr::variable("r", ValueType::Bool);

        let e = Expr::nary(NaryOp::Or, vec![Expr::and(p.clone(), q.clone()), r.clone()]);
        assert_eq!(e.to_string(), "p & q | r");

        let e = Expr::and(Expr::or(p.clone(), q), r);
        assert_eq!(e.to_string(), "(p | q) & r");

        assert_eq!(Expr::not(Expr::greater(v("a"), v("b"))).to_string(), "!a > b");
        assert_eq!(Expr::not(Expr::and(p.clone(), p)).to_string(), "!(p & p)");
        assert_eq!(Expr::negate(Expr::negate(v("a"))).to_string(), "-(-a)");
        assert_eq!(Expr::negate(Expr::add(v("a"), v("b"))).to_string(), "-(a + b)");
    }

    #[test]
    fn test_literals_and_patterns() {
        assert_eq!(Expr::text("on \"auto\"").to_string(), r#""on \"auto\"""#);
        assert_eq!(Expr::number(2.5).to_string(), "2.5");

        let set = Expr::matches(v("mode"), Pattern::set([1.0, 2.0])).unwrap();
        assert_eq!(set.to_string(), "mode matches {1, 2}");

        let range = Expr::matches(v("t"), Pattern::range(18.0, 24.5).unwrap()).unwrap();
        assert_eq!(range.to_string(), "t matches [18, 24.5]");

        let re = Expr::matches(
            Expr::variable("id", ValueType::Text),
            Pattern::regex("^AHU").unwrap(),
        )
        .unwrap();
        assert_eq!(re.to_string(), "id matches /^AHU/");
    }

    #[test]
    fn test_relation() {
        let vav = Expr::variable("vav", ValueType::Entity);
        let ahu = Expr::relation("isFedBy", vav, ValueType::Entity);
        assert_eq!(ahu.to_string(), "vav.isFedBy");
        let temp = Expr::relation("supplyTemp", ahu, ValueType::Number);
        assert_eq!(
            Expr::greater(temp, Expr::number(13.0)).to_string(),
            "vav.isFedBy.supplyTemp > 13"
        );
    }
}
