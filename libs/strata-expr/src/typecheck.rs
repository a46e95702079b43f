//! Static operand checks
//!
//! Type inference never fails, but it happily types `p & 3` as bool. This
//! visitor walks the tree and reports every operator whose operands
//! cannot produce a meaningful result.

use std::fmt;

use serde::Serialize;

use crate::node::{subtract_type, BinaryOp, Expr, NaryOp, Pattern, UnaryOp};
use crate::types::ValueType;
use crate::value::Value;
use crate::visitor::Visitor;

/// One incompatible operator / operand combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeIssue {
    /// Offending sub-expression
    pub expression: String,
    pub message: String,
}

impl fmt::Display for TypeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.expression, self.message)
    }
}

/// Type-checking visitor
#[derive(Debug, Default)]
pub struct TypeCheck {
    issues: Vec<TypeIssue>,
}

impl TypeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_issues(self) -> Vec<TypeIssue> {
        self.issues
    }

    fn report(&mut self, expr: &Expr, message: String) {
        self.issues.push(TypeIssue {
            expression: expr.to_string(),
            message,
        });
    }

    fn require(&mut self, expr: &Expr, operand: &Expr, what: &str, ok: impl Fn(ValueType) -> bool) {
        let found = operand.value_type();
        if !ok(found) {
            self.report(
                expr,
                format!("'{}' expects {}, found {}", operand, what, found),
            );
        }
    }
}

fn comparable(a: ValueType, b: ValueType) -> bool {
    (a.is_numeric() && b.is_numeric())
        || (a == b && matches!(a, ValueType::Text | ValueType::Instant | ValueType::Duration))
}

impl Visitor for TypeCheck {
    type Output = ();

    fn visit_constant(&mut self, _expr: &Expr, _value: &Value) {}

    fn visit_variable(&mut self, _expr: &Expr, _name: &str, _value_type: ValueType) {}

    fn visit_unary(&mut self, expr: &Expr, op: UnaryOp, child: &Expr) {
        child.accept(self);
        match op {
            UnaryOp::Not => self.require(expr, child, "bool", |t| t == ValueType::Bool),
            UnaryOp::Negate => self.require(expr, child, "number or duration", |t| {
                t.is_numeric() || t == ValueType::Duration
            }),
        }
    }

    fn visit_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) {
        left.accept(self);
        right.accept(self);

        let (l, r) = (left.value_type(), right.value_type());
        match op {
            BinaryOp::Subtract => {
                let temporal = subtract_type(l, r) != ValueType::Number;
                if !temporal && !(l.is_numeric() && r.is_numeric()) {
                    self.report(expr, format!("cannot subtract {} from {}", r, l));
                }
            },
            BinaryOp::Divide | BinaryOp::Power => {
                self.require(expr, left, "number", ValueType::is_numeric);
                self.require(expr, right, "number", ValueType::is_numeric);
            },
            BinaryOp::Equals | BinaryOp::NotEquals => {
                if !(l == r || (l.is_numeric() && r.is_numeric())) {
                    self.report(expr, format!("{} and {} are never equal", l, r));
                }
            },
            BinaryOp::Is => {},
            BinaryOp::Greater
            | BinaryOp::GreaterOrEqual
            | BinaryOp::Less
            | BinaryOp::LessOrEqual => {
                if !comparable(l, r) {
                    self.report(expr, format!("cannot order {} against {}", l, r));
                }
            },
        }
    }

    fn visit_nary(&mut self, expr: &Expr, op: NaryOp, children: &[Expr]) {
        for child in children {
            child.accept(self);
        }

        match op {
            NaryOp::And | NaryOp::Or => {
                for child in children {
                    self.require(expr, child, "bool", |t| t == ValueType::Bool);
                }
            },
            NaryOp::Multiply => {
                for child in children {
                    self.require(expr, child, "number", ValueType::is_numeric);
                }
            },
            // Text absorbs anything; temporal sums were typed by inference
            NaryOp::Add => {
                if expr.value_type() == ValueType::Number {
                    for child in children {
                        self.require(expr, child, "number", ValueType::is_numeric);
                    }
                }
            },
        }
    }

    fn visit_relation(&mut self, expr: &Expr, _name: &str, source: &Expr, _rt: ValueType) {
        source.accept(self);
        self.require(expr, source, "entity", |t| t == ValueType::Entity);
    }

    fn visit_match(&mut self, expr: &Expr, left: &Expr, pattern: &Pattern) {
        left.accept(self);
        match pattern {
            Pattern::Range { .. } => self.require(expr, left, "number", ValueType::is_numeric),
            Pattern::Regex(_) => self.require(expr, left, "text", |t| {
                matches!(t, ValueType::Text | ValueType::Entity)
            }),
            Pattern::Set(_) => {},
        }
    }
}

impl Expr {
    /// Report every operator applied to incompatible operands
    pub fn type_check(&self) -> Result<(), Vec<TypeIssue>> {
        let mut check = TypeCheck::new();
        self.accept(&mut check);
        let issues = check.into_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}
