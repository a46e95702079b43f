//! Evaluation Visitor Protocol
//!
//! Double dispatch over the closed node set: [`Expr::accept`] matches on
//! the node variant and calls the visitor method for it. Adding a variant
//! fails to compile until every visitor handles it.
//!
//! Visitors never mutate the tree; any state they need (an environment,
//! an output buffer, collected names) lives in the visitor itself.

use crate::node::{BinaryOp, Expr, NaryOp, NodeKind, Pattern, UnaryOp};
use crate::types::ValueType;
use crate::value::Value;

/// One method per node variant
///
/// Each method receives the node itself plus its destructured payload.
pub trait Visitor {
    type Output;

    fn visit_constant(&mut self, expr: &Expr, value: &Value) -> Self::Output;

    fn visit_variable(&mut self, expr: &Expr, name: &str, value_type: ValueType) -> Self::Output;

    fn visit_unary(&mut self, expr: &Expr, op: UnaryOp, child: &Expr) -> Self::Output;

    fn visit_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr)
        -> Self::Output;

    fn visit_nary(&mut self, expr: &Expr, op: NaryOp, children: &[Expr]) -> Self::Output;

    fn visit_relation(
        &mut self,
        expr: &Expr,
        name: &str,
        source: &Expr,
        result_type: ValueType,
    ) -> Self::Output;

    fn visit_match(&mut self, expr: &Expr, left: &Expr, pattern: &Pattern) -> Self::Output;
}

impl Expr {
    /// Dispatch to the visitor method for this node's variant
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self.kind() {
            NodeKind::Constant(value) => visitor.visit_constant(self, value),
            NodeKind::Variable { name, value_type } => {
                visitor.visit_variable(self, name, *value_type)
            },
            NodeKind::Unary { op, child } => visitor.visit_unary(self, *op, child),
            NodeKind::Binary { op, left, right } => visitor.visit_binary(self, *op, left, right),
            NodeKind::Nary { op, children } => visitor.visit_nary(self, *op, children),
            NodeKind::Relation {
                name,
                source,
                result_type,
            } => visitor.visit_relation(self, name, source, *result_type),
            NodeKind::Match { left, pattern } => visitor.visit_match(self, left, pattern),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    /// Counts nodes by walking every child
    struct NodeCounter;

    impl Visitor for NodeCounter {
        type Output = usize;

        fn visit_constant(&mut self, _: &Expr, _: &Value) -> usize {
            1
        }

        fn visit_variable(&mut self, _: &Expr, _: &str, _: ValueType) -> usize {
            1
        }

        fn visit_unary(&mut self, _: &Expr, _: UnaryOp, child: &Expr) -> usize {
            1 + child.accept(self)
        }

        fn visit_binary(&mut self, _: &Expr, _: BinaryOp, left: &Expr, right: &Expr) -> usize {
            1 + left.accept(self) + right.accept(self)
        }

        fn visit_nary(&mut self, _: &Expr, _: NaryOp, children: &[Expr]) -> usize {
            1 + children.iter().map(|c| c.accept(self)).sum::<usize>()
        }

        fn visit_relation(&mut self, _: &Expr, _: &str, source: &Expr, _: ValueType) -> usize {
            1 + source.accept(self)
        }

        fn visit_match(&mut self, _: &Expr, left: &Expr, _: &Pattern) -> usize {
            1 + left.accept(self)
        }
    }

    #[test]
    fn test_accept_reaches_every_variant() {
        let x = Expr::variable("x", ValueType::Number);
        let zone = Expr::relation(
            "locatedIn",
            Expr::variable("sensor", ValueType::Entity),
            ValueType::Entity,
        );
        let in_band = Expr::matches(x.clone(), Pattern::range(18.0, 24.0).unwrap()).unwrap();
        let tree = Expr::nary(
            NaryOp::Or,
            vec![
                in_band,
                Expr::not(Expr::greater(Expr::negate(x), Expr::number(3.0))),
                Expr::binary(BinaryOp::Is, zone, Expr::constant(Value::Entity("z1".into()))),
            ],
        );

        // or, match, x, not, >, negate, x, 3, is, relation, sensor, z1
        assert_eq!(tree.accept(&mut NodeCounter), 12);
    }
}
