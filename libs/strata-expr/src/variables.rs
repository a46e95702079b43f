//! Variable discovery

use rustc_hash::FxHashSet;

use crate::evaluator::Env;
use crate::node::{BinaryOp, Expr, NaryOp, Pattern, UnaryOp};
use crate::types::ValueType;
use crate::value::Value;
use crate::visitor::Visitor;

/// Collects distinct variable references in first-seen order
#[derive(Debug, Default)]
pub struct VariableCollector {
    seen: FxHashSet<String>,
    found: Vec<(String, ValueType)>,
}

impl VariableCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names and declared types, in first-seen order
    pub fn into_variables(self) -> Vec<(String, ValueType)> {
        self.found
    }
}

impl Visitor for VariableCollector {
    type Output = ();

    fn visit_constant(&mut self, _expr: &Expr, _value: &Value) {}

    fn visit_variable(&mut self, _expr: &Expr, name: &str, value_type: ValueType) {
        if self.seen.insert(name.to_string()) {
            self.found.push((name.to_string(), value_type));
        }
    }

    fn visit_unary(&mut self, _expr: &Expr, _op: UnaryOp, child: &Expr) {
        child.accept(self);
    }

    fn visit_binary(&mut self, _expr: &Expr, _op: BinaryOp, left: &Expr, right: &Expr) {
        left.accept(self);
        right.accept(self);
    }

    fn visit_nary(&mut self, _expr: &Expr, _op: NaryOp, children: &[Expr]) {
        for child in children {
            child.accept(self);
        }
    }

    fn visit_relation(&mut self, _expr: &Expr, _name: &str, source: &Expr, _rt: ValueType) {
        source.accept(self);
    }

    fn visit_match(&mut self, _expr: &Expr, left: &Expr, _pattern: &Pattern) {
        left.accept(self);
    }
}

impl Expr {
    /// Every variable referenced by the tree, with its declared type
    pub fn variables(&self) -> Vec<(String, ValueType)> {
        let mut collector = VariableCollector::new();
        self.accept(&mut collector);
        collector.into_variables()
    }

    /// Variables referenced by the tree but missing from `env`
    pub fn unbound_variables(&self, env: &Env) -> Vec<String> {
        self.variables()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| !env.contains(name))
            .collect()
    }
}
