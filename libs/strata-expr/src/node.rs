//! Expression Node Hierarchy
//!
//! A closed set of node variants forming an immutable expression tree.
//! Nodes are reference counted: a sub-tree may be shared by several
//! parents, and because children are always existing, fully built
//! expressions, a cycle cannot be constructed.
//!
//! Each node's result type is inferred once, at construction, from its
//! children's types. The structural hash is computed at the same time and
//! ignores child order for commutative nodes, matching equality.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use rustc_hash::FxHasher;

use crate::error::{ExprError, Result};
use crate::types::ValueType;
use crate::value::Value;

// ============================================================================
// Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Negate => "-",
        }
    }
}

/// Operators with fixed left / right roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Subtract,
    Divide,
    Power,
    Equals,
    NotEquals,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    /// Strict equality: same value type and same value
    Is,
}

impl BinaryOp {
    /// Produces a boolean from two operands
    pub fn is_comparison(self) -> bool {
        !matches!(self, BinaryOp::Subtract | BinaryOp::Divide | BinaryOp::Power)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Subtract => "-",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Is => "is",
        }
    }
}

/// Operators over an ordered list of operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaryOp {
    Add,
    Multiply,
    And,
    Or,
}

impl NaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            NaryOp::Add => "+",
            NaryOp::Multiply => "*",
            NaryOp::And => "&",
            NaryOp::Or => "|",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, NaryOp::And | NaryOp::Or)
    }
}

// ============================================================================
// Match patterns
// ============================================================================

/// Right-hand side of a match node
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Inclusive numeric range
    Range { low: f64, high: f64 },
    /// Any of a set of literals
    Set(Vec<Value>),
    /// Regular expression over text
    Regex(Regex),
}

impl Pattern {
    pub fn range(low: f64, high: f64) -> Result<Self> {
        if low.is_nan() || high.is_nan() || low > high {
            return Err(ExprError::invalid_pattern(
                format!("[{}, {}]", low, high),
                "range bounds must be ordered numbers",
            ));
        }
        Ok(Pattern::Range { low, high })
    }

    pub fn set<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Pattern::Set(values.into_iter().map(Into::into).collect())
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Pattern::Regex)
            .map_err(|e| ExprError::invalid_pattern(pattern, e.to_string()))
    }

    fn same_as(&self, other: &Pattern) -> bool {
        match (self, other) {
            (Pattern::Range { low: a, high: b }, Pattern::Range { low: c, high: d }) => {
                a.to_bits() == c.to_bits() && b.to_bits() == d.to_bits()
            },
            (Pattern::Set(a), Pattern::Set(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            },
            (Pattern::Regex(a), Pattern::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }

    fn hash_into(&self, h: &mut FxHasher) {
        match self {
            Pattern::Range { low, high } => {
                h.write_u8(0);
                h.write_u64(low.to_bits());
                h.write_u64(high.to_bits());
            },
            Pattern::Set(values) => {
                h.write_u8(1);
                for v in values {
                    hash_value(v, h);
                }
            },
            Pattern::Regex(re) => {
                h.write_u8(2);
                re.as_str().hash(h);
            },
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Variant payload of a node
#[derive(Debug)]
pub enum NodeKind {
    Constant(Value),
    Variable {
        name: String,
        value_type: ValueType,
    },
    Unary {
        op: UnaryOp,
        child: Expr,
    },
    Binary {
        op: BinaryOp,
        left: Expr,
        right: Expr,
    },
    Nary {
        op: NaryOp,
        children: Vec<Expr>,
    },
    /// Navigation from `source` to a related entity, resolved lazily
    Relation {
        name: String,
        source: Expr,
        result_type: ValueType,
    },
    Match {
        left: Expr,
        pattern: Pattern,
    },
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    value_type: ValueType,
    hash: u64,
}

/// Shared handle to an immutable expression node
#[derive(Debug, Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
    fn new(kind: NodeKind) -> Self {
        let value_type = infer_type(&kind);
        let hash = structural_hash(&kind, value_type);
        Expr(Arc::new(Node {
            kind,
            value_type,
            hash,
        }))
    }

    // ── Leaves ──────────────────────────────────────────────────────────

    pub fn constant(value: impl Into<Value>) -> Self {
        Self::new(NodeKind::Constant(value.into()))
    }

    pub fn number(n: f64) -> Self {
        Self::constant(Value::Number(n))
    }

    pub fn boolean(b: bool) -> Self {
        Self::constant(Value::Bool(b))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::constant(Value::Text(s.into()))
    }

    pub fn instant(t: DateTime<Utc>) -> Self {
        Self::constant(Value::Instant(t))
    }

    pub fn duration(d: Duration) -> Self {
        Self::constant(Value::Duration(d))
    }

    pub fn variable(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(NodeKind::Variable {
            name: name.into(),
            value_type,
        })
    }

    // ── Composites ──────────────────────────────────────────────────────

    pub fn unary(op: UnaryOp, child: Expr) -> Self {
        Self::new(NodeKind::Unary { op, child })
    }

    pub fn not(child: Expr) -> Self {
        Self::unary(UnaryOp::Not, child)
    }

    pub fn negate(child: Expr) -> Self {
        Self::unary(UnaryOp::Negate, child)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(NodeKind::Binary { op, left, right })
    }

    pub fn subtract(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Subtract, left, right)
    }

    pub fn divide(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Divide, left, right)
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Equals, left, right)
    }

    pub fn greater(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Greater, left, right)
    }

    pub fn less(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Less, left, right)
    }

    pub fn nary(op: NaryOp, children: Vec<Expr>) -> Self {
        Self::new(NodeKind::Nary { op, children })
    }

    pub fn add(left: Expr, right: Expr) -> Self {
        Self::nary(NaryOp::Add, vec![left, right])
    }

    pub fn multiply(left: Expr, right: Expr) -> Self {
        Self::nary(NaryOp::Multiply, vec![left, right])
    }

    /// Graph navigation whose result type is declared by the caller
    pub fn relation(name: impl Into<String>, source: Expr, result_type: ValueType) -> Self {
        Self::new(NodeKind::Relation {
            name: name.into(),
            source,
            result_type,
        })
    }

    /// Match a simple operand against a range, set or regular expression
    ///
    /// # Errors
    /// [`ExprError::InvalidMatchOperand`] when `left` is boolean typed or is
    /// itself a comparison, logical or match node.
    pub fn matches(left: Expr, pattern: Pattern) -> Result<Self> {
        if left.value_type() == ValueType::Bool || left.is_predicate() {
            return Err(ExprError::invalid_match_operand(left.to_string()));
        }
        Ok(Self::new(NodeKind::Match { left, pattern }))
    }

    // ── Logical combinators ─────────────────────────────────────────────

    /// Conjunction with `true` / `false` constants folded away
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::logical(NaryOp::And, left, right)
    }

    /// Disjunction with `true` / `false` constants folded away
    pub fn or(left: Expr, right: Expr) -> Self {
        Self::logical(NaryOp::Or, left, right)
    }

    /// Conjunction of every expression; `true` when empty
    pub fn all(children: impl IntoIterator<Item = Expr>) -> Self {
        children
            .into_iter()
            .fold(Self::boolean(true), Self::and)
    }

    fn logical(op: NaryOp, left: Expr, right: Expr) -> Self {
        // And: true is the identity, false absorbs. Or: the reverse.
        let identity = op == NaryOp::And;

        match (left.as_bool_constant(), right.as_bool_constant()) {
            (Some(b), _) | (_, Some(b)) if b != identity => return Self::boolean(b),
            (Some(_), _) => return right,
            (_, Some(_)) => return left,
            _ => {},
        }

        let mut children = Vec::new();
        for side in [left, right] {
            let nested = match side.kind() {
                NodeKind::Nary {
                    op: inner,
                    children: nested,
                } if *inner == op => Some(nested.clone()),
                _ => None,
            };
            match nested {
                Some(nested) => children.extend(nested),
                None => children.push(side),
            }
        }
        Self::nary(op, children)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Inferred result type
    pub fn value_type(&self) -> ValueType {
        self.0.value_type
    }

    /// Structural hash, consistent with `==`
    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }

    /// Same allocation, not merely structurally equal
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self.kind() {
            NodeKind::Constant(v) => Some(v),
            _ => None,
        }
    }

    fn as_bool_constant(&self) -> Option<bool> {
        match self.as_constant() {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Child order does not affect the result
    ///
    /// Add over text is concatenation and therefore order sensitive.
    pub fn is_commutative(&self) -> bool {
        match self.kind() {
            NodeKind::Nary { op, .. } => is_commutative(*op, self.value_type()),
            _ => false,
        }
    }

    /// Comparison, logical or match node
    pub fn is_predicate(&self) -> bool {
        match self.kind() {
            NodeKind::Unary { op, .. } => *op == UnaryOp::Not,
            NodeKind::Binary { op, .. } => op.is_comparison(),
            NodeKind::Nary { op, .. } => op.is_logical(),
            NodeKind::Match { .. } => true,
            _ => false,
        }
    }

    /// Binding strength used when formatting; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self.kind() {
            NodeKind::Constant(_) | NodeKind::Variable { .. } => 10,
            NodeKind::Relation { .. } => 9,
            NodeKind::Unary { op: UnaryOp::Negate, .. } => 8,
            NodeKind::Unary { op: UnaryOp::Not, .. } => 3,
            NodeKind::Binary { op, .. } => match op {
                BinaryOp::Power => 7,
                BinaryOp::Divide => 6,
                BinaryOp::Subtract => 5,
                _ => 4,
            },
            NodeKind::Nary { op, .. } => match op {
                NaryOp::Multiply => 6,
                NaryOp::Add => 5,
                NaryOp::And => 2,
                NaryOp::Or => 1,
            },
            NodeKind::Match { .. } => 4,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.0.hash == other.0.hash
            && self.0.value_type == other.0.value_type
            && kinds_equal(self, other)
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

// ============================================================================
// Type inference
// ============================================================================

fn infer_type(kind: &NodeKind) -> ValueType {
    match kind {
        NodeKind::Constant(v) => v.value_type(),
        NodeKind::Variable { value_type, .. } => *value_type,
        NodeKind::Unary { op, child } => match op {
            UnaryOp::Not => ValueType::Bool,
            UnaryOp::Negate => child.value_type(),
        },
        NodeKind::Binary { op, left, right } => match op {
            BinaryOp::Subtract => subtract_type(left.value_type(), right.value_type()),
            BinaryOp::Divide | BinaryOp::Power => ValueType::Number,
            _ => ValueType::Bool,
        },
        NodeKind::Nary { op, children } => match op {
            NaryOp::Add => add_type(children.iter().map(Expr::value_type)),
            NaryOp::Multiply => ValueType::Number,
            NaryOp::And | NaryOp::Or => ValueType::Bool,
        },
        NodeKind::Relation { result_type, .. } => *result_type,
        NodeKind::Match { .. } => ValueType::Bool,
    }
}

/// Text if any operand is text; instant for one instant plus durations;
/// duration when every operand is a duration; number otherwise
pub fn add_type(operands: impl IntoIterator<Item = ValueType>) -> ValueType {
    let (mut total, mut instants, mut durations) = (0usize, 0usize, 0usize);

    for t in operands {
        total += 1;
        match t {
            ValueType::Text => return ValueType::Text,
            ValueType::Instant => instants += 1,
            ValueType::Duration => durations += 1,
            _ => {},
        }
    }

    if total > 0 && durations == total {
        ValueType::Duration
    } else if instants == 1 && instants + durations == total {
        ValueType::Instant
    } else {
        ValueType::Number
    }
}

/// Temporal differences keep their temporal type; never text
pub fn subtract_type(left: ValueType, right: ValueType) -> ValueType {
    match (left, right) {
        (ValueType::Instant, ValueType::Instant) => ValueType::Duration,
        (ValueType::Instant, ValueType::Duration) => ValueType::Instant,
        (ValueType::Duration, ValueType::Duration) => ValueType::Duration,
        _ => ValueType::Number,
    }
}

fn is_commutative(op: NaryOp, value_type: ValueType) -> bool {
    !(op == NaryOp::Add && value_type == ValueType::Text)
}

// ============================================================================
// Structural equality and hashing
// ============================================================================

fn kinds_equal(a: &Expr, b: &Expr) -> bool {
    match (a.kind(), b.kind()) {
        (NodeKind::Constant(x), NodeKind::Constant(y)) => x.same_as(y),
        (
            NodeKind::Variable {
                name: n1,
                value_type: t1,
            },
            NodeKind::Variable {
                name: n2,
                value_type: t2,
            },
        ) => n1 == n2 && t1 == t2,
        (NodeKind::Unary { op: o1, child: c1 }, NodeKind::Unary { op: o2, child: c2 }) => {
            o1 == o2 && c1 == c2
        },
        (
            NodeKind::Binary {
                op: o1,
                left: l1,
                right: r1,
            },
            NodeKind::Binary {
                op: o2,
                left: l2,
                right: r2,
            },
        ) => o1 == o2 && l1 == l2 && r1 == r2,
        (
            NodeKind::Nary {
                op: o1,
                children: c1,
            },
            NodeKind::Nary {
                op: o2,
                children: c2,
            },
        ) => {
            if o1 != o2 || c1.len() != c2.len() {
                return false;
            }
            if a.is_commutative() {
                same_multiset(c1, c2)
            } else {
                c1 == c2
            }
        },
        (
            NodeKind::Relation {
                name: n1,
                source: s1,
                result_type: t1,
            },
            NodeKind::Relation {
                name: n2,
                source: s2,
                result_type: t2,
            },
        ) => n1 == n2 && t1 == t2 && s1 == s2,
        (
            NodeKind::Match {
                left: l1,
                pattern: p1,
            },
            NodeKind::Match {
                left: l2,
                pattern: p2,
            },
        ) => l1 == l2 && p1.same_as(p2),
        _ => false,
    }
}

/// Every child of `a` pairs with a distinct equal child of `b`
fn same_multiset(a: &[Expr], b: &[Expr]) -> bool {
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let found = b
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && x == y);
        match found {
            Some(i) => {
                used[i] = true;
                true
            },
            None => false,
        }
    })
}

fn hash_value(value: &Value, h: &mut FxHasher) {
    match value {
        Value::Number(n) => {
            h.write_u8(0);
            h.write_u64(n.to_bits());
        },
        Value::Bool(b) => {
            h.write_u8(1);
            h.write_u8(u8::from(*b));
        },
        Value::Text(s) => {
            h.write_u8(2);
            s.hash(h);
        },
        Value::Instant(t) => {
            h.write_u8(3);
            t.hash(h);
        },
        Value::Duration(d) => {
            h.write_u8(4);
            d.hash(h);
        },
        Value::Entity(id) => {
            h.write_u8(5);
            id.hash(h);
        },
    }
}

fn structural_hash(kind: &NodeKind, value_type: ValueType) -> u64 {
    let mut h = FxHasher::default();

    match kind {
        NodeKind::Constant(v) => {
            h.write_u8(0);
            hash_value(v, &mut h);
        },
        NodeKind::Variable { name, value_type } => {
            h.write_u8(1);
            name.hash(&mut h);
            value_type.hash(&mut h);
        },
        NodeKind::Unary { op, child } => {
            h.write_u8(2);
            op.hash(&mut h);
            h.write_u64(child.structural_hash());
        },
        NodeKind::Binary { op, left, right } => {
            h.write_u8(3);
            op.hash(&mut h);
            h.write_u64(left.structural_hash());
            h.write_u64(right.structural_hash());
        },
        NodeKind::Nary { op, children } => {
            h.write_u8(4);
            op.hash(&mut h);
            let mut hashes: Vec<u64> = children.iter().map(Expr::structural_hash).collect();
            if is_commutative(*op, value_type) {
                hashes.sort_unstable();
            }
            for child in hashes {
                h.write_u64(child);
            }
        },
        NodeKind::Relation {
            name,
            source,
            result_type,
        } => {
            h.write_u8(5);
            name.hash(&mut h);
            h.write_u64(source.structural_hash());
            result_type.hash(&mut h);
        },
        NodeKind::Match { left, pattern } => {
            h.write_u8(6);
            h.write_u64(left.structural_hash());
            pattern.hash_into(&mut h);
        },
    }

    h.finish()
}
