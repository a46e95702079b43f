//! strata-expr - Typed expression trees for building-analytics rules
//!
//! Rules are stored as immutable, reference-counted expression trees. Every
//! node knows its result type from the moment it is built, and all
//! processing (evaluation, formatting, variable discovery, type checking)
//! is done by visitors that walk the tree without touching it.
//!
//! # Example
//!
//! ```rust
//! use strata_expr::{Env, Expr, Value, ValueType};
//!
//! // zone_temp > setpoint + 2
//! let rule = Expr::greater(
//!     Expr::variable("zone_temp", ValueType::Number),
//!     Expr::add(Expr::variable("setpoint", ValueType::Number), Expr::number(2.0)),
//! );
//! assert_eq!(rule.value_type(), ValueType::Bool);
//! assert_eq!(rule.to_string(), "zone_temp > setpoint + 2");
//!
//! let env = Env::new().with("zone_temp", 25.5).with("setpoint", 22.0);
//! assert_eq!(rule.evaluate(&env).unwrap(), Value::Bool(true));
//! ```
//!
//! # Node kinds
//!
//! | Kind | Operators | Result type |
//! |------|-----------|-------------|
//! | Constant / Variable | - | declared |
//! | Unary | `!`, unary `-` | bool / operand |
//! | Binary | `-`, `/`, `^`, `==`, `!=`, `>`, `>=`, `<`, `<=`, `is` | numeric, temporal or bool |
//! | N-ary | `+`, `*`, `&`, `\|` | see [`add_type`] |
//! | Relation | `source.name` | declared |
//! | Match | `x matches pattern` | bool |

pub mod error;
pub mod evaluator;
pub mod format;
pub mod node;
pub mod parser;
pub mod relation;
pub mod typecheck;
pub mod types;
pub mod value;
pub mod variables;
pub mod visitor;

// Re-exports for convenience
pub use error::{EvalError, ExprError, ParseError, Result};
pub use evaluator::{Env, EvalResult, Evaluator};
pub use format::ExprFormatter;
pub use node::{add_type, subtract_type, BinaryOp, Expr, NaryOp, NodeKind, Pattern, UnaryOp};
pub use parser::ExpressionParser;
pub use relation::{MemoryRelations, NoRelations, RelationResolver};
pub use typecheck::{TypeCheck, TypeIssue};
pub use types::ValueType;
pub use value::Value;
pub use variables::VariableCollector;
pub use visitor::Visitor;
