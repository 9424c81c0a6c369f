//! Expression tree for detection rule conditions.
//!
//! The tree is a closed tagged union: every node reachable from a compiled
//! condition is one of the eight variants below, and the compiler refuses to
//! produce anything else. Consumers (the evaluator, the validator) match
//! exhaustively, so adding a variant forces every consumer to handle it —
//! that exhaustiveness is the whitelist's real enforcement mechanism.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

/// Function names callable from a condition.
///
/// This is the compile-time half of the whitelist; the evaluation-side
/// registry provides the implementations and is pinned to this list by a
/// test. Calling any other name fails compilation.
pub const FUNCTION_WHITELIST: &[&str] = &[
    "jaccard_distance",
    "in_set",
    "not_in_set",
    "len",
    "abs",
    "min",
    "max",
];

/// Boolean connective in a [`Expr::BoolOp`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
        }
    }
}

/// Comparison operator in a [`Expr::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

/// A compiled condition expression.
///
/// Produced by [`crate::compile`] from condition strings like
/// `unique_ips > 5 and in_set(region, ['EU', 'US'])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Logical AND/OR over two or more operands.
    BoolOp { op: BoolOp, operands: Vec<Expr> },
    /// Binary comparison.
    Compare {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Call to a whitelisted registry function.
    Call { name: String, args: Vec<Expr> },
    /// Reference to a variable in the event context.
    Var(String),
    /// Literal scalar.
    Constant(Value),
    /// List literal.
    List(Vec<Expr>),
    /// Set literal.
    Set(Vec<Expr>),
    /// Set difference — the only permitted binary arithmetic-like operator.
    Diff { left: Box<Expr>, right: Box<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::BoolOp { op, operands } => {
                let parts: Vec<String> = operands.iter().map(|e| format!("{e}")).collect();
                write!(f, "({})", parts.join(&format!(" {} ", op.as_str())))
            }
            Expr::Compare { op, left, right } => {
                write!(f, "{left} {} {right}", op.as_str())
            }
            Expr::Call { name, args } => {
                let parts: Vec<String> = args.iter().map(|e| format!("{e}")).collect();
                write!(f, "{name}({})", parts.join(", "))
            }
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::List(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| format!("{e}")).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Expr::Set(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| format!("{e}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Expr::Diff { left, right } => write!(f, "({left} - {right})"),
        }
    }
}
