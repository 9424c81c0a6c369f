//! Sandboxed tree-walking evaluator for compiled conditions.
//!
//! Evaluation is a single linear pass over the expression tree: total
//! (the tree is finite and the language has no loops or recursion),
//! deterministic (pure function of tree, context, and registry), and free
//! of I/O. The only capabilities reachable from a condition are the eight
//! node kinds and the registry functions.

use std::cmp::Ordering;

use rdetect_parser::{BoolOp, CmpOp, Expr, Value};

use crate::context::EventContext;
use crate::error::{EvalError, Result};
use crate::registry::{FunctionRegistry, registry};

/// Evaluate a compiled condition against an event context, coercing the
/// root result to a boolean by truthiness.
pub fn evaluate(expr: &Expr, ctx: &EventContext) -> Result<bool> {
    evaluate_with_registry(expr, ctx, registry())
}

/// Like [`evaluate`], with an explicit registry (useful in tests).
pub fn evaluate_with_registry(
    expr: &Expr,
    ctx: &EventContext,
    funcs: &FunctionRegistry,
) -> Result<bool> {
    Ok(eval_expr(expr, ctx, funcs)?.is_truthy())
}

/// Evaluate an expression to its runtime value.
///
/// The match is exhaustive over the closed node set: adding a node kind to
/// the tree will not compile until this function handles it.
pub fn eval_expr(expr: &Expr, ctx: &EventContext, funcs: &FunctionRegistry) -> Result<Value> {
    match expr {
        Expr::BoolOp { op, operands } => {
            // Every operand is evaluated before combining: `and`/`or` do
            // not short-circuit, so a failure in a later operand surfaces
            // even when an earlier operand already decided the outcome.
            // Callers relying on short-circuit safety must guard separately.
            let values = operands
                .iter()
                .map(|e| eval_expr(e, ctx, funcs))
                .collect::<Result<Vec<_>>>()?;
            let result = match op {
                BoolOp::And => values.iter().all(Value::is_truthy),
                BoolOp::Or => values.iter().any(Value::is_truthy),
            };
            Ok(Value::Bool(result))
        }

        Expr::Compare { op, left, right } => {
            let left = eval_expr(left, ctx, funcs)?;
            let right = eval_expr(right, ctx, funcs)?;
            compare(*op, &left, &right).map(Value::Bool)
        }

        Expr::Call { name, args } => {
            let func = funcs.get(name).ok_or_else(|| {
                EvalError::UnsupportedOperation(format!(
                    "function '{name}' is not in the registry"
                ))
            })?;
            let args = args
                .iter()
                .map(|e| eval_expr(e, ctx, funcs))
                .collect::<Result<Vec<_>>>()?;
            func(&args)
        }

        Expr::Var(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),

        Expr::Constant(value) => Ok(value.clone()),

        Expr::List(elements) => {
            let values = elements
                .iter()
                .map(|e| eval_expr(e, ctx, funcs))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::List(values))
        }

        Expr::Set(elements) => {
            let values = elements
                .iter()
                .map(|e| eval_expr(e, ctx, funcs))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::set_from(values))
        }

        Expr::Diff { left, right } => {
            let left = eval_expr(left, ctx, funcs)?;
            let right = eval_expr(right, ctx, funcs)?;
            let left = as_set(&left)?;
            let right = as_set(&right)?;
            Ok(Value::Set(
                left.into_iter().filter(|v| !right.contains(v)).collect(),
            ))
        }
    }
}

fn as_set(value: &Value) -> Result<Vec<Value>> {
    value.as_set_elements().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "operator '-' cannot convert a {} to a set",
            value.type_name()
        ))
    })
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool> {
    match op {
        // Equality is loose and never fails: differently-shaped values are
        // simply unequal.
        CmpOp::Eq => Ok(left == right),
        CmpOp::Ne => Ok(left != right),
        CmpOp::Gt | CmpOp::Ge | CmpOp::Lt | CmpOp::Le => {
            let ord = left.try_cmp(right).ok_or_else(|| {
                EvalError::TypeMismatch(format!(
                    "cannot order {} and {} with '{}'",
                    left.type_name(),
                    right.type_name(),
                    op.as_str()
                ))
            })?;
            Ok(match op {
                CmpOp::Gt => ord == Ordering::Greater,
                CmpOp::Ge => ord != Ordering::Less,
                CmpOp::Lt => ord == Ordering::Less,
                CmpOp::Le => ord != Ordering::Greater,
                CmpOp::Eq | CmpOp::Ne => unreachable!(),
            })
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
