//! The whitelisted function registry.
//!
//! A fixed, named table mapping function names to pure implementations: no
//! I/O, no hidden state, and no failure modes beyond argument-count and
//! type mismatches. The table is built once and shared by reference across
//! every evaluator — it is never mutated after construction, so no
//! synchronization is needed.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use rdetect_parser::{FUNCTION_WHITELIST, Value};

use crate::error::{EvalError, Result};

/// Signature of a registry function.
pub type BuiltinFn = fn(&[Value]) -> Result<Value>;

/// The closed set of callable operations usable inside conditions.
pub struct FunctionRegistry {
    funcs: HashMap<&'static str, BuiltinFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        let mut funcs: HashMap<&'static str, BuiltinFn> = HashMap::new();
        funcs.insert("jaccard_distance", jaccard_distance);
        funcs.insert("in_set", in_set);
        funcs.insert("not_in_set", not_in_set);
        funcs.insert("len", len);
        funcs.insert("abs", abs);
        funcs.insert("min", min);
        funcs.insert("max", max);
        FunctionRegistry { funcs }
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.funcs.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Registered names, sorted for stable output.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.funcs.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide registry, built on first use and shared by reference.
pub fn registry() -> &'static FunctionRegistry {
    static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FunctionRegistry::new)
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(EvalError::TypeMismatch(format!(
            "{name}() expects {expected} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn coerce_set(name: &str, value: &Value) -> Result<Vec<Value>> {
    value.as_set_elements().ok_or_else(|| {
        EvalError::TypeMismatch(format!(
            "{name}() cannot convert a {} to a set",
            value.type_name()
        ))
    })
}

/// `1 - |a ∩ b| / |a ∪ b|`, with the denominator clamped to 1 when the
/// union is empty. That makes the distance of two empty sets 1.0 (maximal)
/// rather than NaN.
fn jaccard_distance(args: &[Value]) -> Result<Value> {
    expect_arity("jaccard_distance", args, 2)?;
    let a = coerce_set("jaccard_distance", &args[0])?;
    let b = coerce_set("jaccard_distance", &args[1])?;

    let intersection = a.iter().filter(|v| b.contains(v)).count();
    let union = a.len() + b.iter().filter(|v| !a.contains(v)).count();
    let denom = if union == 0 { 1 } else { union };

    Ok(Value::Float(1.0 - intersection as f64 / denom as f64))
}

fn in_set(args: &[Value]) -> Result<Value> {
    expect_arity("in_set", args, 2)?;
    let set = coerce_set("in_set", &args[1])?;
    Ok(Value::Bool(set.contains(&args[0])))
}

fn not_in_set(args: &[Value]) -> Result<Value> {
    expect_arity("not_in_set", args, 2)?;
    let set = coerce_set("not_in_set", &args[1])?;
    Ok(Value::Bool(!set.contains(&args[0])))
}

fn len(args: &[Value]) -> Result<Value> {
    expect_arity("len", args, 1)?;
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(v) | Value::Set(v) => v.len(),
        other => {
            return Err(EvalError::TypeMismatch(format!(
                "len() cannot measure a {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::Integer(n as i64))
}

fn abs(args: &[Value]) -> Result<Value> {
    expect_arity("abs", args, 1)?;
    match &args[0] {
        Value::Integer(n) => Ok(Value::Integer(n.saturating_abs())),
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => Err(EvalError::TypeMismatch(format!(
            "abs() expects a number, got {}",
            other.type_name()
        ))),
    }
}

fn min(args: &[Value]) -> Result<Value> {
    extremum("min", args, Ordering::Greater)
}

fn max(args: &[Value]) -> Result<Value> {
    extremum("max", args, Ordering::Less)
}

/// `min`/`max` over either two-plus scalar arguments or a single list/set
/// argument. `replace_when` is the ordering of the current best relative to
/// a candidate that makes the candidate win.
fn extremum(name: &str, args: &[Value], replace_when: Ordering) -> Result<Value> {
    let candidates: Vec<Value> = match args {
        [] => {
            return Err(EvalError::TypeMismatch(format!(
                "{name}() expects at least one argument"
            )));
        }
        [Value::List(v)] | [Value::Set(v)] => v.clone(),
        [single] => {
            return Err(EvalError::TypeMismatch(format!(
                "{name}() single argument must be a list or set, got {}",
                single.type_name()
            )));
        }
        many => many.to_vec(),
    };

    let mut iter = candidates.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(EvalError::TypeMismatch(format!(
            "{name}() of an empty sequence"
        )));
    };
    for candidate in iter {
        let ord = best.try_cmp(&candidate).ok_or_else(|| {
            EvalError::TypeMismatch(format!(
                "{name}() cannot order {} and {}",
                best.type_name(),
                candidate.type_name()
            ))
        })?;
        if ord == replace_when {
            best = candidate;
        }
    }
    Ok(best)
}

// =============================================================================
// Tests
// =============================================================================
