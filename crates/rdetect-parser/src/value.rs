//! Runtime values for condition evaluation.
//!
//! `Value` is a closed sum type: every constant a condition can contain and
//! every binding an event context can supply is one of these seven shapes.
//! Keeping the type closed lets comparisons and registry functions
//! pattern-match and reject mismatches explicitly instead of relying on
//! dynamic typing.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// A runtime value: number, string, boolean, null, list, or set.
///
/// Sets are stored as duplicate-free vectors in insertion order and compared
/// without regard to order. A vector (rather than a hash/btree set) is used
/// because `Float` values rule out `Eq`/`Hash`/`Ord` implementations;
/// membership is by [loose equality](#method.eq), which promotes integers
/// and floats to a common numeric comparison.
#[derive(Debug, Clone, Serialize)]
pub enum Value {
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Boolean value
    Bool(bool),
    /// Null / empty value
    Null,
    /// Ordered sequence of values
    List(Vec<Value>),
    /// Duplicate-free collection of values (insertion order preserved)
    Set(Vec<Value>),
}

impl Value {
    /// Human-readable name of the value's shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }

    /// Truthiness, applied to boolean operands and to the root result of an
    /// evaluation: null and zero are false, empty collections and strings
    /// are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::List(v) | Value::Set(v) => !v.is_empty(),
        }
    }

    /// Numeric view of the value. `None` for non-numbers (booleans are not
    /// numbers here).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Ordering between two values, where defined: number–number and
    /// string–string. Everything else (including NaN) is `None`.
    pub fn try_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Build a set from elements, dropping duplicates (first occurrence wins).
    pub fn set_from(elements: Vec<Value>) -> Value {
        let mut unique: Vec<Value> = Vec::with_capacity(elements.len());
        for element in elements {
            if !unique.contains(&element) {
                unique.push(element);
            }
        }
        Value::Set(unique)
    }

    /// Coerce the value to set elements: a set as-is, a list deduplicated,
    /// a string as its characters. Numbers, booleans, and null do not
    /// coerce (`None`).
    pub fn as_set_elements(&self) -> Option<Vec<Value>> {
        match self {
            Value::Set(v) => Some(v.clone()),
            Value::List(v) => {
                let mut unique: Vec<Value> = Vec::with_capacity(v.len());
                for element in v {
                    if !unique.contains(element) {
                        unique.push(element.clone());
                    }
                }
                Some(unique)
            }
            Value::String(s) => {
                let mut unique: Vec<Value> = Vec::new();
                for c in s.chars() {
                    let v = Value::String(c.to_string());
                    if !unique.contains(&v) {
                        unique.push(v);
                    }
                }
                Some(unique)
            }
            _ => None,
        }
    }

    /// Convert a JSON value. `None` when the value (or anything nested in
    /// it) is a JSON object, which the closed value model cannot represent.
    pub fn from_json(v: &serde_json::Value) -> Option<Value> {
        match v {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Integer(i))
                } else {
                    n.as_f64().map(Value::Float)
                }
            }
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(_) => None,
        }
    }
}

/// Loose equality: integers and floats compare numerically, sets compare
/// without regard to order, and values of different shapes are simply
/// unequal (equality never fails).
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|v| b.contains(v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => {
                write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| format!("{v}")).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Set(items) => {
                let parts: Vec<String> = items.iter().map(|v| format!("{v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}
