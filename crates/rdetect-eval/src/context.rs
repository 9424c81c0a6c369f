//! Event context: the read-only variable bindings for one evaluation call.

use std::collections::HashMap;

use rdetect_parser::Value;

use crate::error::{EvalError, Result};

/// String-keyed, read-only bindings from variable name to runtime value.
///
/// A context is supplied fresh per evaluation call and never mutated by the
/// engine, which is what makes evaluation trivially parallelizable: workers
/// share compiled rules immutably while each owns its context.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    vars: HashMap<String, Value>,
}

impl EventContext {
    pub fn new() -> Self {
        EventContext {
            vars: HashMap::new(),
        }
    }

    /// Bind a variable. Accepts anything convertible into a [`Value`].
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Build a context from a JSON object (one event).
    ///
    /// Nested objects cannot be represented in the closed value model and
    /// are rejected with an error naming the offending field.
    pub fn from_json(event: &serde_json::Value) -> Result<Self> {
        let Some(obj) = event.as_object() else {
            return Err(EvalError::InvalidContext(
                "event must be a JSON object".into(),
            ));
        };

        let mut ctx = EventContext::new();
        for (key, val) in obj {
            let value = Value::from_json(val).ok_or_else(|| {
                EvalError::InvalidContext(format!(
                    "field '{key}' has a type the engine cannot represent"
                ))
            })?;
            ctx.vars.insert(key.clone(), value);
        }
        Ok(ctx)
    }
}

impl FromIterator<(String, Value)> for EventContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        EventContext {
            vars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let mut ctx = EventContext::new();
        ctx.insert("unique_ips", 7);
        ctx.insert("region", "EU");
        assert_eq!(ctx.get("unique_ips"), Some(&Value::Integer(7)));
        assert_eq!(ctx.get("region"), Some(&Value::String("EU".into())));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_from_json() {
        let event = json!({
            "unique_ips": 7,
            "score": 0.93,
            "region": "EU",
            "privileged": true,
            "devices": ["laptop", "phone"],
            "last_rotation": null
        });
        let ctx = EventContext::from_json(&event).unwrap();
        assert_eq!(ctx.len(), 6);
        assert_eq!(ctx.get("score"), Some(&Value::Float(0.93)));
        assert_eq!(
            ctx.get("devices"),
            Some(&Value::List(vec![
                Value::String("laptop".into()),
                Value::String("phone".into()),
            ]))
        );
        assert_eq!(ctx.get("last_rotation"), Some(&Value::Null));
    }

    #[test]
    fn test_from_json_rejects_non_object_event() {
        let err = EventContext::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, EvalError::InvalidContext(_)));
    }

    #[test]
    fn test_from_json_rejects_nested_objects() {
        let err = EventContext::from_json(&json!({"actor": {"id": 1}})).unwrap_err();
        match err {
            EvalError::InvalidContext(msg) => assert!(msg.contains("actor")),
            other => panic!("expected InvalidContext, got {other:?}"),
        }
    }
}
