//! YAML → rule loader.
//!
//! A rule file is a YAML sequence of rule records:
//!
//! ```yaml
//! - name: impossible_travel
//!   description: Same credential observed from many networks
//!   severity: high
//!   action: step_up_auth
//!   condition: "unique_ips > 5 and in_set(region, ['EU', 'US'])"
//!   metadata:
//!     mitre_attack: [T1078]
//!   ttl_seconds: 300
//! ```
//!
//! `enabled` defaults to true; `ttl_seconds` is optional and must be a
//! positive integer. Records that fail to parse are reported in
//! [`RuleCollection::errors`] while the rest of the file loads — one bad
//! record never discards a file's remaining rules.

use std::path::Path;

use serde_yaml::Value;

use crate::error::{Result, RuleParserError};
use crate::rule::{Metadata, Rule};

// =============================================================================
// Public API
// =============================================================================

/// Rules loaded from one or more files, with per-record errors collected
/// instead of raised.
#[derive(Debug, Clone, Default)]
pub struct RuleCollection {
    pub rules: Vec<Rule>,
    /// Human-readable descriptions of records that failed to load.
    pub errors: Vec<String>,
}

impl RuleCollection {
    pub fn new() -> Self {
        RuleCollection {
            rules: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parse a YAML string containing a sequence of rule records.
///
/// Fails only when the document as a whole is unusable (not valid YAML, or
/// not a sequence); individual bad records land in
/// [`RuleCollection::errors`].
pub fn parse_rules_yaml(yaml: &str) -> Result<RuleCollection> {
    let value: Value = serde_yaml::from_str(yaml)?;
    let Some(seq) = value.as_sequence() else {
        return Err(RuleParserError::InvalidRule(
            "rule file must be a YAML sequence of rule records".into(),
        ));
    };

    let mut collection = RuleCollection::new();
    for (idx, record) in seq.iter().enumerate() {
        match parse_rule(record) {
            Ok(rule) => collection.rules.push(rule),
            Err(e) => collection
                .errors
                .push(format!("{}: {e}", record_label(record, idx))),
        }
    }
    Ok(collection)
}

/// Parse a single rule file from a path.
pub fn parse_rules_file(path: &Path) -> Result<RuleCollection> {
    let content = std::fs::read_to_string(path)?;
    parse_rules_yaml(&content)
}

/// Parse all rule files (`*.yml`, `*.yaml`) from a directory, recursively.
///
/// File-level failures are collected into [`RuleCollection::errors`]
/// prefixed with the file path, so one broken file never hides the rest.
pub fn parse_rules_directory(dir: &Path) -> Result<RuleCollection> {
    let mut collection = RuleCollection::new();

    fn walk(dir: &Path, collection: &mut RuleCollection) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(&path, collection)?;
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml" | "yaml")
            ) {
                match parse_rules_file(&path) {
                    Ok(sub) => {
                        collection.rules.extend(sub.rules);
                        collection
                            .errors
                            .extend(sub.errors.into_iter().map(|e| {
                                format!("{}: {e}", path.display())
                            }));
                    }
                    Err(e) => {
                        collection.errors.push(format!("{}: {e}", path.display()));
                    }
                }
            }
        }
        Ok(())
    }

    walk(dir, &mut collection)?;
    Ok(collection)
}

// =============================================================================
// Record parsing
// =============================================================================

/// Label for error messages: the record's `name` when it has one, its index
/// otherwise.
pub(crate) fn record_label(record: &Value, idx: usize) -> String {
    record
        .as_mapping()
        .and_then(|m| get_str(m, "name"))
        .map(|n| format!("rule '{n}'"))
        .unwrap_or_else(|| format!("record {idx}"))
}

/// Parse one rule record from a YAML value.
pub(crate) fn parse_rule(value: &Value) -> Result<Rule> {
    let m = value.as_mapping().ok_or_else(|| {
        RuleParserError::InvalidRule("rule record must be a YAML mapping".into())
    })?;

    let name = require_str(m, "name")?.to_string();
    let description = require_str(m, "description")?.to_string();
    let severity = require_str(m, "severity")?.parse()?;
    let action = require_str(m, "action")?.parse()?;
    let condition = require_str(m, "condition")?.to_string();

    let metadata_val = m
        .get(val_key("metadata"))
        .ok_or_else(|| RuleParserError::MissingField("metadata".into()))?;
    let metadata = parse_metadata(metadata_val)?;

    let enabled = match m.get(val_key("enabled")) {
        None => true,
        Some(v) => v.as_bool().ok_or_else(|| {
            RuleParserError::InvalidRule("'enabled' must be a boolean".into())
        })?,
    };

    let ttl_seconds = match m.get(val_key("ttl_seconds")) {
        None => None,
        Some(v) => match v.as_u64() {
            Some(n) if n > 0 => Some(n),
            _ => {
                return Err(RuleParserError::InvalidTtl(
                    "must be a positive integer".into(),
                ));
            }
        },
    };

    Ok(Rule {
        name,
        description,
        severity,
        action,
        condition,
        metadata,
        enabled,
        ttl_seconds,
    })
}

/// Metadata is carried as ordered JSON so it round-trips into hits
/// unchanged.
fn parse_metadata(value: &Value) -> Result<Metadata> {
    if !value.is_mapping() {
        return Err(RuleParserError::InvalidMetadata(
            "metadata must be a mapping".into(),
        ));
    }
    let json = serde_json::to_value(value)
        .map_err(|e| RuleParserError::InvalidMetadata(e.to_string()))?;
    match json {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(RuleParserError::InvalidMetadata(
            "metadata must be a mapping".into(),
        )),
    }
}

// =============================================================================
// YAML Helpers
// =============================================================================

fn val_key(s: &str) -> Value {
    Value::String(s.to_string())
}

fn get_str<'a>(m: &'a serde_yaml::Mapping, key: &str) -> Option<&'a str> {
    m.get(val_key(key)).and_then(|v| v.as_str())
}

fn require_str<'a>(m: &'a serde_yaml::Mapping, key: &str) -> Result<&'a str> {
    m.get(val_key(key))
        .ok_or_else(|| RuleParserError::MissingField(key.to_string()))?
        .as_str()
        .ok_or_else(|| RuleParserError::InvalidRule(format!("'{key}' must be a string")))
}

// =============================================================================
// Tests
// =============================================================================
