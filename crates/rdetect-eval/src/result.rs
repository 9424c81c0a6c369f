//! Hit and failure records produced by rule evaluation.

use std::fmt;

use serde::Serialize;

use rdetect_parser::{Action, Metadata, Rule, Severity};

use crate::error::RuleError;

/// The record produced when a rule's condition evaluates to true against an
/// event context.
#[derive(Debug, Clone, Serialize)]
pub struct Hit {
    /// Name of the matched rule.
    pub rule: String,
    pub description: String,
    pub severity: Severity,
    pub action: Action,
    /// The rule's metadata, passed through unchanged.
    pub metadata: Metadata,
    /// Time-to-live hint in seconds. Omitted from serialized output (not
    /// null) when the rule carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

impl Hit {
    /// Build the hit for a matched rule.
    pub fn of(rule: &Rule) -> Self {
        Hit {
            rule: rule.name.clone(),
            description: rule.description.clone(),
            severity: rule.severity,
            action: rule.action,
            metadata: rule.metadata.clone(),
            ttl_seconds: rule.ttl_seconds,
        }
    }
}

/// A per-rule failure recorded during a batch evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    /// Name of the rule that failed.
    pub rule: String,
    pub error: RuleError,
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule '{}': {}", self.rule, self.error)
    }
}

/// The outcome of evaluating a rule set against one event context.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Hits, in rule-list order.
    pub hits: Vec<Hit>,
    /// Per-rule failures. A failure never aborts the batch: one malformed
    /// or context-mismatched rule must not suppress hits from other rules.
    pub failures: Vec<RuleFailure>,
}
