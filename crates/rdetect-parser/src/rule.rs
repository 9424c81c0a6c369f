//! Rule data model: severity, action, and the rule record itself.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RuleParserError;

/// Ordered auxiliary data attached to a rule (e.g. MITRE ATT&CK technique
/// IDs), opaque to the engine and passed through to hits unchanged.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Severity of a triggered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl FromStr for Severity {
    type Err = RuleParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(RuleParserError::InvalidSeverity(other.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response action attached to a rule match, consumed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Deny,
    StepUpAuth,
    RotateImmediately,
    Quarantine,
    Notify,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Deny => "deny",
            Action::StepUpAuth => "step_up_auth",
            Action::RotateImmediately => "rotate_immediately",
            Action::Quarantine => "quarantine",
            Action::Notify => "notify",
        }
    }
}

impl FromStr for Action {
    type Err = RuleParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Action::Allow),
            "deny" => Ok(Action::Deny),
            "step_up_auth" => Ok(Action::StepUpAuth),
            "rotate_immediately" => Ok(Action::RotateImmediately),
            "quarantine" => Ok(Action::Quarantine),
            "notify" => Ok(Action::Notify),
            other => Err(RuleParserError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detection rule.
///
/// Immutable once constructed: the engine never mutates a rule during
/// evaluation, and a loaded rule set is only ever replaced wholesale, never
/// patched in place.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    /// Unique human identifier.
    pub name: String,
    /// Free-text description, copied into hits.
    pub description: String,
    pub severity: Severity,
    pub action: Action,
    /// Condition expression in the restricted grammar (see
    /// [`compile`](crate::compile)).
    pub condition: String,
    /// Auxiliary data, opaque to the engine.
    pub metadata: Metadata,
    /// Disabled rules are never evaluated.
    pub enabled: bool,
    /// Optional time-to-live hint (seconds) for downstream suppression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}
