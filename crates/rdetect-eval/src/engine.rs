//! The rule evaluation engine.
//!
//! The `Engine` holds a set of rules with their conditions compiled once at
//! load time. After loading, the engine is read-only: evaluation shares the
//! compiled rules immutably, so a pool of workers can evaluate distinct
//! events concurrently against the same engine without locking.

use rdetect_parser::{CompileError, Expr, Rule, RuleCollection, compile};

use crate::context::EventContext;
use crate::error::RuleError;
use crate::evaluator::evaluate_with_registry;
use crate::registry::{FunctionRegistry, registry};
use crate::result::{Evaluation, Hit, RuleFailure};

/// A rule with its condition compiled once at load time.
///
/// A compile failure is cached rather than raised: the rule stays in the
/// set and reports its failure at evaluation time, so loading a rule set
/// with one bad condition never discards the rest.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    condition: Result<Expr, CompileError>,
}

impl CompiledRule {
    pub fn new(rule: Rule) -> Self {
        let condition = compile(&rule.condition);
        CompiledRule { rule, condition }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// The compiled condition, or the error it failed with.
    pub fn condition(&self) -> Result<&Expr, &CompileError> {
        self.condition.as_ref()
    }
}

/// The main rule evaluation engine.
///
/// # Example
///
/// ```rust
/// use rdetect_eval::{Engine, EventContext};
/// use rdetect_parser::parse_rules_yaml;
///
/// let yaml = r#"
/// - name: impossible_travel
///   description: Same credential observed from many networks
///   severity: high
///   action: step_up_auth
///   condition: "unique_ips > 5"
///   metadata: {}
/// "#;
///
/// let collection = parse_rules_yaml(yaml).unwrap();
/// let mut engine = Engine::new();
/// engine.add_collection(&collection);
///
/// let mut ctx = EventContext::new();
/// ctx.insert("unique_ips", 7);
/// let outcome = engine.evaluate(&ctx);
/// assert_eq!(outcome.hits.len(), 1);
/// assert_eq!(outcome.hits[0].rule, "impossible_travel");
/// ```
pub struct Engine {
    rules: Vec<CompiledRule>,
    funcs: &'static FunctionRegistry,
}

impl Engine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Engine {
            rules: Vec::new(),
            funcs: registry(),
        }
    }

    /// Add a single rule, compiling its condition.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(CompiledRule::new(rule));
    }

    /// Add several rules, preserving order.
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) {
        for rule in rules {
            self.add_rule(rule);
        }
    }

    /// Add all rules from a loaded collection.
    pub fn add_collection(&mut self, collection: &RuleCollection) {
        self.add_rules(collection.rules.iter().cloned());
    }

    /// Number of rules loaded in the engine.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Access the compiled rules.
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Evaluate every enabled rule against one event context.
    ///
    /// Rules are evaluated in load order and hits are returned in that
    /// order. Disabled rules are skipped entirely — they produce neither a
    /// hit nor a failure, whatever their condition says. A rule whose
    /// condition failed to compile, or whose evaluation fails against this
    /// context, is recorded in [`Evaluation::failures`] and the walk
    /// continues with the next rule.
    pub fn evaluate(&self, ctx: &EventContext) -> Evaluation {
        let mut outcome = Evaluation::default();

        for compiled in &self.rules {
            let rule = &compiled.rule;
            if !rule.enabled {
                continue;
            }

            let expr = match &compiled.condition {
                Ok(expr) => expr,
                Err(e) => {
                    outcome.failures.push(RuleFailure {
                        rule: rule.name.clone(),
                        error: RuleError::Compile(e.clone()),
                    });
                    continue;
                }
            };

            match evaluate_with_registry(expr, ctx, self.funcs) {
                Ok(true) => outcome.hits.push(Hit::of(rule)),
                Ok(false) => {}
                Err(e) => outcome.failures.push(RuleFailure {
                    rule: rule.name.clone(),
                    error: RuleError::Eval(e),
                }),
            }
        }

        outcome
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate a rule slice against one event context, returning the hits in
/// rule order.
///
/// This is the one-shot surface: conditions are compiled on the fly and
/// failures are silently recorded away. Use [`Engine`] to reuse compiled
/// conditions across many events and to observe per-rule failures.
pub fn evaluate_rules(rules: &[Rule], ctx: &EventContext) -> Vec<Hit> {
    let mut engine = Engine::new();
    engine.add_rules(rules.iter().cloned());
    engine.evaluate(ctx).hits
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rdetect_parser::{Action, Metadata, Severity, Value};

    fn rule(name: &str, condition: &str) -> Rule {
        Rule {
            name: name.into(),
            description: format!("{name} description"),
            severity: Severity::Medium,
            action: Action::Notify,
            condition: condition.into(),
            metadata: Metadata::new(),
            enabled: true,
            ttl_seconds: None,
        }
    }

    fn ctx(pairs: &[(&str, Value)]) -> EventContext {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_hits_in_rule_order() {
        let mut engine = Engine::new();
        engine.add_rules([
            rule("third_wont_match", "score > 100"),
            rule("first", "score > 1"),
            rule("second", "score > 2"),
        ]);

        let outcome = engine.evaluate(&ctx(&[("score", Value::Integer(10))]));
        let names: Vec<&str> = outcome.hits.iter().map(|h| h.rule.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_disabled_rule_never_evaluated() {
        let mut disabled = rule("disabled", "this is ++ not even valid");
        disabled.enabled = false;
        let mut engine = Engine::new();
        engine.add_rule(disabled);
        engine.add_rule(rule("enabled", "score > 1"));

        let outcome = engine.evaluate(&ctx(&[("score", Value::Integer(5))]));
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].rule, "enabled");
        // No hit and no error from the disabled rule, invalid condition and all.
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_unparseable_rule_is_isolated() {
        let mut engine = Engine::new();
        engine.add_rules([
            rule("valid_a", "score > 1"),
            rule("broken", "score +* 1"),
            rule("valid_b", "score > 2"),
        ]);

        let outcome = engine.evaluate(&ctx(&[("score", Value::Integer(5))]));
        let names: Vec<&str> = outcome.hits.iter().map(|h| h.rule.as_str()).collect();
        assert_eq!(names, ["valid_a", "valid_b"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].rule, "broken");
        assert!(matches!(outcome.failures[0].error, RuleError::Compile(_)));
    }

    #[test]
    fn test_unknown_variable_is_isolated() {
        let mut engine = Engine::new();
        engine.add_rules([
            rule("needs_z", "z > 1"),
            rule("matches", "score > 1"),
        ]);

        let outcome = engine.evaluate(&ctx(&[("score", Value::Integer(5))]));
        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].rule, "matches");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].rule, "needs_z");
        assert!(matches!(outcome.failures[0].error, RuleError::Eval(_)));
    }

    #[test]
    fn test_same_failure_on_every_evaluation() {
        // Evaluation is pure; a failing rule fails identically every time.
        let mut engine = Engine::new();
        engine.add_rule(rule("broken", "a +"));
        let context = EventContext::new();
        let first = engine.evaluate(&context);
        let second = engine.evaluate(&context);
        assert_eq!(first.failures, second.failures);
    }

    #[test]
    fn test_ttl_propagates_to_hit() {
        let mut with_ttl = rule("with_ttl", "score > 1");
        with_ttl.ttl_seconds = Some(300);
        let mut engine = Engine::new();
        engine.add_rule(with_ttl);
        engine.add_rule(rule("without_ttl", "score > 1"));

        let outcome = engine.evaluate(&ctx(&[("score", Value::Integer(5))]));
        assert_eq!(outcome.hits[0].ttl_seconds, Some(300));
        assert_eq!(outcome.hits[1].ttl_seconds, None);
    }

    #[test]
    fn test_false_condition_is_silent() {
        let mut engine = Engine::new();
        engine.add_rule(rule("quiet", "score > 100"));
        let outcome = engine.evaluate(&ctx(&[("score", Value::Integer(5))]));
        assert!(outcome.hits.is_empty());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_evaluate_rules_convenience() {
        let rules = vec![rule("a", "score > 1"), rule("b", "score > 100")];
        let hits = evaluate_rules(&rules, &ctx(&[("score", Value::Integer(5))]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].rule, "a");
    }

    #[test]
    fn test_compiled_rule_exposes_condition_state() {
        let ok = CompiledRule::new(rule("ok", "x > 1"));
        assert!(ok.condition().is_ok());
        let bad = CompiledRule::new(rule("bad", "x >"));
        assert!(bad.condition().is_err());
    }
}
