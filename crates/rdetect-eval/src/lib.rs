//! # rdetect-eval
//!
//! Sandboxed evaluator and rule-evaluation engine for detection rule
//! conditions.
//!
//! This crate consumes the expression trees produced by [`rdetect_parser`]
//! and evaluates them against per-event contexts:
//!
//! - **Safe evaluator** (stateless): an exhaustive walk over the closed
//!   expression tree. The only capabilities reachable from a condition are
//!   the eight node kinds and the function registry — no I/O, no state, no
//!   general code execution.
//! - **Function registry**: the fixed set of whitelisted operations
//!   (`jaccard_distance`, `in_set`, `not_in_set`, `len`, `abs`, `min`,
//!   `max`), built once and shared by reference.
//! - **Engine** (the orchestrator): compiles a rule set once, then
//!   evaluates events against it, emitting hits in rule order and isolating
//!   per-rule failures so one bad rule never suppresses the rest.
//!
//! Compilation and evaluation are synchronous, deterministic pure functions
//! with no shared mutable state, which makes the engine trivially
//! parallelizable: workers share an `Engine` immutably and each owns its
//! event context.
//!
//! ## Quick Start
//!
//! ```rust
//! use rdetect_eval::{EventContext, evaluate};
//! use rdetect_parser::compile;
//!
//! let expr = compile("unique_ips > 5 and in_set(region, ['EU', 'US'])").unwrap();
//!
//! let mut ctx = EventContext::new();
//! ctx.insert("unique_ips", 7);
//! ctx.insert("region", "EU");
//!
//! assert!(evaluate(&expr, &ctx).unwrap());
//! ```
//!
//! ## Evaluating a rule set
//!
//! ```rust
//! use rdetect_eval::{Engine, EventContext};
//! use rdetect_parser::parse_rules_yaml;
//!
//! let yaml = r#"
//! - name: impossible_travel
//!   description: Same credential observed from many networks
//!   severity: high
//!   action: step_up_auth
//!   condition: "unique_ips > 5"
//!   metadata:
//!     mitre_attack: [T1078]
//!   ttl_seconds: 300
//! "#;
//!
//! let collection = parse_rules_yaml(yaml).unwrap();
//! let mut engine = Engine::new();
//! engine.add_collection(&collection);
//!
//! let mut ctx = EventContext::new();
//! ctx.insert("unique_ips", 7);
//!
//! let outcome = engine.evaluate(&ctx);
//! assert_eq!(outcome.hits.len(), 1);
//! assert_eq!(outcome.hits[0].ttl_seconds, Some(300));
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod registry;
pub mod result;

// Re-export the most commonly used types and functions at crate root
pub use context::EventContext;
pub use engine::{CompiledRule, Engine, evaluate_rules};
pub use error::{EvalError, Result, RuleError};
pub use evaluator::{eval_expr, evaluate, evaluate_with_registry};
pub use registry::{BuiltinFn, FunctionRegistry, registry};
pub use result::{Evaluation, Hit, RuleFailure};
