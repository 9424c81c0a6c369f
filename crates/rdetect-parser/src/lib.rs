//! # rdetect-parser
//!
//! Parser and compiler for detection rules and the restricted condition
//! language they embed.
//!
//! This crate handles:
//!
//! - **Condition expressions**: a deliberately small boolean/comparison
//!   language (`and`/`or`, the six comparison operators, whitelisted
//!   function calls, variables, scalar/list/set literals, and set
//!   difference) compiled into a closed expression tree.
//! - **Whitelist enforcement at compile time**: anything outside the eight
//!   expression-tree node kinds — attribute access, arithmetic other than
//!   set difference, `not`, unregistered function names — is rejected
//!   before evaluation ever runs. A condition string cannot reach any
//!   capability the tree cannot express.
//! - **Rule records**: the `Rule` data model (severity, action, metadata,
//!   TTL) and a YAML loader with per-record error collection.
//! - **Rule-file validation**: exhaustive per-file error reports for CI.
//!
//! ## Architecture
//!
//! - **PEG grammar** ([`pest`]) for condition parsing with correct operator
//!   precedence (`or` < `and` < comparisons < `-`) and Pratt parsing
//! - **serde_yaml** for rule-file deserialization
//! - **regex** for MITRE ATT&CK technique-ID validation
//!
//! ## Quick Start
//!
//! ```rust
//! use rdetect_parser::compile;
//!
//! let expr = compile("unique_ips > 5 and in_set(region, ['EU', 'US'])").unwrap();
//! assert_eq!(
//!     expr.to_string(),
//!     "(unique_ips > 5 and in_set(region, ['EU', 'US']))"
//! );
//!
//! // The whitelist is enforced at compile time:
//! assert!(compile("__import__('os')").is_err());
//! assert!(compile("x.y").is_err());
//! ```
//!
//! ## Loading rules
//!
//! ```rust
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
//! "#;
//!
//! let collection = parse_rules_yaml(yaml).unwrap();
//! assert_eq!(collection.rules.len(), 1);
//! assert!(collection.rules[0].enabled);
//! ```

pub mod ast;
pub mod condition;
pub mod error;
pub mod parser;
pub mod rule;
pub mod validate;
pub mod value;

// Re-export the most commonly used types and functions at crate root
pub use ast::{BoolOp, CmpOp, Expr, FUNCTION_WHITELIST};
pub use condition::compile;
pub use error::{CompileError, Result, RuleParserError};
pub use parser::{RuleCollection, parse_rules_directory, parse_rules_file, parse_rules_yaml};
pub use rule::{Action, Metadata, Rule, Severity};
pub use validate::{
    FileReport, validate_rules_directory, validate_rules_file, validate_rules_str,
};
pub use value::Value;
