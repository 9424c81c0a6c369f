use thiserror::Error;

/// Errors from compiling a condition expression.
///
/// Compilation is the security boundary of the engine: any construct a
/// condition string cannot legitimately contain is rejected here, before
/// evaluation ever sees it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The condition string is not parseable as an expression.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// The expression uses a construct outside the whitelist (attribute
    /// access, arithmetic other than set difference, `not`, an unregistered
    /// function name, ...).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Errors that can occur while loading rule definition files.
#[derive(Debug, Error)]
pub enum RuleParserError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("invalid severity '{0}'")]
    InvalidSeverity(String),

    #[error("invalid action '{0}'")]
    InvalidAction(String),

    #[error("invalid ttl_seconds: {0}")]
    InvalidTtl(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuleParserError>;
