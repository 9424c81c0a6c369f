//! Evaluation-specific error types.

use thiserror::Error;

use rdetect_parser::CompileError;

/// Errors that can occur while evaluating a compiled condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable reference is absent from the supplied event context.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// An operator or function received operand types it cannot handle.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A function name did not resolve in the registry. The compiler already
    /// rejects these; this is the evaluator's own line of defense.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// An event value could not be represented in the closed value model.
    #[error("invalid context value: {0}")]
    InvalidContext(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Why a single rule failed during a batch evaluation: either its condition
/// never compiled, or evaluation against this context failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}
