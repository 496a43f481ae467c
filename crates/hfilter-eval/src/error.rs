//! Runtime error types for the hfilter evaluator.

use hfilter_types::ast::Operator;
use hfilter_types::Span;
use thiserror::Error;

/// Evaluation error. Any of these aborts the whole rule evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable had no binding in the symbol table.
    #[error("{span}: symbol '{name}' not found")]
    SymbolNotFound { name: String, span: Span },

    /// An operand resolved to the wrong kind of value.
    #[error("{span}: {context} expects {expected}, got {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
        span: Span,
    },

    /// `atoi` could not read its argument as a number.
    #[error("{span}: cannot parse '{text}' as a number")]
    ParseValue { text: String, span: Span },

    #[error("{span}: operator '{op}' not supported")]
    UnsupportedOperator { op: Operator, span: Span },

    /// A builtin that reads an argument was called with none.
    #[error("{span}: {function}() requires an argument")]
    MissingArgument {
        function: &'static str,
        span: Span,
    },
}

impl EvalError {
    /// Location of the node that failed.
    pub fn span(&self) -> Span {
        match self {
            Self::SymbolNotFound { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::ParseValue { span, .. }
            | Self::UnsupportedOperator { span, .. }
            | Self::MissingArgument { span, .. } => *span,
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Failure to build a symbol table from request data.
#[derive(Debug, Error)]
pub enum SymbolTableError {
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON input must be an object, got {0}")]
    NotAnObject(&'static str),
}
