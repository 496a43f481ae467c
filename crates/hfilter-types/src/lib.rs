//! Shared types for the hfilter rule engine.
//!
//! This crate defines the rule-script AST, source spans and the structured
//! compile errors used by the lexer, parser and compiler.

mod error;
mod span;
pub mod ast;

pub use error::{
    CompileErrors, ErrorCategory, ErrorCode, FilterError, Severity, MAX_ERRORS, MAX_NESTING_DEPTH,
};
pub use span::{SourceFile, Span};
