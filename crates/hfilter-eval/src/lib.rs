//! hfilter evaluator: symbol tables, builtins and rule-chain evaluation.
//!
//! A parsed [`Grammar`] is never mutated here, so one tree can be evaluated
//! from many threads at once, each call with its own [`SymbolTable`].

pub mod compare;
pub mod error;
pub mod evaluator;
mod functions;
pub mod symbols;
pub mod value;

pub use compare::{compare, DOUBLE_TOLERANCE};
pub use error::{EvalError, EvalResult, SymbolTableError};
pub use evaluator::Evaluator;
pub use symbols::{Symbol, SymbolTable};
pub use value::Value;

use hfilter_types::ast::Grammar;

/// Evaluate a clause chain against `symbols`, returning its verdict.
#[tracing::instrument(level = "trace", skip_all, fields(symbols = symbols.len()))]
pub fn evaluate(grammar: Option<&Grammar>, symbols: &SymbolTable) -> EvalResult<i32> {
    Evaluator::new(symbols).eval_grammar(grammar)
}
