//! hfilter parser: converts a token stream into a rule-chain AST.
//!
//! Regular expressions on the right of `#` / `!#` are compiled here, once,
//! so a parsed rule never compiles a pattern during evaluation.

mod parse_expr;
mod parse_rule;
mod parser;

pub use parser::{ParseResult, Parser};
