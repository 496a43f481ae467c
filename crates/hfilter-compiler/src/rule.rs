//! Compiled rule handle.

use hfilter_eval::{EvalError, EvalResult, SymbolTable, SymbolTableError};
use hfilter_types::ast::Grammar;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Verdict reported by [`Rule::verdict`] when evaluation fails.
pub const ERROR_VERDICT: i32 = -1;

/// A compiled rule script.
///
/// The clause chain and its regexes are immutable, so a `Rule` can be
/// shared across threads and evaluated concurrently.
#[derive(Debug, Clone)]
pub struct Rule {
    grammar: Grammar,
    source_hash: String,
}

/// Failure to evaluate a rule against raw request data.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Symbols(#[from] SymbolTableError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl Rule {
    pub(crate) fn new(grammar: Grammar, source: &str) -> Self {
        Self {
            grammar,
            source_hash: source_hash(source),
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// SHA-256 of the script text, hex-encoded.
    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    pub fn clause_count(&self) -> usize {
        self.grammar.clauses().count()
    }

    /// Evaluate against one symbol table.
    pub fn evaluate(&self, symbols: &SymbolTable) -> EvalResult<i32> {
        let result = hfilter_eval::evaluate(Some(&self.grammar), symbols);
        match &result {
            Ok(verdict) => tracing::debug!(verdict, symbols = symbols.len(), "rule evaluated"),
            Err(err) => tracing::debug!(error = %err, "rule evaluation failed"),
        }
        result
    }

    /// Evaluate, collapsing any failure into [`ERROR_VERDICT`].
    pub fn verdict(&self, symbols: &SymbolTable) -> i32 {
        self.evaluate(symbols).unwrap_or_else(|err| {
            tracing::warn!(error = %err, hash = %self.source_hash, "rule evaluation failed");
            ERROR_VERDICT
        })
    }

    /// Evaluate against a `k1=v1&k2=v2` query string.
    pub fn evaluate_query(&self, query: &str) -> EvalResult<i32> {
        self.evaluate(&SymbolTable::from_query(query))
    }

    /// Evaluate against a JSON object.
    pub fn evaluate_json(&self, json: &str) -> Result<i32, InputError> {
        let symbols = SymbolTable::from_json(json)?;
        Ok(self.evaluate(&symbols)?)
    }
}

/// Renders the rule back to script form.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grammar)
    }
}

pub(crate) fn source_hash(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}
