//! hfilter compiler: orchestrates the rule pipeline.
//!
//! ```text
//! Rule script → Lexer → Parser → Rule
//! Rule + SymbolTable → Evaluator → verdict
//! ```
//!
//! [`compile`] returns a [`Rule`] that owns its clause chain; there is no
//! process-wide "current rule". [`compile_to_result`] wraps the outcome in a
//! serializable [`CompileResult`] for tooling.

mod cases;
mod rule;

pub use cases::{run_cases, CaseOutcome, CaseReport, CaseResult};
pub use rule::{InputError, Rule, ERROR_VERDICT};

pub use hfilter_eval::{EvalError, EvalResult, SymbolTable, SymbolTableError, Value};
pub use hfilter_types::{CompileErrors, ErrorCode, FilterError, MAX_ERRORS, MAX_NESTING_DEPTH};

use hfilter_lexer::Lexer;
use hfilter_parser::Parser;
use hfilter_types::SourceFile;
use serde::{Deserialize, Serialize};

/// File name used in diagnostics by [`compile`].
pub const DEFAULT_FILE_NAME: &str = "rule";

/// Compile a rule script.
pub fn compile(source: &str) -> Result<Rule, CompileErrors> {
    compile_named(DEFAULT_FILE_NAME, source)
}

/// Compile a rule script, naming it `name` in diagnostics.
///
/// Lexing errors stop the pipeline before parsing so each problem is
/// reported once.
#[tracing::instrument(level = "debug", skip(source), fields(len = source.len()))]
pub fn compile_named(name: &str, source: &str) -> Result<Rule, CompileErrors> {
    let source_file = SourceFile::new(name, source);

    let lexed = Lexer::new(&source_file).lex();
    if lexed.errors.has_errors() {
        tracing::debug!(errors = lexed.errors.total_errors, "lexing failed");
        return Err(lexed.errors);
    }

    let parsed = Parser::new(lexed.tokens, &source_file).parse();
    match parsed.grammar {
        Some(grammar) if !parsed.errors.has_errors() => {
            let rule = Rule::new(*grammar, source);
            tracing::debug!(
                clauses = rule.clause_count(),
                hash = rule.source_hash(),
                "rule compiled"
            );
            Ok(rule)
        }
        _ => {
            tracing::debug!(errors = parsed.errors.total_errors, "parsing failed");
            Err(parsed.errors)
        }
    }
}

/// Serializable outcome of a compile, for editors and CI tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    /// SHA-256 of the source, present whether or not it compiled.
    pub source_hash: String,
    /// Number of clauses in the compiled chain; 0 on failure.
    pub clauses: usize,
    /// The script rendered back from its tree, on success.
    pub normalized: Option<String>,
    pub errors: CompileErrors,
}

/// Compile and package the outcome as a [`CompileResult`].
pub fn compile_to_result(source: &str, name: &str) -> CompileResult {
    let source_hash = rule::source_hash(source);
    match compile_named(name, source) {
        Ok(rule) => CompileResult {
            success: true,
            source_hash,
            clauses: rule.clause_count(),
            normalized: Some(rule.to_string()),
            errors: CompileErrors::empty(),
        },
        Err(errors) => CompileResult {
            success: false,
            source_hash,
            clauses: 0,
            normalized: None,
            errors,
        },
    }
}
