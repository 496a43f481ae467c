//! Case-file runner.
//!
//! A case file holds one check per line:
//!
//! ```text
//! EXPECT%SCRIPT%INPUT
//! ```
//!
//! Empty lines and lines starting with `/` are skipped, as are lines that
//! do not split into exactly three fields. An input starting with `{` is a
//! JSON object; anything else is a query string.

use crate::compile_named;
use hfilter_eval::SymbolTable;
use hfilter_types::CompileErrors;
use serde::Serialize;

/// Result of one case line.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed { expected: i32, actual: i32 },
    CompileError { errors: CompileErrors },
    EvalError { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    /// 1-based line number in the case file.
    pub line: usize,
    pub script: String,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseReport {
    pub results: Vec<CaseResult>,
}

impl CaseReport {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CaseOutcome::Failed { .. }))
    }

    /// Lines that could not be compiled or evaluated.
    pub fn errored(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                CaseOutcome::CompileError { .. } | CaseOutcome::EvalError { .. }
            )
        })
    }

    /// True when no case produced a wrong verdict.
    ///
    /// Compile and evaluation errors are reported but do not fail the run,
    /// so a case file can document inputs that are expected to be rejected.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Run every case in `text`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn run_cases(text: &str) -> CaseReport {
    let mut report = CaseReport::default();
    for (index, line) in text.split('\n').enumerate() {
        if line.is_empty() || line.starts_with('/') {
            continue;
        }
        let fields: Vec<&str> = line.split('%').collect();
        let &[expect, script, input] = fields.as_slice() else {
            continue;
        };
        let line_number = index + 1;
        let outcome = run_case(line_number, expect, script, input);
        report.results.push(CaseResult {
            line: line_number,
            script: script.to_string(),
            outcome,
        });
    }
    tracing::debug!(
        passed = report.passed(),
        failed = report.failed(),
        errored = report.errored(),
        "case file finished"
    );
    report
}

fn run_case(line: usize, expect: &str, script: &str, input: &str) -> CaseOutcome {
    let name = format!("case:{line}");
    let rule = match compile_named(&name, script) {
        Ok(rule) => rule,
        Err(errors) => return CaseOutcome::CompileError { errors },
    };

    let symbols = if input.starts_with('{') {
        SymbolTable::from_json(input).unwrap_or_else(|err| {
            tracing::warn!(line, error = %err, "unreadable JSON input, using no symbols");
            SymbolTable::new()
        })
    } else {
        SymbolTable::from_query(input)
    };

    let expected = expect.parse::<i32>().unwrap_or_else(|_| {
        tracing::warn!(line, expect, "expected verdict is not an integer, using 0");
        0
    });

    match rule.evaluate(&symbols) {
        Ok(actual) if actual == expected => CaseOutcome::Passed,
        Ok(actual) => CaseOutcome::Failed { expected, actual },
        Err(err) => CaseOutcome::EvalError {
            message: err.to_string(),
        },
    }
}
