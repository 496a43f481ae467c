//! Rule-chain, expression and term evaluation.
//!
//! Results follow the integer truth convention: `1` is true, `0` is false.
//! `&&` passes a left result `<= 0` through unchanged and `||` passes any
//! non-zero left result through.

use crate::compare::compare;
use crate::error::{EvalError, EvalResult};
use crate::symbols::SymbolTable;
use crate::value::Value;
use hfilter_types::ast::*;
use hfilter_types::Span;

/// Walks a compiled rule against one symbol table.
pub struct Evaluator<'a> {
    symbols: &'a SymbolTable,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &'a SymbolTable {
        self.symbols
    }

    // ══════════════════════════════════════════════════════════════════════
    // Rule chain
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate a clause chain to its verdict. An empty chain yields `0`.
    ///
    /// `expr => RET` fires when its guard is exactly `1`; a bare expression
    /// fires with any non-zero result. `default => RET` applies only when
    /// everything after it yields `0`.
    pub fn eval_grammar(&self, grammar: Option<&Grammar>) -> EvalResult<i32> {
        let mut pending_defaults = Vec::new();
        let mut verdict = 0;

        for node in grammar.into_iter().flat_map(|g| g.clauses()) {
            match &node.clause {
                Clause::ExprGet { expr, ret } => {
                    if self.eval_expr(expr)? == 1 {
                        tracing::trace!(line = node.span.start_line, ret, "clause matched");
                        verdict = *ret;
                        break;
                    }
                }
                Clause::DefaultGet { ret } => pending_defaults.push(*ret),
                Clause::BareExpr(expr) => {
                    let result = self.eval_expr(expr)?;
                    if result != 0 {
                        tracing::trace!(line = node.span.start_line, result, "expression matched");
                        verdict = result;
                        break;
                    }
                }
            }
        }

        // Innermost default first: each one only fills in a zero.
        for ret in pending_defaults.into_iter().rev() {
            if verdict == 0 {
                verdict = ret;
            }
        }
        Ok(verdict)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    pub fn eval_expr(&self, expr: &Expr) -> EvalResult<i32> {
        // Unwind the left spine so long `&&`/`||` chains don't recurse.
        let mut spine = Vec::new();
        let mut node = expr;
        let first = loop {
            match &node.kind {
                ExprKind::And { left, right } => {
                    spine.push((true, right));
                    node = &**left;
                }
                ExprKind::Or { left, right } => {
                    spine.push((false, right));
                    node = &**left;
                }
                ExprKind::Term(term) => break term,
            }
        };

        let mut result = self.eval_term(first)?;
        for (is_and, right) in spine.into_iter().rev() {
            let short_circuit = if is_and { result <= 0 } else { result != 0 };
            if !short_circuit {
                result = self.eval_term(right)?;
            }
        }
        Ok(result)
    }

    pub fn eval_term(&self, term: &Term) -> EvalResult<i32> {
        match &term.kind {
            TermKind::Membership { op, factor, list } => self.eval_membership(*op, factor, list),
            TermKind::Compare { op, left, right } => {
                let left = self.resolve(left)?;
                let right = self.resolve(right)?;
                compare(*op, &left, &right, term.span)
            }
            TermKind::Match {
                op,
                factor,
                pattern,
            } => self.eval_match(*op, factor, pattern, term.span),
            TermKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    fn eval_membership(&self, op: Operator, factor: &Factor, list: &[Factor]) -> EvalResult<i32> {
        let needle = self.resolve(factor)?;
        let mut found = false;
        for element in list {
            let candidate = self.resolve(element)?;
            if compare(Operator::Eq, &needle, &candidate, element.span)? > 0 {
                found = true;
                break;
            }
        }
        match op {
            Operator::In => Ok(i32::from(found)),
            Operator::NotIn => Ok(i32::from(!found)),
            other => Err(EvalError::UnsupportedOperator {
                op: other,
                span: factor.span,
            }),
        }
    }

    fn eval_match(
        &self,
        op: Operator,
        factor: &Factor,
        pattern: &Pattern,
        span: Span,
    ) -> EvalResult<i32> {
        let text = match self.resolve(factor)? {
            Value::String(s) => s,
            other => {
                return Err(EvalError::TypeMismatch {
                    context: format!("regex operator '{op}'"),
                    expected: "string",
                    found: other.kind_name(),
                    span: factor.span,
                })
            }
        };
        let matched = pattern.is_match(&text);
        match op {
            Operator::Match => Ok(i32::from(matched)),
            Operator::NotMatch => Ok(i32::from(!matched)),
            other => Err(EvalError::UnsupportedOperator { op: other, span }),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Factors
    // ══════════════════════════════════════════════════════════════════════

    /// Resolve a factor to a value: literals stand for themselves, variables
    /// are looked up and function calls are evaluated.
    pub fn resolve(&self, factor: &Factor) -> EvalResult<Value> {
        match &factor.kind {
            FactorKind::Double(n) => Ok(Value::Double(*n)),
            FactorKind::String(s) => Ok(Value::String(s.clone())),
            FactorKind::Variable(name) => self.symbols.lookup(name, factor.span).cloned(),
            FactorKind::Function(func) => self.call(func, factor.span),
        }
    }
}
