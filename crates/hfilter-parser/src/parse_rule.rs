//! Rule-chain parsing.
//!
//! ```text
//! grammar -> expr '=>' RET grammar
//!          | 'default' '=>' RET grammar
//!          | expr grammar
//!          | ε
//! ```

use hfilter_lexer::token::TokenKind;
use hfilter_types::ast::{Clause, Grammar};
use hfilter_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse every clause up to end of input and link them into a chain.
    pub(crate) fn parse_rule(&mut self) -> Option<Box<Grammar>> {
        let mut clauses = Vec::new();
        while !self.at_end() && !self.too_many_errors() {
            match self.parse_clause() {
                Some(clause) => clauses.push(clause),
                None => self.synchronize(),
            }
        }

        if clauses.is_empty() && !self.errors_reported() {
            self.error_at_current(ErrorCode::EMPTY_RULE, "rule script contains no clauses");
            return None;
        }
        Grammar::chain(clauses)
    }

    fn parse_clause(&mut self) -> Option<(Clause, Span)> {
        let start = self.current_span();

        if self.eat(&TokenKind::Default) {
            self.expect(&TokenKind::FatArrow)?;
            let ret = self.parse_verdict()?;
            return Some((Clause::DefaultGet { ret }, start.merge(self.previous_span())));
        }

        let expr = self.parse_expression()?;
        if self.eat(&TokenKind::FatArrow) {
            let ret = self.parse_verdict()?;
            Some((Clause::ExprGet { expr, ret }, start.merge(self.previous_span())))
        } else {
            let span = expr.span;
            Some((Clause::BareExpr(expr), span))
        }
    }

    /// The `RET` literal after `=>`, truncated toward zero.
    ///
    /// A verdict that does not fit in an `i32` is E105.
    fn parse_verdict(&mut self) -> Option<i32> {
        match *self.peek_kind() {
            TokenKind::NumberLit(n) => {
                let verdict = n.trunc();
                if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&verdict) {
                    self.error_at_current(
                        ErrorCode::INVALID_NUMBER,
                        format!("verdict {n} does not fit in a 32-bit integer"),
                    );
                    self.advance();
                    return None;
                }
                self.advance();
                Some(verdict as i32)
            }
            _ => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected verdict number after '=>', got '{}'", self.peek_kind()),
                );
                None
            }
        }
    }
}
