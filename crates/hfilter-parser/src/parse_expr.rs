//! Expression, term and factor parsing.
//!
//! `&&` and `||` share one precedence level and associate to the left,
//! so `a || b && c` groups as `(a || b) && c`. Parentheses override.

use hfilter_lexer::token::TokenKind;
use hfilter_types::ast::*;
use hfilter_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// `expr -> expr '&&' term | expr '||' term | term`
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let first = self.parse_term()?;
        let span = first.span;
        let mut left = Expr::new(ExprKind::Term(first), span);
        loop {
            let is_and = match self.peek_kind() {
                TokenKind::AndAnd => true,
                TokenKind::OrOr => false,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let span = left.span.merge(right.span);
            let left_box = Box::new(left);
            let kind = if is_and {
                ExprKind::And {
                    left: left_box,
                    right,
                }
            } else {
                ExprKind::Or {
                    left: left_box,
                    right,
                }
            };
            left = Expr::new(kind, span);
        }
        Some(left)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Terms
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_term(&mut self) -> Option<Term> {
        let start = self.current_span();

        if self.check(&TokenKind::LParen) {
            return self.nested(|p| {
                p.advance();
                let inner = p.parse_expression()?;
                p.expect(&TokenKind::RParen)?;
                let span = start.merge(p.previous_span());
                Some(Term::new(TermKind::Paren(Box::new(inner)), span))
            });
        }

        let factor = self.parse_factor()?;
        let op = match self.peek_kind() {
            TokenKind::At => Operator::In,
            TokenKind::BangAt => Operator::NotIn,
            TokenKind::Greater => Operator::Gt,
            TokenKind::Less => Operator::Lt,
            TokenKind::EqEq => Operator::Eq,
            TokenKind::BangEq => Operator::Ne,
            TokenKind::GreaterEq => Operator::Ge,
            TokenKind::LessEq => Operator::Le,
            TokenKind::Hash => Operator::Match,
            TokenKind::BangHash => Operator::NotMatch,
            other => {
                let message = format!("expected an operator after '{factor}', got '{other}'");
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                return None;
            }
        };
        self.advance();

        let kind = match op {
            Operator::In | Operator::NotIn => {
                self.expect(&TokenKind::LParen)?;
                let list = self.parse_list()?;
                self.expect(&TokenKind::RParen)?;
                TermKind::Membership { op, factor, list }
            }
            Operator::Match | Operator::NotMatch => {
                let pattern = self.parse_pattern()?;
                TermKind::Match {
                    op,
                    factor,
                    pattern,
                }
            }
            _ => {
                let right = self.parse_factor()?;
                TermKind::Compare {
                    op,
                    left: factor,
                    right,
                }
            }
        };
        Some(Term::new(kind, start.merge(self.previous_span())))
    }

    /// The right side of `#` / `!#`: a string literal compiled as a regex.
    fn parse_pattern(&mut self) -> Option<Pattern> {
        let span = self.current_span();
        let TokenKind::StringLiteral(source) = self.peek_kind().clone() else {
            let message = format!(
                "regex operand must be a string literal, got '{}'",
                self.peek_kind()
            );
            let error = self
                .make_error(ErrorCode::REGEX_NOT_LITERAL, message, span)
                .with_suggestion("quote the pattern: field # '^abc'");
            self.push_error(error);
            return None;
        };
        self.advance();

        match Pattern::new(&source) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                self.error_at(
                    ErrorCode::INVALID_REGEX,
                    format!("invalid regex '{source}': {err}"),
                    span,
                );
                None
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Factors
    // ══════════════════════════════════════════════════════════════════════════

    /// `list -> factor | factor ',' list`
    fn parse_list(&mut self) -> Option<Vec<Factor>> {
        let mut list = vec![self.parse_factor()?];
        while self.eat(&TokenKind::Comma) {
            list.push(self.parse_factor()?);
        }
        Some(list)
    }

    /// `factor -> NUMBER | STRING | IDENT | func`
    fn parse_factor(&mut self) -> Option<Factor> {
        let span = self.current_span();
        match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => {
                self.advance();
                Some(Factor::new(FactorKind::Double(n), span))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Some(Factor::new(FactorKind::String(s), span))
            }
            TokenKind::Identifier(name) => {
                if self.look_ahead(1) == &TokenKind::LParen {
                    let names: Vec<_> = FuncKind::ALL.iter().map(|f| f.name()).collect();
                    let error = self
                        .make_error(
                            ErrorCode::UNKNOWN_FUNCTION,
                            format!("unknown function '{name}'"),
                            span,
                        )
                        .with_suggestion(format!("available functions: {}", names.join(", ")));
                    self.push_error(error);
                    return None;
                }
                self.advance();
                Some(Factor::new(FactorKind::Variable(name), span))
            }
            TokenKind::Builtin(kind) => self.nested(|p| p.parse_call(kind, span)),
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected a value, got '{other}'"),
                );
                None
            }
        }
    }

    /// `func -> NAME '(' [list] ')'`
    fn parse_call(&mut self, kind: FuncKind, start: Span) -> Option<Factor> {
        self.advance();
        self.expect(&TokenKind::LParen)?;
        let args = if self.check(&TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_list()?
        };
        self.expect(&TokenKind::RParen)?;
        Some(Factor::new(
            FactorKind::Function(Func { kind, args }),
            start.merge(self.previous_span()),
        ))
    }
}
