//! Core parser infrastructure: token cursor, error reporting, helpers.

use hfilter_lexer::token::{Token, TokenKind};
use hfilter_types::ast::Grammar;
use hfilter_types::{CompileErrors, ErrorCode, FilterError, SourceFile, Span, MAX_NESTING_DEPTH};

/// The hfilter parser.
///
/// Consumes a token stream produced by the lexer and builds the rule chain.
/// Collects errors and resynchronises at clause boundaries.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: CompileErrors,
    /// Current parenthesis / call nesting depth.
    depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    /// `None` whenever `errors` is non-empty.
    pub grammar: Option<Box<Grammar>>,
    pub errors: CompileErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
            depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// The current token; past the end this keeps returning the final Eof.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    /// Advance the cursor by one and return the consumed token's kind.
    pub(crate) fn advance(&mut self) -> TokenKind {
        let kind = self.peek_kind().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(1, 1),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_else(|| Span::point(1, 1))
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Expect a specific token, reporting an error if it is missing.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<()> {
        if self.eat(expected) {
            Some(())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("expected '{}', got '{}'", expected, self.peek_kind()),
            );
            None
        }
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Run `parse` one nesting level deeper, refusing past [`MAX_NESTING_DEPTH`].
    pub(crate) fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("maximum nesting depth is {MAX_NESTING_DEPTH}"),
            );
            return None;
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let error = self.make_error(code, message, span);
        self.push_error(error);
    }

    pub(crate) fn make_error(
        &self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> FilterError {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        FilterError::new(&self.source_file.name, code, message, span, source_line)
    }

    pub(crate) fn push_error(&mut self, error: FilterError) {
        self.errors.push_error(error);
    }

    pub(crate) fn errors_reported(&self) -> bool {
        self.errors.has_errors()
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.is_full()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to the start of the next clause after an error.
    ///
    /// A clause ends after `=> NUMBER`; `default` always starts a new one.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Default => return,
                TokenKind::FatArrow => {
                    self.advance();
                    if matches!(self.peek_kind(), TokenKind::NumberLit(_)) {
                        self.advance();
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a rule chain.
    pub fn parse(mut self) -> ParseResult {
        let grammar = self.parse_rule();
        let grammar = if self.errors.has_errors() {
            None
        } else {
            grammar
        };
        ParseResult {
            grammar,
            errors: self.errors,
        }
    }
}
