//! Rule-script lexer.
//!
//! - Strings are single-quoted with no escapes: `'[^']*'`
//! - Numbers are `-?[0-9]+(\.[0-9]*)?`
//! - `//` comments run to end of line
//! - Space, tab, CR, LF and `;` separate tokens
//! - Unknown characters are reported and skipped, up to [`MAX_ERRORS`]

use hfilter_types::{CompileErrors, ErrorCode, FilterError, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// The hfilter lexer.
pub struct Lexer<'src> {
    source: &'src str,
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    line: u32,
    col: u32,
    errors: CompileErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the whole script.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.total_errors >= MAX_ERRORS {
                tokens.push(Token::new(TokenKind::Eof, self.current_span()));
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.pos..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = FilterError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n' | ';') => {
                    self.advance();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(ch) = self.advance() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_trivia();

            let start_line = self.line;
            let start_col = self.col;
            let start = self.pos;
            let Some(ch) = self.advance() else {
                return Token::new(TokenKind::Eof, self.current_span());
            };

            let kind = match ch {
                '\'' => self.scan_string(start_line, start_col),
                '0'..='9' => Some(self.scan_number(start, start_line, start_col)),
                '-' if matches!(self.peek(), Some('0'..='9')) => {
                    Some(self.scan_number(start, start_line, start_col))
                }
                'a'..='z' | 'A'..='Z' | '_' => Some(self.scan_word(start)),
                '@' => Some(TokenKind::At),
                '#' => Some(TokenKind::Hash),
                '(' => Some(TokenKind::LParen),
                ')' => Some(TokenKind::RParen),
                ',' => Some(TokenKind::Comma),
                '!' if self.eat('@') => Some(TokenKind::BangAt),
                '!' if self.eat('#') => Some(TokenKind::BangHash),
                '!' if self.eat('=') => Some(TokenKind::BangEq),
                '=' if self.eat('=') => Some(TokenKind::EqEq),
                '=' if self.eat('>') => Some(TokenKind::FatArrow),
                '<' if self.eat('=') => Some(TokenKind::LessEq),
                '<' => Some(TokenKind::Less),
                '>' if self.eat('=') => Some(TokenKind::GreaterEq),
                '>' => Some(TokenKind::Greater),
                '&' if self.eat('&') => Some(TokenKind::AndAnd),
                '|' if self.eat('|') => Some(TokenKind::OrOr),
                other => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_CHARACTER,
                        format!("unexpected character '{other}'"),
                        span,
                    );
                    if self.errors.total_errors >= MAX_ERRORS {
                        return Token::new(TokenKind::Eof, self.current_span());
                    }
                    None
                }
            };

            if let Some(kind) = kind {
                return Token::new(kind, self.span_from(start_line, start_col));
            }
        }
    }

    /// Scan the body of a string after the opening quote.
    ///
    /// Returns `None` when the string is unterminated.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Option<TokenKind> {
        let body_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    );
                    return None;
                }
                Some('\'') => {
                    let body = self.source[body_start..self.pos].to_string();
                    self.advance();
                    return Some(TokenKind::StringLiteral(body));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self, start: usize, start_line: u32, start_col: u32) -> TokenKind {
        while let Some('0'..='9') = self.peek() {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while let Some('0'..='9') = self.peek() {
                self.advance();
            }
        }

        let text = &self.source[start..self.pos];
        match text.parse::<f64>() {
            Ok(value) => TokenKind::NumberLit(value),
            Err(_) => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("invalid number literal '{text}'"),
                    span,
                );
                TokenKind::NumberLit(0.0)
            }
        }
    }

    fn scan_word(&mut self, start: usize) -> TokenKind {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let word = &self.source[start..self.pos];
        TokenKind::from_keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
    }
}
