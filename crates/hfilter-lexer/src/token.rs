//! Token types for the hfilter lexer.

use hfilter_types::ast::FuncKind;
use hfilter_types::Span;
use std::fmt;

/// Words the lexer never reports as [`TokenKind::Identifier`].
pub const ALL_KEYWORDS: &[&str] = &["default", "len", "md5", "count", "atoi", "itoa"];

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every token kind of the rule language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// `42`, `-7`, `3.14`
    NumberLit(f64),
    /// `'text'`, quotes stripped
    StringLiteral(String),

    // ── Names ────────────────────────────────────────────────

    /// Symbol-table variable or an unknown function name.
    Identifier(String),
    /// `default`
    Default,
    /// `len`, `md5`, `count`, `atoi`, `itoa`
    Builtin(FuncKind),

    // ── Operators ────────────────────────────────────────────

    /// `@`
    At,
    /// `!@`
    BangAt,
    /// `#`
    Hash,
    /// `!#`
    BangHash,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `=>`
    FatArrow,

    // ── Punctuation ──────────────────────────────────────────

    LParen,
    RParen,
    Comma,

    Eof,
}

impl TokenKind {
    /// Map a scanned word to its keyword token, if it is one.
    pub fn from_keyword(word: &str) -> Option<TokenKind> {
        if word == "default" {
            return Some(TokenKind::Default);
        }
        FuncKind::from_name(word).map(TokenKind::Builtin)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(self, TokenKind::Default | TokenKind::Builtin(_))
    }

    /// True for tokens that may start a factor.
    pub fn starts_factor(&self) -> bool {
        matches!(
            self,
            TokenKind::NumberLit(_)
                | TokenKind::StringLiteral(_)
                | TokenKind::Identifier(_)
                | TokenKind::Builtin(_)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::NumberLit(n) => write!(f, "{n}"),
            TokenKind::StringLiteral(s) => write!(f, "'{s}'"),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::Default => f.write_str("default"),
            TokenKind::Builtin(kind) => f.write_str(kind.name()),
            TokenKind::At => f.write_str("@"),
            TokenKind::BangAt => f.write_str("!@"),
            TokenKind::Hash => f.write_str("#"),
            TokenKind::BangHash => f.write_str("!#"),
            TokenKind::EqEq => f.write_str("=="),
            TokenKind::BangEq => f.write_str("!="),
            TokenKind::Less => f.write_str("<"),
            TokenKind::LessEq => f.write_str("<="),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::GreaterEq => f.write_str(">="),
            TokenKind::AndAnd => f.write_str("&&"),
            TokenKind::OrOr => f.write_str("||"),
            TokenKind::FatArrow => f.write_str("=>"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_is_recognised() {
        for word in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(word)
                .unwrap_or_else(|| panic!("'{word}' should be a keyword"));
            assert!(kind.is_keyword());
            assert_eq!(kind.to_string(), *word);
        }
    }

    #[test]
    fn test_identifiers_are_not_keywords() {
        assert_eq!(TokenKind::from_keyword("length"), None);
        assert_eq!(TokenKind::from_keyword("Default"), None);
        assert!(!TokenKind::Identifier("ua".into()).is_keyword());
    }
}
