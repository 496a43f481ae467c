use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors kept before the rest are only counted.
pub const MAX_ERRORS: usize = 20;

/// Maximum nesting of parentheses and function calls in one rule script.
pub const MAX_NESTING_DEPTH: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// Error category, derived from the code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Regex,
    Structure,
}

/// Numeric compile error code (E100–E699).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNEXPECTED_CHARACTER: Self = Self(102);
    pub const UNKNOWN_FUNCTION: Self = Self(103);
    pub const EMPTY_RULE: Self = Self(104);
    pub const INVALID_NUMBER: Self = Self(105);

    // ── Regex errors (E200–E299) ──
    pub const INVALID_REGEX: Self = Self(200);
    pub const REGEX_NOT_LITERAL: Self = Self(201);

    // ── Structure errors (E600–E699) ──
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(600);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Regex,
            600..=699 => ErrorCategory::Structure,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Regex => write!(f, "regex"),
            Self::Structure => write!(f, "structure"),
        }
    }
}

/// A structured error raised while compiling a rule script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterError {
    /// Name the script was compiled under.
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The source line the span starts on.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl FilterError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for FilterError {}

/// Every error collected while compiling one script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<FilterError>,
    pub total_errors: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Whether the cap has been reached and scanning should stop.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Record an error; only the first [`MAX_ERRORS`] are stored.
    pub fn push_error(&mut self, error: FilterError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn first(&self) -> Option<&FilterError> {
        self.errors.first()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no errors"),
            [only] if self.total_errors == 1 => write!(f, "{only}"),
            [first, ..] => write!(f, "{first} (and {} more)", self.total_errors - 1),
        }
    }
}

impl std::error::Error for CompileErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: ErrorCode) -> FilterError {
        FilterError::new("rule", code, "boom", Span::new(1, 4, 1, 6), "a = 1")
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::EMPTY_RULE.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::INVALID_REGEX.category(), ErrorCategory::Regex);
        assert_eq!(
            ErrorCode::NESTING_LIMIT_EXCEEDED.category(),
            ErrorCategory::Structure
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::INVALID_REGEX.to_string(), "E200");
        assert_eq!(
            sample(ErrorCode::UNEXPECTED_CHARACTER).to_string(),
            "rule:1:4: E102 [syntax] boom"
        );
    }

    #[test]
    fn test_json_shape() {
        let err = sample(ErrorCode::UNKNOWN_FUNCTION).with_suggestion("use len()");
        let json: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 103);
        assert_eq!(json["category"], "syntax");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["line"], 1);
        assert_eq!(json["column"], 4);
        assert_eq!(json["suggestion"], "use len()");

        let plain = serde_json::to_value(sample(ErrorCode::EMPTY_RULE)).unwrap();
        assert!(plain.get("suggestion").is_none());
    }

    #[test]
    fn test_cap_keeps_counting() {
        let mut errs = CompileErrors::empty();
        for _ in 0..MAX_ERRORS + 5 {
            errs.push_error(sample(ErrorCode::UNEXPECTED_TOKEN));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, MAX_ERRORS + 5);
        assert!(errs.is_full());
        assert_eq!(
            errs.to_string(),
            format!("rule:1:4: E100 [syntax] boom (and {} more)", MAX_ERRORS + 4)
        );
    }
}
