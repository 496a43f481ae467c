//! Built-in functions: `len`, `md5`, `count`, `atoi` and `itoa`.

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::value::Value;
use hfilter_types::ast::{Factor, FactorKind, Func, FuncKind};
use hfilter_types::Span;
use md5::{Digest, Md5};

impl Evaluator<'_> {
    /// Evaluate a builtin call located at `span`.
    pub fn call(&self, func: &Func, span: Span) -> EvalResult<Value> {
        match func.kind {
            FuncKind::Len => {
                let text = self.string_arg(func.kind, self.first_arg(func, span)?)?;
                Ok(Value::Double(text.chars().count() as f64))
            }
            FuncKind::Md5 => self.md5(func, span),
            FuncKind::Count => Ok(Value::Double(self.symbols().len() as f64)),
            FuncKind::Atoi => {
                let arg = self.first_arg(func, span)?;
                let text = self.string_arg(func.kind, arg)?;
                match parse_double(&text) {
                    Some(n) => Ok(Value::Double(n)),
                    None => Err(EvalError::ParseValue {
                        text,
                        span: arg.span,
                    }),
                }
            }
            FuncKind::Itoa => self.itoa(func, span),
        }
    }

    fn md5(&self, func: &Func, span: Span) -> EvalResult<Value> {
        if func.args.is_empty() {
            return Err(missing_argument(func.kind, span));
        }
        let mut hasher = Md5::new();
        for arg in &func.args {
            hasher.update(self.string_arg(func.kind, arg)?.as_bytes());
        }
        Ok(Value::String(format!("{:x}", hasher.finalize())))
    }

    /// A literal prints with six decimals, a looked-up or computed value
    /// with two.
    fn itoa(&self, func: &Func, span: Span) -> EvalResult<Value> {
        let arg = self.first_arg(func, span)?;
        if let FactorKind::Double(n) = arg.kind {
            return Ok(Value::String(format!("{n:.6}")));
        }
        match self.resolve(arg)? {
            Value::Double(n) => Ok(Value::String(format!("{n:.2}"))),
            other => Err(type_mismatch(func.kind, "double", other.kind_name(), arg.span)),
        }
    }

    // ── Arguments ─────────────────────────────────────────────────────────

    fn first_arg<'f>(&self, func: &'f Func, span: Span) -> EvalResult<&'f Factor> {
        func.args
            .first()
            .ok_or_else(|| missing_argument(func.kind, span))
    }

    fn string_arg(&self, kind: FuncKind, arg: &Factor) -> EvalResult<String> {
        match self.resolve(arg)? {
            Value::String(s) => Ok(s),
            other => Err(type_mismatch(kind, "string", other.kind_name(), arg.span)),
        }
    }
}

/// Numbers too large for an `f64` are rejected rather than read as
/// infinity. `inf` and `infinity` spelled out are still accepted.
fn parse_double(text: &str) -> Option<f64> {
    let n = text.parse::<f64>().ok()?;
    let spelled = text
        .trim_start_matches(|c| c == '+' || c == '-')
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("inf"));
    (n.is_finite() || spelled).then_some(n)
}

fn missing_argument(kind: FuncKind, span: Span) -> EvalError {
    EvalError::MissingArgument {
        function: kind.name(),
        span,
    }
}

fn type_mismatch(
    kind: FuncKind,
    expected: &'static str,
    found: &'static str,
    span: Span,
) -> EvalError {
    EvalError::TypeMismatch {
        context: format!("{}()", kind.name()),
        expected,
        found,
        span,
    }
}
