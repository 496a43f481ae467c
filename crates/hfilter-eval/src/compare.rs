//! Value comparison for the six ordering operators.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use hfilter_types::ast::Operator;
use hfilter_types::Span;

/// Two doubles closer than this are equal.
pub const DOUBLE_TOLERANCE: f64 = 0.001;

/// Compare two resolved operands, returning 1 for true and 0 for false.
///
/// Operands of different kinds compare false under every operator. Doubles
/// use [`DOUBLE_TOLERANCE`] for equality; strings compare byte-wise.
/// Note the gap at exactly the tolerance: `EQ` and `NE` are then both false.
pub fn compare(op: Operator, left: &Value, right: &Value, span: Span) -> EvalResult<i32> {
    let result = match (left, right) {
        (Value::Double(a), Value::Double(b)) => compare_doubles(op, *a, *b),
        (Value::String(a), Value::String(b)) => compare_strings(op, a, b),
        _ => {
            if !op.is_comparison() {
                return Err(EvalError::UnsupportedOperator { op, span });
            }
            return Ok(0);
        }
    };
    result
        .map(i32::from)
        .ok_or(EvalError::UnsupportedOperator { op, span })
}

fn compare_doubles(op: Operator, a: f64, b: f64) -> Option<bool> {
    let close = (a - b).abs() < DOUBLE_TOLERANCE;
    Some(match op {
        Operator::Gt => a > b,
        Operator::Lt => a < b,
        Operator::Eq => close,
        Operator::Ne => (a - b).abs() > DOUBLE_TOLERANCE,
        Operator::Ge => a > b || close,
        Operator::Le => a < b || close,
        _ => return None,
    })
}

fn compare_strings(op: Operator, a: &str, b: &str) -> Option<bool> {
    Some(match op {
        Operator::Gt => a > b,
        Operator::Lt => a < b,
        Operator::Eq => a == b,
        Operator::Ne => a != b,
        Operator::Ge => a >= b,
        Operator::Le => a <= b,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(op: Operator, left: impl Into<Value>, right: impl Into<Value>) -> i32 {
        compare(op, &left.into(), &right.into(), Span::point(1, 1)).unwrap()
    }

    #[test]
    fn test_double_tolerance() {
        assert_eq!(cmp(Operator::Eq, 1.0, 1.0009), 1);
        assert_eq!(cmp(Operator::Eq, 1.0, 1.002), 0);
        assert_eq!(cmp(Operator::Ne, 1.0, 1.0009), 0);
        assert_eq!(cmp(Operator::Ne, 1.0, 1.002), 1);
        assert_eq!(cmp(Operator::Ge, 1.0, 1.0005), 1);
        assert_eq!(cmp(Operator::Le, 1.0005, 1.0), 1);
        assert_eq!(cmp(Operator::Gt, 1.0005, 1.0), 1);
        assert_eq!(cmp(Operator::Lt, 1.0, 1.0), 0);
    }

    #[test]
    fn test_difference_of_exactly_the_tolerance() {
        assert_eq!(0.001_f64 - 0.0, DOUBLE_TOLERANCE);
        assert_eq!(cmp(Operator::Eq, 0.001, 0.0), 0);
        assert_eq!(cmp(Operator::Ne, 0.001, 0.0), 0);
        assert_eq!(cmp(Operator::Eq, 0.0, 0.001), 0);
        assert_eq!(cmp(Operator::Ne, 0.0, 0.001), 0);
        assert_eq!(cmp(Operator::Ge, 0.001, 0.0), 1);
        assert_eq!(cmp(Operator::Le, 0.001, 0.0), 0);
        assert_eq!(cmp(Operator::Ge, 0.0, 0.001), 0);
        assert_eq!(cmp(Operator::Le, 0.0, 0.001), 1);
    }

    #[test]
    fn test_strings_are_lexicographic() {
        assert_eq!(cmp(Operator::Lt, "abc", "abd"), 1);
        assert_eq!(cmp(Operator::Gt, "b", "abc"), 1);
        assert_eq!(cmp(Operator::Ge, "x", "x"), 1);
        assert_eq!(cmp(Operator::Le, "Z", "a"), 1);
        assert_eq!(cmp(Operator::Eq, "sh", "sh"), 1);
        assert_eq!(cmp(Operator::Ne, "sh", "SH"), 1);
    }

    #[test]
    fn test_mismatched_kinds_are_false() {
        for op in [
            Operator::Gt,
            Operator::Lt,
            Operator::Eq,
            Operator::Ne,
            Operator::Ge,
            Operator::Le,
        ] {
            assert_eq!(cmp(op, 1.0, "1"), 0, "{op}");
            assert_eq!(cmp(op, "1", 1.0), 0, "{op}");
        }
    }

    #[test]
    fn test_non_comparison_operator() {
        let err = compare(
            Operator::Match,
            &Value::Double(1.0),
            &Value::Double(1.0),
            Span::point(2, 3),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "2:3: operator '#' not supported");
    }
}
