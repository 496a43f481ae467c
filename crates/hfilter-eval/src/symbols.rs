//! Per-request symbol tables.
//!
//! A [`SymbolTable`] is an ordered list of name/value bindings. The first
//! binding of a name wins; later appends of the same name are ignored.

use crate::error::{EvalError, EvalResult, SymbolTableError};
use crate::value::Value;
use hfilter_types::Span;
use std::fmt;

/// One name/value binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub value: Value,
}

/// Ordered set of bindings supplied to one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding at the tail unless `name` is already bound.
    ///
    /// Returns `true` if the binding was added.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.symbols.push(Symbol {
            name,
            value: value.into(),
        });
        true
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.symbols
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.value)
    }

    /// Look up `name`, reporting a missing binding at `span`.
    pub fn lookup(&self, name: &str, span: Span) -> EvalResult<&Value> {
        self.get(name).ok_or_else(|| EvalError::SymbolNotFound {
            name: name.to_string(),
            span,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    // ── Producers ─────────────────────────────────────────────────────────

    /// Build a table from `k1=v1&k2=v2...`. Every value is a string.
    ///
    /// A key runs up to the next `=`; its value runs from there to the next
    /// `&` or the end of input. Trailing text without `=` is dropped.
    /// Nothing is percent-decoded.
    pub fn from_query(query: &str) -> Self {
        let mut table = Self::new();
        let mut rest = query;
        while let Some(eq) = rest.find('=') {
            let key = &rest[..eq];
            let tail = &rest[eq + 1..];
            match tail.find('&') {
                Some(amp) => {
                    table.append(key, &tail[..amp]);
                    rest = &tail[amp + 1..];
                }
                None => {
                    table.append(key, tail);
                    break;
                }
            }
        }
        table
    }

    /// Build a table from a JSON object.
    ///
    /// Numbers become doubles and strings stay strings; any other field is
    /// skipped. Fields are taken in `serde_json::Map` order.
    pub fn from_json(json: &str) -> Result<Self, SymbolTableError> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(&root)
    }

    pub fn from_json_value(root: &serde_json::Value) -> Result<Self, SymbolTableError> {
        let object = match root {
            serde_json::Value::Object(map) => map,
            other => return Err(SymbolTableError::NotAnObject(json_kind(other))),
        };

        let mut table = Self::new();
        for (key, value) in object {
            match value {
                serde_json::Value::Number(n) => {
                    if let Some(n) = n.as_f64() {
                        table.append(key.as_str(), n);
                    }
                }
                serde_json::Value::String(s) => {
                    table.append(key.as_str(), s.as_str());
                }
                _ => {}
            }
        }
        Ok(table)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, value) in iter {
            table.append(name, value);
        }
        table
    }
}

/// Tabular dump for diagnostics.
impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NAME\tVALUE\tTYPE")?;
        writeln!(f, "======================")?;
        for symbol in &self.symbols {
            let kind = match symbol.value {
                Value::Double(_) => "DOUBLE",
                Value::String(_) => "STRING",
            };
            writeln!(f, "{}\t{}\t{kind}", symbol.name, symbol.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_binding_wins() {
        let mut table = SymbolTable::new();
        assert!(table.append("a", 1.0));
        assert!(!table.append("a", "shadow"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a"), Some(&Value::Double(1.0)));
    }

    #[test]
    fn test_lookup_missing() {
        let table = SymbolTable::new();
        let err = table.lookup("uid", Span::point(1, 1)).unwrap_err();
        assert_eq!(err.to_string(), "1:1: symbol 'uid' not found");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let table: SymbolTable = [("Uid", "a"), ("uid", "b")].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("uid"), Some(&Value::from("b")));
    }

    #[test]
    fn test_query_pairs() {
        let table = SymbolTable::from_query("nmq=testmq&mac=xx:yy&bootid=&nmq=again");
        let pairs: Vec<_> = table
            .iter()
            .map(|s| (s.name.as_str(), s.value.as_str().unwrap_or("")))
            .collect();
        assert_eq!(pairs, vec![("nmq", "testmq"), ("mac", "xx:yy"), ("bootid", "")]);
    }

    #[test]
    fn test_query_edge_cases() {
        assert!(SymbolTable::from_query("").is_empty());
        assert!(SymbolTable::from_query("novalue").is_empty());

        let table = SymbolTable::from_query("a=1&dangling");
        assert_eq!(table.len(), 1);

        // The key is everything before the first '='.
        let table = SymbolTable::from_query("a&b=1");
        assert_eq!(table.get("a&b"), Some(&Value::from("1")));

        let table = SymbolTable::from_query("q=a%20b=c");
        assert_eq!(table.get("q"), Some(&Value::from("a%20b=c")));
    }

    #[test]
    fn test_json_fields() {
        let table =
            SymbolTable::from_json(r#"{"uid": 42, "name": "kim", "vip": true, "tags": [1]}"#)
                .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("uid"), Some(&Value::Double(42.0)));
        assert_eq!(table.get("name"), Some(&Value::from("kim")));
        assert_eq!(table.get("vip"), None);
    }

    #[test]
    fn test_json_rejects_non_objects() {
        assert!(matches!(
            SymbolTable::from_json("[1, 2]"),
            Err(SymbolTableError::NotAnObject("an array"))
        ));
        assert!(matches!(
            SymbolTable::from_json("{broken"),
            Err(SymbolTableError::Json(_))
        ));
    }

    #[test]
    fn test_dump_format() {
        let table: SymbolTable = [("uid", Value::Double(7.0)), ("city", Value::from("sh"))]
            .into_iter()
            .collect();
        assert_eq!(
            table.to_string(),
            "NAME\tVALUE\tTYPE\n======================\nuid\t7.00\tDOUBLE\ncity\t'sh'\tSTRING\n"
        );
    }
}
