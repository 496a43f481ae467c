//! AST node types for hfilter rule scripts.
//!
//! A script is a chain of clauses ([`Grammar`]); each guard is an [`Expr`]
//! tree whose leaves are [`Term`] predicates over [`Factor`] values.
//! Nodes are immutable after parsing and carry a [`Span`] for diagnostics.

use crate::Span;
use regex::Regex;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Rule chain
// ══════════════════════════════════════════════════════════════════════════════

/// One clause of a rule script plus the rest of the chain.
///
/// `Clone`, `PartialEq`, `Debug` and `Drop` walk the chain in a loop, so a
/// script with any number of clauses is safe to copy and release.
pub struct Grammar {
    pub clause: Clause,
    pub next: Option<Box<Grammar>>,
    pub span: Span,
}

/// The three clause shapes a script can chain together.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// `expr => RET`
    ExprGet { expr: Expr, ret: i32 },
    /// `default => RET`
    DefaultGet { ret: i32 },
    /// `expr` with no verdict of its own
    BareExpr(Expr),
}

impl Grammar {
    pub fn new(clause: Clause, next: Option<Box<Grammar>>, span: Span) -> Self {
        Self { clause, next, span }
    }

    /// Links `clauses` front to back into a chain. `None` for an empty list.
    pub fn chain(clauses: Vec<(Clause, Span)>) -> Option<Box<Grammar>> {
        clauses
            .into_iter()
            .rev()
            .fold(None, |next, (clause, span)| {
                Some(Box::new(Grammar::new(clause, next, span)))
            })
    }

    /// Iterate the clauses of the chain in source order.
    pub fn clauses(&self) -> impl Iterator<Item = &Grammar> {
        std::iter::successors(Some(self), |g| g.next.as_deref())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// A left-leaning chain of terms joined by `&&` / `||`.
///
/// Like [`Grammar`], the left spine is walked in a loop by every trait impl.
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    And { left: Box<Expr>, right: Term },
    Or { left: Box<Expr>, right: Term },
    Term(Term),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Flattens the left spine into source order.
    fn spine(&self) -> Spine<'_> {
        let mut rest = Vec::new();
        let mut node = self;
        let first = loop {
            match &node.kind {
                ExprKind::And { left, right } => {
                    rest.push((Joiner::And, right, node.span));
                    node = &**left;
                }
                ExprKind::Or { left, right } => {
                    rest.push((Joiner::Or, right, node.span));
                    node = &**left;
                }
                ExprKind::Term(term) => break (term, node.span),
            }
        };
        rest.reverse();
        Spine { first, rest }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joiner {
    And,
    Or,
}

impl Joiner {
    fn symbol(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// An [`Expr`] seen as its first term followed by joined terms.
#[derive(Debug, PartialEq)]
struct Spine<'a> {
    first: (&'a Term, Span),
    rest: Vec<(Joiner, &'a Term, Span)>,
}

/// A single predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TermKind {
    /// `factor @ (list)` / `factor !@ (list)`
    Membership {
        op: Operator,
        factor: Factor,
        list: Vec<Factor>,
    },
    /// `factor OP factor` for the six ordering operators
    Compare {
        op: Operator,
        left: Factor,
        right: Factor,
    },
    /// `factor # 'regex'` / `factor !# 'regex'`
    Match {
        op: Operator,
        factor: Factor,
        pattern: Pattern,
    },
    /// `( expr )`
    Paren(Box<Expr>),
}

impl Term {
    pub fn new(kind: TermKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every infix operator a term can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    In,
    NotIn,
    Gt,
    Lt,
    Eq,
    Ne,
    Ge,
    Le,
    Match,
    NotMatch,
}

impl Operator {
    /// The operator as written in a script.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::In => "@",
            Self::NotIn => "!@",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Match => "#",
            Self::NotMatch => "!#",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Gt | Self::Lt | Self::Eq | Self::Ne | Self::Ge | Self::Le
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A regular expression compiled once, when the term is built.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Unanchored search: true if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Factors
// ══════════════════════════════════════════════════════════════════════════════

/// The smallest typed value unit of the language.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    pub kind: FactorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FactorKind {
    Double(f64),
    String(String),
    /// A symbol-table lookup by name.
    Variable(String),
    Function(Func),
}

impl Factor {
    pub fn new(kind: FactorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Short name of the factor's kind, as used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FactorKind::Double(_) => "double",
            FactorKind::String(_) => "string",
            FactorKind::Variable(_) => "variable",
            FactorKind::Function(_) => "function",
        }
    }
}

/// A built-in function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub kind: FuncKind,
    /// Empty when the call was written `name()`.
    pub args: Vec<Factor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncKind {
    Len,
    Md5,
    Count,
    Atoi,
    Itoa,
}

impl FuncKind {
    pub const ALL: [FuncKind; 5] = [
        FuncKind::Len,
        FuncKind::Md5,
        FuncKind::Count,
        FuncKind::Atoi,
        FuncKind::Itoa,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Len => "len",
            Self::Md5 => "md5",
            Self::Count => "count",
            Self::Atoi => "atoi",
            Self::Itoa => "itoa",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Chain ownership
// ══════════════════════════════════════════════════════════════════════════════

impl Clone for Grammar {
    fn clone(&self) -> Self {
        let rest: Vec<&Grammar> = self.clauses().skip(1).collect();
        let next = rest.into_iter().rev().fold(None, |next, g| {
            Some(Box::new(Grammar::new(g.clause.clone(), next, g.span)))
        });
        Grammar::new(self.clause.clone(), next, self.span)
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.clauses()
            .map(|g| (&g.clause, g.span))
            .eq(other.clauses().map(|g| (&g.clause, g.span)))
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.clauses().map(|g| (&g.clause, g.span)))
            .finish()
    }
}

impl Drop for Grammar {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

impl Clone for Expr {
    fn clone(&self) -> Self {
        let Spine { first, rest } = self.spine();
        let leaf = Expr::new(ExprKind::Term(first.0.clone()), first.1);
        rest.into_iter().fold(leaf, |left, (joiner, right, span)| {
            let left = Box::new(left);
            let right = right.clone();
            let kind = match joiner {
                Joiner::And => ExprKind::And { left, right },
                Joiner::Or => ExprKind::Or { left, right },
            };
            Expr::new(kind, span)
        })
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.spine() == other.spine()
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spine = self.spine();
        f.debug_struct("Expr")
            .field("first", &spine.first)
            .field("rest", &spine.rest)
            .finish()
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        let mut next = take_left(&mut self.kind);
        while let Some(mut node) = next {
            next = take_left(&mut node.kind);
        }
    }
}

/// Detaches the left operand of an `&&`/`||` node, leaving an inert leaf.
fn take_left(kind: &mut ExprKind) -> Option<Box<Expr>> {
    let inert = Factor::new(FactorKind::Double(0.0), Span::point(1, 1));
    let leaf = Term::new(
        TermKind::Compare {
            op: Operator::Eq,
            left: inert.clone(),
            right: inert,
        },
        Span::point(1, 1),
    );
    match std::mem::replace(kind, ExprKind::Term(leaf)) {
        ExprKind::And { left, .. } | ExprKind::Or { left, .. } => Some(left),
        ExprKind::Term(_) => None,
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Script rendering
// ══════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.clauses().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match &node.clause {
                Clause::ExprGet { expr, ret } => write!(f, "{expr} => {ret}")?,
                Clause::DefaultGet { ret } => write!(f, "default => {ret}")?,
                Clause::BareExpr(expr) => write!(f, "{expr};")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spine = self.spine();
        write!(f, "{}", spine.first.0)?;
        for (joiner, term, _) in &spine.rest {
            write!(f, " {} {term}", joiner.symbol())?;
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TermKind::Membership { op, factor, list } => {
                write!(f, "{factor} {op} (")?;
                write_list(f, list)?;
                f.write_str(")")
            }
            TermKind::Compare { op, left, right } => write!(f, "{left} {op} {right}"),
            TermKind::Match {
                op,
                factor,
                pattern,
            } => write!(f, "{factor} {op} '{}'", pattern.as_str()),
            TermKind::Paren(inner) => write!(f, "({inner})"),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FactorKind::Double(n) => write!(f, "{n}"),
            FactorKind::String(s) => write!(f, "'{s}'"),
            FactorKind::Variable(name) => f.write_str(name),
            FactorKind::Function(func) => {
                write!(f, "{}(", func.kind.name())?;
                write_list(f, &func.args)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &[Factor]) -> fmt::Result {
    for (i, factor) in list.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{factor}")?;
    }
    Ok(())
}
