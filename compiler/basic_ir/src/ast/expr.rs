//! Expression nodes.

use smallvec::SmallVec;

use super::operators::BinaryOp;
use crate::{Builtin, Span};

/// Unary operator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    LogicalNot,
    Plus,
    Negate,
}

/// Expression node: a kind plus the source span it was parsed from.
///
/// Rewriters that replace a node propagate the original span so diagnostics
/// keep pointing at what the user wrote.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Integer literal.
    pub fn int(value: i64, span: Span) -> Self {
        Expr::new(ExprKind::Int(value), span)
    }

    /// Float literal.
    pub fn float(value: f64, span: Span) -> Self {
        Expr::new(ExprKind::Float(value), span)
    }

    /// String literal (escapes already decoded).
    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Expr::new(ExprKind::Str(value.into()), span)
    }

    /// Boolean literal.
    pub fn bool(value: bool, span: Span) -> Self {
        Expr::new(ExprKind::Bool(value), span)
    }

    /// Whether this node is one of the four literal kinds.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Int(_) | ExprKind::Float(_) | ExprKind::Str(_) | ExprKind::Bool(_)
        )
    }
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Integer literal: `42`
    Int(i64),

    /// Float literal: `2.5`, `1!`, `3#`
    Float(f64),

    /// String literal with escape sequences already resolved.
    Str(String),

    /// Boolean literal: `TRUE`, `FALSE`
    Bool(bool),

    /// Variable reference; the name includes the sigil when present (`A$`).
    Var(String),

    /// Subscripted array access: `ARR(I)`, `GRID(I, J)`
    Array {
        name: String,
        indices: SmallVec<[Box<Expr>; 2]>,
    },

    /// Unary operation: `NOT X`, `-X`, `+X`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation: `lhs op rhs`
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Call to an enumerated builtin: `LEN(S$)`, `MID$(S$, 1, 2)`
    Builtin { builtin: Builtin, args: Vec<Expr> },

    /// Call to a user-defined procedure. `qualified` carries the dotted
    /// path when the callee was written as `A.B.F(...)`; otherwise it is
    /// empty and `callee` holds the short name.
    Call {
        callee: String,
        qualified: Vec<String>,
        args: Vec<Expr>,
    },

    /// `LBOUND(name)`
    LBound(String),

    /// `UBOUND(name)`
    UBound(String),

    /// Object construction: `NEW Point(1, 2)`, `NEW Geo.Point(...)`
    New {
        class_name: String,
        qualified: Vec<String>,
        args: Vec<Expr>,
    },

    /// Receiver reference inside type members: `ME`
    Me,

    /// Member access: `base.member`
    Member { base: Box<Expr>, member: String },

    /// Method invocation: `base.method(args...)`
    MethodCall {
        base: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    /// Runtime type test: `value IS A.B.T`
    Is {
        value: Box<Expr>,
        type_name: Vec<String>,
    },

    /// Checked cast: `value AS A.B.T`
    As {
        value: Box<Expr>,
        type_name: Vec<String>,
    },

    /// Address of a named procedure: `ADDRESSOF Handler`
    AddressOf(String),
}
