//! Numeric value helper.
//!
//! Carries both a float and an integer view of a literal so comparators and
//! arithmetic can use whichever side the promoted operation needs. Both
//! fields are always populated.

use basic_ir::{Expr, ExprKind};

/// A numeric literal value with dual views.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Numeric {
    pub is_float: bool,
    pub f: f64,
    pub i: i64,
}

impl Numeric {
    pub(crate) fn from_int(value: i64) -> Self {
        Numeric {
            is_float: false,
            f: value as f64,
            i: value,
        }
    }

    pub(crate) fn from_float(value: f64) -> Self {
        Numeric {
            is_float: true,
            f: value,
            // Saturating conversion; the integer view of a float is only
            // consulted after explicit integer checks.
            i: value as i64,
        }
    }

    /// The float view regardless of flavour.
    #[inline]
    pub(crate) fn as_f64(self) -> f64 {
        if self.is_float {
            self.f
        } else {
            self.i as f64
        }
    }
}

/// Read a numeric literal out of an expression node.
pub(crate) fn as_numeric(expr: &Expr) -> Option<Numeric> {
    match expr.kind {
        ExprKind::Int(value) => Some(Numeric::from_int(value)),
        ExprKind::Float(value) => Some(Numeric::from_float(value)),
        _ => None,
    }
}

/// Promote both operands when either is a float; integers stay 64-bit.
pub(crate) fn promote(a: Numeric, b: Numeric) -> (Numeric, Numeric) {
    if a.is_float || b.is_float {
        (Numeric::from_float(a.as_f64()), Numeric::from_float(b.as_f64()))
    } else {
        (a, b)
    }
}
