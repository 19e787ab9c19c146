//! Arithmetic, comparison, and unary folds.
//!
//! Integer arithmetic uses two's-complement wrap-around modulo 2^64.
//! "Abort" results (`None`) leave the original node untouched so the
//! runtime traps exactly as BASIC requires.

use basic_ir::{BinaryOp, UnaryOp};

use crate::numeric::{promote, Numeric};

/// Fold addition.
///
/// Integers wrap, with one guard: when both operands fit in i16 and the
/// wrapped sum does not, folding is refused so the runtime's 16-bit
/// overflow check still fires.
pub(crate) fn fold_add(lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    let (lhs, rhs) = promote(lhs, rhs);
    if !lhs.is_float {
        let fits_i16 = |v: i64| (i64::from(i16::MIN)..=i64::from(i16::MAX)).contains(&v);
        let sum = lhs.i.wrapping_add(rhs.i);
        if fits_i16(lhs.i) && fits_i16(rhs.i) && !fits_i16(sum) {
            return None;
        }
        return Some(Numeric::from_int(sum));
    }
    Some(Numeric::from_float(lhs.f + rhs.f))
}

pub(crate) fn fold_sub(lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    let (lhs, rhs) = promote(lhs, rhs);
    if !lhs.is_float {
        return Some(Numeric::from_int(lhs.i.wrapping_sub(rhs.i)));
    }
    Some(Numeric::from_float(lhs.f - rhs.f))
}

pub(crate) fn fold_mul(lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    let (lhs, rhs) = promote(lhs, rhs);
    if !lhs.is_float {
        return Some(Numeric::from_int(lhs.i.wrapping_mul(rhs.i)));
    }
    Some(Numeric::from_float(lhs.f * rhs.f))
}

/// Fold `/`. Division always produces a float; a zero divisor aborts the
/// fold so the runtime raises the division error.
pub(crate) fn fold_div(lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    let rv = rhs.as_f64();
    if rv == 0.0 {
        return None;
    }
    Some(Numeric::from_float(lhs.as_f64() / rv))
}

/// Fold `\`. Requires integer operands and a non-zero divisor.
pub(crate) fn fold_idiv(lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    if lhs.is_float || rhs.is_float || rhs.i == 0 {
        return None;
    }
    Some(Numeric::from_int(lhs.i.wrapping_div(rhs.i)))
}

/// Fold `MOD`. Requires integer operands and a non-zero divisor.
pub(crate) fn fold_mod(lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    if lhs.is_float || rhs.is_float || rhs.i == 0 {
        return None;
    }
    Some(Numeric::from_int(lhs.i.wrapping_rem(rhs.i)))
}

/// Fold one of the six arithmetic operators; `^` is never folded.
pub(crate) fn fold_binary_arith(op: BinaryOp, lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    match op {
        BinaryOp::Add => fold_add(lhs, rhs),
        BinaryOp::Sub => fold_sub(lhs, rhs),
        BinaryOp::Mul => fold_mul(lhs, rhs),
        BinaryOp::Div => fold_div(lhs, rhs),
        BinaryOp::IDiv => fold_idiv(lhs, rhs),
        BinaryOp::Mod => fold_mod(lhs, rhs),
        _ => None,
    }
}

fn compare_int(op: BinaryOp, lhs: i64, rhs: i64) -> bool {
    match op {
        BinaryOp::Eq => lhs == rhs,
        BinaryOp::Ne => lhs != rhs,
        BinaryOp::Lt => lhs < rhs,
        BinaryOp::Le => lhs <= rhs,
        BinaryOp::Gt => lhs > rhs,
        BinaryOp::Ge => lhs >= rhs,
        _ => false,
    }
}

/// IEEE semantics: NaN is unordered, so every comparison with NaN is
/// false except `<>`.
fn compare_float(op: BinaryOp, lhs: f64, rhs: f64) -> bool {
    match op {
        BinaryOp::Eq => lhs == rhs,
        BinaryOp::Ne => lhs != rhs,
        BinaryOp::Lt => lhs < rhs,
        BinaryOp::Le => lhs <= rhs,
        BinaryOp::Gt => lhs > rhs,
        BinaryOp::Ge => lhs >= rhs,
        _ => false,
    }
}

/// Fold a comparison, materializing integer 0/1.
pub(crate) fn fold_compare(op: BinaryOp, lhs: Numeric, rhs: Numeric) -> Option<Numeric> {
    if !op.is_comparison() {
        return None;
    }
    let (lhs, rhs) = promote(lhs, rhs);
    let result = if lhs.is_float {
        compare_float(op, lhs.f, rhs.f)
    } else {
        compare_int(op, lhs.i, rhs.i)
    };
    Some(Numeric::from_int(i64::from(result)))
}

/// Fold unary `+` (identity) and `-` (wrap-subtract from zero for
/// integers, IEEE negate for floats).
pub(crate) fn fold_unary_arith(op: UnaryOp, value: Numeric) -> Option<Numeric> {
    match op {
        UnaryOp::Plus => Some(value),
        UnaryOp::Negate => {
            if value.is_float {
                Some(Numeric::from_float(-value.f))
            } else {
                Some(Numeric::from_int(0i64.wrapping_sub(value.i)))
            }
        }
        UnaryOp::LogicalNot => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_wraps_at_64_bits() {
        let folded = fold_add(Numeric::from_int(i64::MAX), Numeric::from_int(i64::MAX));
        assert_eq!(folded.map(|n| n.i), Some(i64::MAX.wrapping_mul(2)));
    }

    #[test]
    fn test_add_refuses_i16_overflow() {
        assert!(fold_add(Numeric::from_int(32767), Numeric::from_int(1)).is_none());
        assert!(fold_add(Numeric::from_int(-32768), Numeric::from_int(-1)).is_none());
        // Out-of-i16 operands wrap freely.
        assert!(fold_add(Numeric::from_int(40000), Numeric::from_int(1)).is_some());
    }

    #[test]
    fn test_div_always_floats_and_guards_zero() {
        let folded = fold_div(Numeric::from_int(10), Numeric::from_int(4));
        assert_eq!(folded.map(|n| (n.is_float, n.f)), Some((true, 2.5)));
        assert!(fold_div(Numeric::from_int(10), Numeric::from_int(0)).is_none());
        assert!(fold_div(Numeric::from_int(10), Numeric::from_float(0.0)).is_none());
    }

    #[test]
    fn test_idiv_and_mod_require_integers() {
        assert!(fold_idiv(Numeric::from_float(10.0), Numeric::from_int(2)).is_none());
        assert!(fold_idiv(Numeric::from_int(10), Numeric::from_int(0)).is_none());
        assert_eq!(
            fold_mod(Numeric::from_int(7), Numeric::from_int(3)).map(|n| n.i),
            Some(1)
        );
        assert!(fold_mod(Numeric::from_int(7), Numeric::from_int(0)).is_none());
    }

    #[test]
    fn test_nan_comparisons_are_unordered() {
        let nan = Numeric::from_float(f64::NAN);
        let one = Numeric::from_int(1);
        assert_eq!(fold_compare(BinaryOp::Eq, nan, one).map(|n| n.i), Some(0));
        assert_eq!(fold_compare(BinaryOp::Lt, nan, one).map(|n| n.i), Some(0));
        assert_eq!(fold_compare(BinaryOp::Ge, nan, one).map(|n| n.i), Some(0));
        assert_eq!(fold_compare(BinaryOp::Ne, nan, one).map(|n| n.i), Some(1));
    }

    #[test]
    fn test_negate_wraps_min() {
        let folded = fold_unary_arith(UnaryOp::Negate, Numeric::from_int(i64::MIN));
        assert_eq!(folded.map(|n| n.i), Some(i64::MIN));
    }
}
