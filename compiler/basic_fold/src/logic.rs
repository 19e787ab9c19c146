//! Logical folds, including short-circuit handling.

use basic_ir::{BinaryOp, Expr, ExprKind};

use crate::numeric::as_numeric;

/// Truth value of a literal in logical context. Booleans are themselves;
/// integers coerce (zero false, anything else true); floats and strings
/// are refused.
fn literal_truth(expr: &Expr) -> Option<bool> {
    match expr.kind {
        ExprKind::Bool(value) => Some(value),
        ExprKind::Int(value) => Some(value != 0),
        _ => None,
    }
}

/// Fold logical NOT. A boolean literal inverts; an integer literal yields
/// the integer 1/0 the runtime would produce; floats are refused.
pub(crate) fn fold_logical_not(operand: &Expr) -> Option<ExprKind> {
    if let ExprKind::Bool(value) = operand.kind {
        return Some(ExprKind::Bool(!value));
    }
    let numeric = as_numeric(operand)?;
    if numeric.is_float {
        return None;
    }
    Some(ExprKind::Int(i64::from(numeric.i == 0)))
}

/// Early exit for short-circuit operators: a false left side decides
/// `ANDALSO`, a true left side decides `ORELSE`. Everything else needs the
/// right-hand side.
pub(crate) fn try_short_circuit(op: BinaryOp, lhs: bool) -> Option<bool> {
    match op {
        BinaryOp::AndAlso if !lhs => Some(false),
        BinaryOp::OrElse if lhs => Some(true),
        _ => None,
    }
}

/// Fold a logical connective over two literals, coercing integer literals
/// to booleans. The result is always a boolean literal.
pub(crate) fn fold_logical_binary(lhs: &Expr, op: BinaryOp, rhs: &Expr) -> Option<ExprKind> {
    if !op.is_logical() {
        return None;
    }
    let lhs = literal_truth(lhs)?;
    let rhs = literal_truth(rhs)?;
    let value = match op {
        BinaryOp::And | BinaryOp::AndAlso => lhs && rhs,
        BinaryOp::Or | BinaryOp::OrElse => lhs || rhs,
        _ => return None,
    };
    Some(ExprKind::Bool(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use basic_ir::Span;

    fn bool_lit(value: bool) -> Expr {
        Expr::bool(value, Span::DUMMY)
    }

    fn int_lit(value: i64) -> Expr {
        Expr::int(value, Span::DUMMY)
    }

    #[test]
    fn test_not_on_bool_and_int() {
        assert_eq!(fold_logical_not(&bool_lit(true)), Some(ExprKind::Bool(false)));
        assert_eq!(fold_logical_not(&int_lit(0)), Some(ExprKind::Int(1)));
        assert_eq!(fold_logical_not(&int_lit(7)), Some(ExprKind::Int(0)));
        assert_eq!(fold_logical_not(&Expr::float(1.5, Span::DUMMY)), None);
    }

    #[test]
    fn test_short_circuit_decisions() {
        assert_eq!(try_short_circuit(BinaryOp::AndAlso, false), Some(false));
        assert_eq!(try_short_circuit(BinaryOp::AndAlso, true), None);
        assert_eq!(try_short_circuit(BinaryOp::OrElse, true), Some(true));
        assert_eq!(try_short_circuit(BinaryOp::OrElse, false), None);
        assert_eq!(try_short_circuit(BinaryOp::And, false), None);
    }

    #[test]
    fn test_integer_operands_coerce_to_bool() {
        let folded = fold_logical_binary(&int_lit(0), BinaryOp::Or, &int_lit(1));
        assert_eq!(folded, Some(ExprKind::Bool(true)));
        let folded = fold_logical_binary(&bool_lit(false), BinaryOp::OrElse, &int_lit(1));
        assert_eq!(folded, Some(ExprKind::Bool(true)));
    }

    #[test]
    fn test_strings_are_refused() {
        let s = Expr::string("x", Span::DUMMY);
        assert_eq!(fold_logical_binary(&s, BinaryOp::And, &int_lit(1)), None);
    }
}
