//! String folds.
//!
//! Unit choice, pinned by the golden tests: `LEN` counts bytes of the
//! decoded payload; `MID$`/`LEFT$`/`RIGHT$` count code points. Indices are
//! 1-based; negative counts and out-of-range starts yield `""`; counts
//! clamp to the available length.

use basic_ir::{Expr, ExprKind};

use crate::numeric::as_numeric;

fn literal_str(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Str(value) => Some(value),
        _ => None,
    }
}

/// An integer literal index; float literals are refused.
fn literal_index(expr: &Expr) -> Option<i64> {
    let numeric = as_numeric(expr)?;
    if numeric.is_float {
        return None;
    }
    Some(numeric.i)
}

fn clamp_count(count: i64, limit: usize) -> usize {
    if count <= 0 {
        return 0;
    }
    usize::try_from(count).map_or(limit, |c| c.min(limit))
}

pub(crate) fn fold_concat(lhs: &Expr, rhs: &Expr) -> Option<ExprKind> {
    let (l, r) = (literal_str(lhs)?, literal_str(rhs)?);
    let mut out = String::with_capacity(l.len() + r.len());
    out.push_str(l);
    out.push_str(r);
    Some(ExprKind::Str(out))
}

/// `=` / `<>` on string literals materialize integer 0/1. Ordered string
/// comparisons are never folded.
pub(crate) fn fold_str_eq(lhs: &Expr, rhs: &Expr, negate: bool) -> Option<ExprKind> {
    let equal = literal_str(lhs)? == literal_str(rhs)?;
    Some(ExprKind::Int(i64::from(equal != negate)))
}

/// `LEN` of a literal string: decoded byte count.
pub(crate) fn fold_len(arg: &Expr) -> Option<ExprKind> {
    let value = literal_str(arg)?;
    Some(ExprKind::Int(i64::try_from(value.len()).unwrap_or(i64::MAX)))
}

/// `MID$(s, start, count)` over code points.
pub(crate) fn fold_mid(source: &Expr, start: &Expr, count: &Expr) -> Option<ExprKind> {
    let value = literal_str(source)?;
    let start = literal_index(start)?;
    let count = literal_index(count)?;

    let total = value.chars().count();
    if count <= 0 || total == 0 {
        return Some(ExprKind::Str(String::new()));
    }
    let one_based = start.max(1);
    if one_based > i64::try_from(total).unwrap_or(i64::MAX) {
        return Some(ExprKind::Str(String::new()));
    }
    let skip = (one_based - 1) as usize;
    let available = total - skip;
    let take = clamp_count(count, available);
    Some(ExprKind::Str(value.chars().skip(skip).take(take).collect()))
}

/// `LEFT$(s, count)` over code points.
pub(crate) fn fold_left(source: &Expr, count: &Expr) -> Option<ExprKind> {
    let value = literal_str(source)?;
    let count = literal_index(count)?;
    if count <= 0 || value.is_empty() {
        return Some(ExprKind::Str(String::new()));
    }
    let total = value.chars().count();
    let take = clamp_count(count, total);
    Some(ExprKind::Str(value.chars().take(take).collect()))
}

/// `RIGHT$(s, count)` over code points.
pub(crate) fn fold_right(source: &Expr, count: &Expr) -> Option<ExprKind> {
    let value = literal_str(source)?;
    let count = literal_index(count)?;
    if count <= 0 || value.is_empty() {
        return Some(ExprKind::Str(String::new()));
    }
    let total = value.chars().count();
    let take = clamp_count(count, total);
    Some(ExprKind::Str(value.chars().skip(total - take).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use basic_ir::Span;
    use pretty_assertions::assert_eq;

    fn s(value: &str) -> Expr {
        Expr::string(value, Span::DUMMY)
    }

    fn i(value: i64) -> Expr {
        Expr::int(value, Span::DUMMY)
    }

    #[test]
    fn test_concat() {
        assert_eq!(
            fold_concat(&s("foo"), &s("bar")),
            Some(ExprKind::Str("foobar".to_string()))
        );
    }

    #[test]
    fn test_equality_materializes_int() {
        assert_eq!(fold_str_eq(&s("a"), &s("b"), false), Some(ExprKind::Int(0)));
        assert_eq!(fold_str_eq(&s("a"), &s("b"), true), Some(ExprKind::Int(1)));
        assert_eq!(fold_str_eq(&s("a"), &s("a"), false), Some(ExprKind::Int(1)));
    }

    #[test]
    fn test_len_counts_bytes() {
        assert_eq!(fold_len(&s("abc")), Some(ExprKind::Int(3)));
        assert_eq!(fold_len(&s("\n")), Some(ExprKind::Int(1)));
        // Two code points, three bytes.
        assert_eq!(fold_len(&s("ß!")), Some(ExprKind::Int(3)));
    }

    #[test]
    fn test_mid_clamps_and_counts_code_points() {
        assert_eq!(
            fold_mid(&s("AßC"), &i(0), &i(5)),
            Some(ExprKind::Str("AßC".to_string()))
        );
        assert_eq!(
            fold_mid(&s("xyz"), &i(10), &i(2)),
            Some(ExprKind::Str(String::new()))
        );
        assert_eq!(
            fold_mid(&s("AßC"), &i(2), &i(1)),
            Some(ExprKind::Str("ß".to_string()))
        );
    }

    #[test]
    fn test_left_edge_cases() {
        assert_eq!(
            fold_left(&s("abc"), &i(-1)),
            Some(ExprKind::Str(String::new()))
        );
        assert_eq!(fold_left(&s(""), &i(5)), Some(ExprKind::Str(String::new())));
        assert_eq!(
            fold_left(&s("abc"), &i(2)),
            Some(ExprKind::Str("ab".to_string()))
        );
    }

    #[test]
    fn test_right_with_multibyte_prefix() {
        assert_eq!(
            fold_right(&s("ñab"), &i(2)),
            Some(ExprKind::Str("ab".to_string()))
        );
        assert_eq!(
            fold_right(&s("abc"), &i(9)),
            Some(ExprKind::Str("abc".to_string()))
        );
    }

    #[test]
    fn test_float_indices_refuse_fold() {
        assert_eq!(fold_left(&s("abc"), &Expr::float(1.0, Span::DUMMY)), None);
    }
}
