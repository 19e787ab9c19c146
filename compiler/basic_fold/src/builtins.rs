//! Builtin-call folds.
//!
//! Only builtins whose runtime behaviour is fully determined by literal
//! arguments fold; anything else is left for the lowerer.

use basic_ir::{Builtin, Expr, ExprKind};

use crate::numeric::as_numeric;
use crate::strings;

/// Try to fold a builtin call whose arguments are already folded.
pub(crate) fn fold_builtin(builtin: Builtin, args: &[Expr]) -> Option<ExprKind> {
    match builtin {
        Builtin::Len if args.len() == 1 => strings::fold_len(&args[0]),
        Builtin::Mid if args.len() == 3 => strings::fold_mid(&args[0], &args[1], &args[2]),
        Builtin::Left if args.len() == 2 => strings::fold_left(&args[0], &args[1]),
        Builtin::Right if args.len() == 2 => strings::fold_right(&args[0], &args[1]),
        Builtin::Val if args.len() == 1 => fold_val(&args[0]),
        Builtin::Int if args.len() == 1 => fold_int(&args[0]),
        Builtin::Fix if args.len() == 1 => fold_fix(&args[0]),
        Builtin::Round if !args.is_empty() && args.len() <= 2 => fold_round(args),
        Builtin::Str if args.len() == 1 => fold_str(&args[0]),
        _ => None,
    }
}

/// A finite float view of a numeric literal.
fn finite_double(expr: &Expr) -> Option<f64> {
    let value = as_numeric(expr)?.as_f64();
    value.is_finite().then_some(value)
}

/// `INT(x)` floors toward negative infinity, staying a float.
fn fold_int(arg: &Expr) -> Option<ExprKind> {
    let value = finite_double(arg)?;
    let floored = value.floor();
    floored.is_finite().then(|| ExprKind::Float(floored))
}

/// `FIX(x)` truncates toward zero, staying a float.
fn fold_fix(arg: &Expr) -> Option<ExprKind> {
    let value = finite_double(arg)?;
    let truncated = value.trunc();
    truncated.is_finite().then(|| ExprKind::Float(truncated))
}

/// Digit-count argument of `ROUND`: rounded to nearest even, must fit i32.
fn rounded_digits(expr: &Expr) -> Option<i32> {
    let value = finite_double(expr)?;
    let rounded = value.round_ties_even();
    if !rounded.is_finite()
        || rounded < f64::from(i32::MIN)
        || rounded > f64::from(i32::MAX)
    {
        return None;
    }
    Some(rounded as i32)
}

/// Round to `digits` decimal places (negative digits round to multiples
/// of ten) with banker's rounding. Refuses the fold when any intermediate
/// overflows, rather than folding to a wrong value.
fn round_to_digits(value: f64, digits: i32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    if digits == 0 {
        let rounded = value.round_ties_even();
        return rounded.is_finite().then_some(rounded);
    }
    let scale = 10f64.powi(digits.abs());
    if !scale.is_finite() || scale == 0.0 {
        return None;
    }
    let scaled = if digits > 0 { value * scale } else { value / scale };
    if !scaled.is_finite() {
        return None;
    }
    let rounded = scaled.round_ties_even();
    if !rounded.is_finite() {
        return None;
    }
    let result = if digits > 0 {
        rounded / scale
    } else {
        rounded * scale
    };
    result.is_finite().then_some(result)
}

fn fold_round(args: &[Expr]) -> Option<ExprKind> {
    let value = finite_double(&args[0])?;
    let digits = match args.get(1) {
        Some(arg) => rounded_digits(arg)?,
        None => 0,
    };
    round_to_digits(value, digits).map(ExprKind::Float)
}

/// `VAL("...")` parses a BASIC-style numeric prefix: optional sign,
/// digits, fraction, exponent. Empty or invalid input yields `0.0`; a
/// non-finite parse refuses the fold.
fn fold_val(arg: &Expr) -> Option<ExprKind> {
    let ExprKind::Str(text) = &arg.kind else {
        return None;
    };
    let parsed = parse_val_prefix(text)?;
    Some(ExprKind::Float(parsed))
}

fn parse_val_prefix(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let bytes = trimmed.as_bytes();

    // Validate the lead: a sign must be followed by a digit or `.digit`,
    // a dot by a digit.
    let mut pos = 0usize;
    if matches!(bytes[0], b'+' | b'-') {
        pos = 1;
    }
    match bytes.get(pos) {
        Some(b'.') => {
            if !bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
                return Some(0.0);
            }
        }
        Some(byte) if byte.is_ascii_digit() => {}
        _ => return Some(0.0),
    }

    // Longest numeric prefix: digits [. digits] [e [sign] digits]
    let mut end = pos;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        if bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            end = exp_end;
        }
    }

    let parsed: f64 = trimmed[..end].parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(parsed)
}

/// `STR$(x)` formats through the runtime-canonical formatter so folded
/// results match the VM bit for bit.
fn fold_str(arg: &Expr) -> Option<ExprKind> {
    let numeric = as_numeric(arg)?;
    let text = if numeric.is_float {
        format_f64_runtime(numeric.f)
    } else {
        numeric.i.to_string()
    };
    Some(ExprKind::Str(text))
}

/// Runtime float formatting: `NaN`/`Inf`/`-Inf` spellings, otherwise up to
/// 15 significant digits with trailing zeros removed (printf `%.15g`).
pub(crate) fn format_f64_runtime(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-Inf" } else { "Inf" }.to_string();
    }
    format_significant(value, 15)
}

fn format_significant(value: f64, precision: i32) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let sci = format!("{:.*e}", (precision - 1) as usize, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= precision {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }
    let decimals = (precision - 1 - exp).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    trim_fraction(&fixed).to_string()
}

/// Drop trailing zeros (and a trailing dot) from a fixed-point rendering.
fn trim_fraction(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use basic_ir::Span;
    use pretty_assertions::assert_eq;

    fn f(value: f64) -> Expr {
        Expr::float(value, Span::DUMMY)
    }

    fn s(value: &str) -> Expr {
        Expr::string(value, Span::DUMMY)
    }

    #[test]
    fn test_int_floors_fix_truncates() {
        assert_eq!(fold_int(&f(-2.5)), Some(ExprKind::Float(-3.0)));
        assert_eq!(fold_fix(&f(-2.5)), Some(ExprKind::Float(-2.0)));
        assert_eq!(fold_int(&Expr::int(7, Span::DUMMY)), Some(ExprKind::Float(7.0)));
    }

    #[test]
    fn test_round_uses_bankers_rounding() {
        assert_eq!(fold_round(&[f(2.5)]), Some(ExprKind::Float(2.0)));
        assert_eq!(fold_round(&[f(3.5)]), Some(ExprKind::Float(4.0)));
        assert_eq!(
            fold_round(&[f(2.345), Expr::int(2, Span::DUMMY)]),
            Some(ExprKind::Float(2.34))
        );
    }

    #[test]
    fn test_round_refuses_precision_loss() {
        assert!(fold_round(&[f(1.0), Expr::int(400, Span::DUMMY)]).is_none());
    }

    #[test]
    fn test_val_parses_numeric_prefix() {
        assert_eq!(fold_val(&s("  12.5abc")), Some(ExprKind::Float(12.5)));
        assert_eq!(fold_val(&s("-3e2xyz")), Some(ExprKind::Float(-300.0)));
        assert_eq!(fold_val(&s("")), Some(ExprKind::Float(0.0)));
        assert_eq!(fold_val(&s("abc")), Some(ExprKind::Float(0.0)));
        assert_eq!(fold_val(&s("+.5")), Some(ExprKind::Float(0.5)));
        assert_eq!(fold_val(&s("+x")), Some(ExprKind::Float(0.0)));
        assert_eq!(fold_val(&s(".x")), Some(ExprKind::Float(0.0)));
    }

    #[test]
    fn test_str_matches_runtime_formatter() {
        assert_eq!(
            fold_str(&Expr::int(42, Span::DUMMY)),
            Some(ExprKind::Str("42".to_string()))
        );
        assert_eq!(fold_str(&f(2.5)), Some(ExprKind::Str("2.5".to_string())));
        assert_eq!(fold_str(&f(0.25)), Some(ExprKind::Str("0.25".to_string())));
    }

    #[test]
    fn test_format_f64_runtime_special_values() {
        assert_eq!(format_f64_runtime(f64::NAN), "NaN");
        assert_eq!(format_f64_runtime(f64::INFINITY), "Inf");
        assert_eq!(format_f64_runtime(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_f64_runtime(0.0), "0");
        assert_eq!(format_f64_runtime(100.0), "100");
        assert_eq!(format_f64_runtime(2147483649.0), "2147483649");
        assert_eq!(format_f64_runtime(1e21), "1e+21");
        assert_eq!(format_f64_runtime(1.5e-7), "1.5e-07");
    }
}
