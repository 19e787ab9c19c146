//! Folding scenarios driven through the parser, mirroring how programs
//! reach the folder in the real pipeline.

use basic_ir::{BinaryOp, ExprKind, PrintItem, Program, StmtKind};
use basic_parse::parse_program;
use pretty_assertions::assert_eq;

use crate::fold_constants;

fn folded(src: &str) -> Program {
    let mut program = parse_program(src, 1, None);
    fold_constants(&mut program);
    program
}

/// The value expression of the first `LET` in the main body.
fn first_let(program: &Program) -> &ExprKind {
    for stmt in &program.main {
        if let StmtKind::Let { value, .. } = &stmt.kind {
            return &value.kind;
        }
    }
    panic!("no LET statement found");
}

/// The first expression item of the `index`-th PRINT statement.
fn print_expr(program: &Program, index: usize) -> &ExprKind {
    let mut seen = 0;
    for stmt in &program.main {
        if let StmtKind::Print { items } = &stmt.kind {
            if seen == index {
                for item in items {
                    if let PrintItem::Expr(expr) = item {
                        return &expr.kind;
                    }
                }
            }
            seen += 1;
        }
    }
    panic!("no PRINT statement {index}");
}

#[test]
fn test_int_plus_float_promotes() {
    let program = folded("10 LET X = 1 + 2.5\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Float(3.5));
}

#[test]
fn test_string_concat() {
    let program = folded("10 PRINT \"foo\" + \"bar\"\n20 END\n");
    assert_eq!(print_expr(&program, 0), &ExprKind::Str("foobar".to_string()));
}

#[test]
fn test_i16_overflow_is_not_folded() {
    let program = folded("10 LET X = 32767 + 1\n20 END\n");
    assert!(matches!(
        first_let(&program),
        ExprKind::Binary {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn test_long_plus_double_promotes() {
    let program = folded("10 LET X = 2147483647 + 2#\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Float(2147483649.0));
}

#[test]
fn test_single_plus_integer_promotes() {
    let program = folded("10 LET X = 1! + 2\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Float(3.0));
}

#[test]
fn test_division_by_literal_zero_is_preserved() {
    for (src, op) in [
        ("10 LET X = 10 / 0\n20 END\n", BinaryOp::Div),
        ("10 LET X = 10 \\ 0\n20 END\n", BinaryOp::IDiv),
        ("10 LET X = 10 MOD 0\n20 END\n", BinaryOp::Mod),
    ] {
        let program = folded(src);
        let ExprKind::Binary { op: found, .. } = first_let(&program) else {
            panic!("expected preserved binary node for {src}");
        };
        assert_eq!(*found, op);
    }
}

#[test]
fn test_numeric_comparison_materializes_int() {
    let program = folded("10 LET X = 5 > 2\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Int(1));
}

#[test]
fn test_string_comparisons() {
    let program = folded("10 PRINT \"foo\" = \"bar\"\n20 PRINT \"foo\" <> \"bar\"\n30 END\n");
    assert_eq!(print_expr(&program, 0), &ExprKind::Int(0));
    assert_eq!(print_expr(&program, 1), &ExprKind::Int(1));
}

#[test]
fn test_ordered_string_comparison_is_not_folded() {
    let program = folded("10 PRINT \"a\" < \"b\"\n20 END\n");
    assert!(matches!(print_expr(&program, 0), ExprKind::Binary { .. }));
}

#[test]
fn test_integer_or_coerces_to_bool() {
    let program = folded("10 LET X = 0 OR 1\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Bool(true));
}

#[test]
fn test_modulus() {
    let program = folded("10 LET X = 7 MOD 3\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Int(1));
}

#[test]
fn test_bool_operations_stay_boolean() {
    let program = folded(
        "10 LET A = NOT TRUE\n20 LET B = TRUE AND TRUE\n30 LET C = FALSE ORELSE TRUE\n\
         40 LET D = FALSE ORELSE (1 = 1)\n50 END\n",
    );
    let values: Vec<&ExprKind> = program
        .main
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Let { value, .. } => Some(&value.kind),
            _ => None,
        })
        .collect();
    assert_eq!(values[0], &ExprKind::Bool(false));
    assert_eq!(values[1], &ExprKind::Bool(true));
    assert_eq!(values[2], &ExprKind::Bool(true));
    assert_eq!(values[3], &ExprKind::Bool(true));
}

#[test]
fn test_short_circuit_does_not_fold_rhs() {
    // The RHS is a division by literal zero: folding it would change
    // runtime behaviour, and a decided LHS must not even look at it.
    let program = folded("10 LET X = FALSE ANDALSO 1 / 0 > 0\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Bool(false));

    let program = folded("10 LET X = TRUE ORELSE 1 / 0 > 0\n20 END\n");
    assert_eq!(first_let(&program), &ExprKind::Bool(true));
}

#[test]
fn test_undecided_short_circuit_collapses_to_rhs() {
    let program = folded("10 LET X = TRUE ANDALSO Y\n20 END\n");
    assert!(matches!(first_let(&program), ExprKind::Var(name) if name == "Y"));
}

#[test]
fn test_len_counts_decoded_bytes() {
    let program = folded("10 PRINT LEN(\"abc\")\n20 PRINT LEN(\"\\n\")\n30 END\n");
    assert_eq!(print_expr(&program, 0), &ExprKind::Int(3));
    assert_eq!(print_expr(&program, 1), &ExprKind::Int(1));
}

#[test]
fn test_mid_left_right_scenarios() {
    let program = folded(
        "10 PRINT MID$(\"AßC\", 0, 5)\n20 PRINT MID$(\"xyz\", 10, 2)\n\
         30 PRINT LEFT$(\"abc\", -1)\n40 PRINT LEFT$(\"\", 5)\n\
         50 PRINT RIGHT$(\"ñab\", 2)\n60 END\n",
    );
    assert_eq!(print_expr(&program, 0), &ExprKind::Str("AßC".to_string()));
    assert_eq!(print_expr(&program, 1), &ExprKind::Str(String::new()));
    assert_eq!(print_expr(&program, 2), &ExprKind::Str(String::new()));
    assert_eq!(print_expr(&program, 3), &ExprKind::Str(String::new()));
    assert_eq!(print_expr(&program, 4), &ExprKind::Str("ab".to_string()));
}

#[test]
fn test_unary_negate_and_plus() {
    let program = folded("10 LET X = -5\n20 LET Y = +2.5\n30 END\n");
    assert_eq!(first_let(&program), &ExprKind::Int(-5));
}

#[test]
fn test_fold_preserves_location() {
    let mut program = parse_program("10 LET X = 1 + 2\n20 END\n", 1, None);
    let original_span = match &program.main[0].kind {
        StmtKind::Let { value, .. } => value.span,
        _ => panic!("expected LET"),
    };
    fold_constants(&mut program);
    let StmtKind::Let { value, .. } = &program.main[0].kind else {
        panic!("expected LET");
    };
    assert_eq!(value.kind, ExprKind::Int(3));
    assert_eq!(value.span, original_span);
}

#[test]
fn test_procedure_bodies_participate_in_folding() {
    let program = folded(
        "10 FUNCTION F(A)\n20 RETURN 1 + 2\n30 END FUNCTION\n40 END\n",
    );
    let StmtKind::Function(decl) = &program.procs[0].kind else {
        panic!("expected FUNCTION");
    };
    let StmtKind::Return { value, .. } = &decl.body[0].kind else {
        panic!("expected RETURN");
    };
    assert_eq!(value.as_ref().map(|v| &v.kind), Some(&ExprKind::Int(3)));
}

#[test]
fn test_call_arguments_fold_but_calls_do_not() {
    let program = folded("10 DOIT(1 + 2)\n20 END\n");
    let StmtKind::CallStmt { call: Some(call) } = &program.main[0].kind else {
        panic!("expected call statement");
    };
    let ExprKind::Call { args, .. } = &call.kind else {
        panic!("expected call expression");
    };
    assert_eq!(args[0].kind, ExprKind::Int(3));
}

#[test]
fn test_folding_is_idempotent_on_fixed_programs() {
    let sources = [
        "10 LET X = 1 + 2.5\n20 END\n",
        "10 LET X = 32767 + 1\n20 END\n",
        "10 LET X = FALSE ORELSE (1 = 1)\n20 END\n",
        "10 PRINT MID$(\"AßC\", 0, 5)\n20 END\n",
        "10 LET X = 10 / 0\n20 END\n",
    ];
    for src in sources {
        let mut once = parse_program(src, 1, None);
        fold_constants(&mut once);
        let mut twice = once.clone();
        fold_constants(&mut twice);
        assert_eq!(once, twice, "fold not idempotent for {src}");
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_literal() -> impl Strategy<Value = String> {
        prop_oneof![
            (-40000i64..40000).prop_map(|v| v.to_string()),
            (-1000.0f64..1000.0).prop_map(|v| format!("{v:.3}")),
            Just("TRUE".to_string()),
            Just("FALSE".to_string()),
        ]
    }

    fn arb_expr() -> impl Strategy<Value = String> {
        let leaf = arb_literal();
        leaf.prop_recursive(3, 24, 2, |inner| {
            (
                inner.clone(),
                prop_oneof![
                    Just("+"),
                    Just("-"),
                    Just("*"),
                    Just("/"),
                    Just("MOD"),
                    Just("="),
                    Just("<"),
                    Just("AND"),
                    Just("ANDALSO"),
                    Just("ORELSE"),
                ],
                inner,
            )
                .prop_map(|(lhs, op, rhs)| format!("({lhs}) {op} ({rhs})"))
        })
    }

    proptest! {
        /// Folding twice is structurally the same as folding once.
        #[test]
        fn fold_is_idempotent(expr in arb_expr()) {
            let src = format!("10 LET X = {expr}\n20 END\n");
            let mut once = parse_program(&src, 1, None);
            fold_constants(&mut once);
            let mut twice = once.clone();
            fold_constants(&mut twice);
            prop_assert_eq!(once, twice);
        }
    }
}
