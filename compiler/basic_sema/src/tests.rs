//! Analyzer tests driven through the parse → fold → analyze pipeline.

use basic_diagnostic::{DiagnosticEmitter, SourceManager};
use basic_fold::fold_constants;
use basic_ir::{ExprKind, Program, StmtKind, Type};
use basic_parse::parse_program;
use pretty_assertions::assert_eq;

use crate::{analyze, Analysis};

fn run(src: &str) -> (Program, Analysis, DiagnosticEmitter, SourceManager) {
    let mut sm = SourceManager::new();
    let fid = sm.add_file("test.bas");
    let mut emitter = DiagnosticEmitter::new();
    emitter.add_source(fid, src);
    let mut program = parse_program(src, fid, Some(&mut emitter));
    fold_constants(&mut program);
    let analysis = analyze(&mut program, &mut emitter, fid);
    (program, analysis, emitter, sm)
}

#[test]
fn test_scope_rename_follows_declaration_order() {
    let src = "\
10 SUB P()
20 DIM ARR(5)
30 DIM NAME$
40 DIM I
50 INPUT \"?\", NAME$
60 FOR I = 1 TO 3
70 PRINT ARR(I)
80 NEXT I
90 END SUB
100 END
";
    let (program, analysis, emitter, _) = run(src);
    assert_eq!(emitter.error_count(), 0, "unexpected diagnostics");

    let StmtKind::Sub(sub) = &program.procs[0].kind else {
        panic!("expected SUB");
    };

    // DIM statements renamed in declaration order.
    let dim_names: Vec<&str> = sub
        .body
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Dim { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(dim_names, vec!["ARR_0", "NAME$_1", "I_2"]);

    // References follow the rename in lock-step.
    let input_vars: Vec<&str> = sub
        .body
        .iter()
        .filter_map(|stmt| match &stmt.kind {
            StmtKind::Input { vars, .. } => Some(vars[0].as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(input_vars, vec!["NAME$_1"]);

    let StmtKind::For { var, body, .. } = sub
        .body
        .iter()
        .find_map(|stmt| match &stmt.kind {
            StmtKind::For { .. } => Some(&stmt.kind),
            _ => None,
        })
        .expect("FOR statement")
    else {
        panic!("expected FOR");
    };
    assert_eq!(var, "I_2");
    let StmtKind::Print { items } = &body[0].kind else {
        panic!("expected PRINT in FOR body");
    };
    let basic_ir::PrintItem::Expr(expr) = &items[0] else {
        panic!("expected expression item");
    };
    let ExprKind::Array { name, indices } = &expr.kind else {
        panic!("expected array access");
    };
    assert_eq!(name, "ARR_0");
    assert!(matches!(&indices[0].kind, ExprKind::Var(v) if v == "I_2"));

    // The locals are published under the procedure's symbol table.
    let locals = analysis.proc_vars.get("P").expect("locals for P");
    assert_eq!(locals.get("ARR_0").map(|v| v.is_array), Some(true));
    assert_eq!(locals.get("NAME$_1").map(|v| v.ty), Some(Type::Str));
    assert_eq!(locals.get("I_2").map(|v| v.ty), Some(Type::I64));
}

#[test]
fn test_string_times_number_is_b2001() {
    let (_, _, emitter, sm) = run("10 PRINT \"A\" * 2\n20 END\n");
    assert_eq!(emitter.error_count(), 1);
    let rendered = emitter.render_all(&sm);
    assert!(rendered.contains("B2001"), "got: {rendered}");
}

#[test]
fn test_string_times_string_is_one_b2001() {
    let (_, _, emitter, sm) = run("10 PRINT \"a\" * \"b\"\n20 END\n");
    assert_eq!(emitter.error_count(), 1);
    let rendered = emitter.render_all(&sm);
    assert!(rendered.contains("B2001"), "got: {rendered}");
}

#[test]
fn test_let_mixing_string_and_numeric_is_b2001() {
    let (_, _, emitter, sm) = run("10 LET X = \"abc\"\n20 END\n");
    assert_eq!(emitter.error_count(), 1);
    assert!(emitter.render_all(&sm).contains("B2001"));

    let (_, _, emitter, _) = run("10 LET S$ = \"abc\"\n20 END\n");
    assert_eq!(emitter.error_count(), 0);
}

#[test]
fn test_mixed_comparison_is_b2001() {
    let (_, _, emitter, _) = run("10 LET X = \"a\" < 2\n20 END\n");
    assert_eq!(emitter.error_count(), 1);
}

#[test]
fn test_string_concat_is_allowed() {
    let (_, _, emitter, _) = run("10 LET S$ = \"a\" + B$\n20 END\n");
    assert_eq!(emitter.error_count(), 0);
}

#[test]
fn test_sigil_types_are_inferred() {
    let (_, analysis, emitter, _) =
        run("10 LET A$ = \"x\"\n20 LET N% = 1\n30 LET F! = 1.5\n40 LET D# = 2.5\n50 LET P = 0\n60 END\n");
    assert_eq!(emitter.error_count(), 0);
    assert_eq!(analysis.program_vars.get("A$").map(|v| v.ty), Some(Type::Str));
    assert_eq!(analysis.program_vars.get("N%").map(|v| v.ty), Some(Type::I64));
    assert_eq!(analysis.program_vars.get("F!").map(|v| v.ty), Some(Type::F64));
    assert_eq!(analysis.program_vars.get("D#").map(|v| v.ty), Some(Type::F64));
    assert_eq!(analysis.program_vars.get("P").map(|v| v.ty), Some(Type::I64));
}

#[test]
fn test_dim_as_type_overrides_default() {
    let (_, analysis, emitter, _) = run("10 DIM COUNT AS DOUBLE\n20 END\n");
    assert_eq!(emitter.error_count(), 0);
    assert_eq!(
        analysis.program_vars.get("COUNT").map(|v| v.ty),
        Some(Type::F64)
    );
}

#[test]
fn test_const_infers_type_from_initializer() {
    let (program, _, emitter, _) = run("10 CONST PI = 3.14159\n20 END\n");
    assert_eq!(emitter.error_count(), 0);
    let StmtKind::Const { ty, .. } = &program.main[0].kind else {
        panic!("expected CONST");
    };
    assert_eq!(*ty, Type::F64);
}

#[test]
fn test_duplicate_dim_is_reported() {
    let (_, _, emitter, sm) = run("10 DIM X AS INTEGER\n20 DIM X AS INTEGER\n30 END\n");
    assert_eq!(emitter.error_count(), 1);
    assert!(emitter.render_all(&sm).contains("B2007"));
}

#[test]
fn test_redim_before_dim_is_reported() {
    let (_, _, emitter, sm) = run("10 REDIM GRID(5)\n20 END\n");
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2003"));
}

#[test]
fn test_unknown_procedure_call_is_reported() {
    let (_, _, emitter, sm) = run("10 NOPE(1)\n20 END\n");
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2002"));
}

#[test]
fn test_call_arity_mismatch_is_reported() {
    let src = "10 SUB S(A, B)\n20 PRINT A + B\n30 END SUB\n40 S(1)\n50 END\n";
    let (_, _, emitter, sm) = run(src);
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2004"));
}

#[test]
fn test_call_argument_type_mismatch_is_reported() {
    let src = "10 SUB S(A$)\n20 PRINT A$\n30 END SUB\n40 S(1)\n50 END\n";
    let (_, _, emitter, sm) = run(src);
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2005"));
}

#[test]
fn test_function_return_type_mismatch_is_reported() {
    let src = "10 FUNCTION F$()\n20 RETURN 1\n30 END FUNCTION\n40 END\n";
    let (_, _, emitter, sm) = run(src);
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2006"));
}

#[test]
fn test_shared_refers_upward_without_rename() {
    let src = "\
10 DIM TOTAL AS INTEGER
20 SUB BUMP()
30 SHARED TOTAL
40 TOTAL = TOTAL + 1
50 END SUB
60 END
";
    let (program, _, emitter, _) = run(src);
    assert_eq!(emitter.error_count(), 0);
    let StmtKind::Sub(sub) = &program.procs[0].kind else {
        panic!("expected SUB");
    };
    let StmtKind::Let { target, .. } = &sub.body[1].kind else {
        panic!("expected LET, got {:?}", sub.body[1].kind);
    };
    assert!(matches!(&target.kind, ExprKind::Var(name) if name == "TOTAL"));
}

#[test]
fn test_builtin_arity_is_checked() {
    let (_, _, emitter, sm) = run("10 PRINT LEN(\"a\", \"b\")\n20 END\n");
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2004"));
}

#[test]
fn test_builtin_argument_type_is_checked() {
    let (_, _, emitter, sm) = run("10 PRINT LEN(5)\n20 END\n");
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2005"));
}

#[test]
fn test_signatures_are_published_for_the_lowerer() {
    let src = "10 FUNCTION AREA(W, H)\n20 RETURN W * H\n30 END FUNCTION\n40 END\n";
    let (_, analysis, emitter, _) = run(src);
    assert_eq!(emitter.error_count(), 0);
    let sig = analysis.procs.get("AREA").expect("signature");
    assert_eq!(sig.params.len(), 2);
    assert_eq!(sig.ret, Some(Type::I64));
}

#[test]
fn test_me_outside_class_is_reported() {
    let (_, _, emitter, sm) = run("10 PRINT ME.X\n20 END\n");
    assert!(emitter.error_count() >= 1);
    assert!(emitter.render_all(&sm).contains("B2002"));
}

#[test]
fn test_me_field_resolves_inside_class() {
    let src = "\
10 CLASS Point
20 DIM X AS INTEGER
30 METHOD GetX() AS INTEGER
40 RETURN ME.X
50 END METHOD
60 END CLASS
70 END
";
    let (_, _, emitter, sm) = run(src);
    assert_eq!(emitter.error_count(), 0, "got: {}", emitter.render_all(&sm));
}
