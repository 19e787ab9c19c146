//! Parser unit tests.
//!
//! Diagnostic-text assertions use the full emitter pipeline so the exact
//! three-line rendering (including caret placement) is covered here; dump
//! format tests live in the printer crate.

use basic_diagnostic::{DiagnosticEmitter, SourceManager};
use basic_ir::{
    DoCond, DoTestPos, ExprKind, OpenMode, PrintItem, ResumeMode, StmtKind, FIRST_SYNTHETIC_LABEL,
};
use pretty_assertions::assert_eq;

use crate::parse_program;

fn parse(src: &str) -> basic_ir::Program {
    parse_program(src, 1, None)
}

/// Parse with diagnostics and render them.
fn parse_with_diags(src: &str, path: &str) -> (basic_ir::Program, String, usize) {
    let mut sm = SourceManager::new();
    let fid = sm.add_file(path);
    let mut emitter = DiagnosticEmitter::new();
    emitter.add_source(fid, src);
    let program = parse_program(src, fid, Some(&mut emitter));
    let rendered = emitter.render_all(&sm);
    (program, rendered, emitter.error_count())
}

#[test]
fn test_select_case_single_label() {
    let prog = parse("10 SELECT CASE X\n20 CASE 1\n30 END SELECT\n");
    assert_eq!(prog.main.len(), 1);
    let StmtKind::SelectCase { arms, .. } = &prog.main[0].kind else {
        panic!("expected SELECT CASE, got {:?}", prog.main[0].kind);
    };
    assert_eq!(arms.len(), 1);
    assert_eq!(arms[0].labels.as_slice(), &[1]);
    assert!(arms[0].body.is_empty());
}

#[test]
fn test_select_case_multi_label() {
    let prog = parse("10 SELECT CASE X\n20 CASE 1, 2, 3\n30 END SELECT\n");
    let StmtKind::SelectCase { arms, .. } = &prog.main[0].kind else {
        panic!("expected SELECT CASE");
    };
    assert_eq!(arms[0].labels.as_slice(), &[1, 2, 3]);
}

#[test]
fn test_select_case_else_body_extends_to_end() {
    let prog = parse(
        "10 SELECT CASE X\n20 CASE 1\n30 PRINT 1\n40 CASE ELSE\n50 PRINT 0\n60 PRINT 2\n70 END SELECT\n",
    );
    let StmtKind::SelectCase { else_body, .. } = &prog.main[0].kind else {
        panic!("expected SELECT CASE");
    };
    assert_eq!(else_body.len(), 2);
}

#[test]
fn test_select_case_empty_label_list_diagnostic() {
    let src = "10 SELECT CASE X\n20 CASE\n30 END SELECT\n";
    let (prog, rendered, _) = parse_with_diags(src, "missing_label.bas");
    assert_eq!(prog.main.len(), 1);
    let expected = "missing_label.bas:2:4: error[ERR_Case_EmptyLabelList]: \
                    CASE arm requires at least one label\n\
                    20 CASE\n   \
                    ^^^^\n";
    assert_eq!(rendered, expected);
}

#[test]
fn test_select_case_invalid_label_mentions_integer_literals() {
    let src = "10 SELECT CASE X\n20 CASE A\n30 PRINT 1\n40 END SELECT\n";
    let (_, rendered, errors) = parse_with_diags(src, "bad_label.bas");
    assert!(errors >= 1);
    assert!(rendered.contains("integer literals"), "got: {rendered}");

    let src = "10 SELECT CASE X\n20 CASE 1, \"x\"\n30 END SELECT\n";
    let (_, rendered, _) = parse_with_diags(src, "mixed_label.bas");
    assert!(rendered.contains("integer literals"), "got: {rendered}");
}

#[test]
fn test_select_case_duplicate_else_diagnostic() {
    let src = "10 SELECT CASE X\n20 CASE 1\n30 PRINT 1\n40 CASE ELSE\n50 PRINT 0\n\
               60 CASE ELSE\n70 PRINT 2\n80 END SELECT\n";
    let (prog, rendered, _) = parse_with_diags(src, "dup_else.bas");
    let expected = "dup_else.bas:6:9: error[ERR_SelectCase_DuplicateElse]: \
                    Duplicate CASE ELSE arm\n\
                    60 CASE ELSE\n        \
                    ^^^^\n";
    assert_eq!(rendered, expected);
    // The first CASE ELSE body is kept.
    let StmtKind::SelectCase { else_body, .. } = &prog.main[0].kind else {
        panic!("expected SELECT CASE");
    };
    assert_eq!(else_body.len(), 1);
}

#[test]
fn test_select_case_missing_end_select_diagnostic() {
    let src = "10 SELECT CASE X\n20 CASE 1\n30 PRINT 1\n";
    let (prog, rendered, _) = parse_with_diags(src, "missing_end.bas");
    assert_eq!(prog.main.len(), 1);
    let expected = "missing_end.bas:1:4: error[ERR_SelectCase_MissingEndSelect]: \
                    SELECT CASE missing END SELECT terminator\n\
                    10 SELECT CASE X\n   \
                    ^^^^^^\n";
    assert_eq!(rendered, expected);
}

#[test]
fn test_try_catch_with_variable() {
    let prog = parse(
        "10 TRY\n20 PRINT 1\n30 CATCH e\n40 PRINT ERR()\n50 END TRY\n60 END\n",
    );
    assert_eq!(prog.main.len(), 2);
    let StmtKind::TryCatch {
        try_body,
        catch_var,
        catch_body,
    } = &prog.main[0].kind
    else {
        panic!("expected TRY/CATCH, got {:?}", prog.main[0].kind);
    };
    assert_eq!(catch_var.as_deref(), Some("e"));
    assert_eq!(try_body.len(), 1);
    assert_eq!(catch_body.len(), 1);
    assert!(matches!(prog.main[1].kind, StmtKind::End));
}

#[test]
fn test_try_without_catch_still_yields_node() {
    let prog = parse("10 TRY\n20 PRINT 1\n30 END TRY\n40 END\n");
    assert!(!prog.main.is_empty());
    let StmtKind::TryCatch {
        try_body,
        catch_var,
        catch_body,
    } = &prog.main[0].kind
    else {
        panic!("expected TRY/CATCH even without CATCH");
    };
    assert_eq!(try_body.len(), 1);
    assert!(catch_var.is_none());
    assert!(catch_body.is_empty());
}

#[test]
fn test_stray_end_try_parses_as_end() {
    let prog = parse("10 END TRY\n20 END\n");
    assert!(!prog.main.is_empty());
    assert!(matches!(prog.main[0].kind, StmtKind::End));
}

#[test]
fn test_gosub_records_target_line() {
    let prog = parse("30 GOSUB 200\n40 END\n");
    assert_eq!(prog.main.len(), 2);
    let StmtKind::Gosub { target_line } = prog.main[0].kind else {
        panic!("expected GOSUB");
    };
    assert_eq!(target_line, 200);
}

#[test]
fn test_goto_named_label_gets_synthetic_id() {
    let prog = parse("10 GOTO Start\n20 END\nStart:\n30 END\n");
    let StmtKind::Goto { target } = prog.main[0].kind else {
        panic!("expected GOTO");
    };
    assert_eq!(target, FIRST_SYNTHETIC_LABEL);
    // The label line itself becomes a Label statement with the same id.
    let label = &prog.main[2];
    assert!(matches!(label.kind, StmtKind::Label));
    assert_eq!(label.line, FIRST_SYNTHETIC_LABEL);
}

#[test]
fn test_open_statement_shape() {
    let prog = parse("10 OPEN \"foo.txt\" FOR INPUT AS #1\n20 END\n");
    let StmtKind::Open {
        mode,
        path,
        channel,
    } = &prog.main[0].kind
    else {
        panic!("expected OPEN");
    };
    assert_eq!(*mode, OpenMode::Input);
    assert!(matches!(
        path.as_ref().map(|p| &p.kind),
        Some(ExprKind::Str(s)) if s == "foo.txt"
    ));
    assert!(matches!(
        channel.as_ref().map(|c| &c.kind),
        Some(ExprKind::Int(1))
    ));
}

#[test]
fn test_print_channel_args() {
    let prog = parse("10 PRINT #1, X, Y\n20 END\n");
    let StmtKind::PrintCh {
        channel,
        args,
        trailing_newline,
        ..
    } = &prog.main[0].kind
    else {
        panic!("expected PRINT #");
    };
    assert!(matches!(
        channel.as_ref().map(|c| &c.kind),
        Some(ExprKind::Int(1))
    ));
    assert_eq!(args.len(), 2);
    assert!(*trailing_newline);
}

#[test]
fn test_write_channel_no_newline() {
    let prog = parse("10 WRITE #1, X;\n20 END\n");
    let StmtKind::PrintCh {
        mode,
        trailing_newline,
        ..
    } = &prog.main[0].kind
    else {
        panic!("expected WRITE #");
    };
    assert_eq!(*mode, basic_ir::PrintChMode::Write);
    assert!(!*trailing_newline);
}

#[test]
fn test_line_input_variable_target() {
    let prog = parse("10 LINE INPUT #1, A$\n20 END\n");
    let StmtKind::LineInputCh { target, .. } = &prog.main[0].kind else {
        panic!("expected LINE INPUT #");
    };
    assert!(matches!(
        target.as_ref().map(|t| &t.kind),
        Some(ExprKind::Var(name)) if name == "A$"
    ));
}

#[test]
fn test_line_input_array_element_target() {
    let prog = parse("10 DIM BUF(4)\n20 LINE INPUT #1, BUF(2)\n30 END\n");
    let StmtKind::LineInputCh { target, .. } = &prog.main[1].kind else {
        panic!("expected LINE INPUT #");
    };
    assert!(matches!(
        target.as_ref().map(|t| &t.kind),
        Some(ExprKind::Array { name, .. }) if name == "BUF"
    ));
}

#[test]
fn test_line_input_rejects_non_lvalue() {
    let src = "10 LINE INPUT #1, LEFT$(A$, 1)\n20 END\n";
    let (_, rendered, errors) = parse_with_diags(src, "line_input.bas");
    assert!(errors >= 1);
    assert!(rendered.contains("expected variable"), "got: {rendered}");
}

#[test]
fn test_on_error_and_resume_modes() {
    let prog = parse("10 ON ERROR GOTO 200\n20 ON ERROR GOTO 0\n30 RESUME\n40 RESUME NEXT\n50 RESUME 400\n60 END\n");
    let StmtKind::OnErrorGoto { target, to_zero } = prog.main[0].kind else {
        panic!("expected ON ERROR GOTO");
    };
    assert_eq!((target, to_zero), (200, false));
    let StmtKind::OnErrorGoto { to_zero, .. } = prog.main[1].kind else {
        panic!("expected ON ERROR GOTO 0");
    };
    assert!(to_zero);
    assert!(matches!(
        prog.main[2].kind,
        StmtKind::Resume {
            mode: ResumeMode::Same,
            ..
        }
    ));
    assert!(matches!(
        prog.main[3].kind,
        StmtKind::Resume {
            mode: ResumeMode::Next,
            ..
        }
    ));
    assert!(matches!(
        prog.main[4].kind,
        StmtKind::Resume {
            mode: ResumeMode::Label,
            target: 400,
        }
    ));
}

#[test]
fn test_single_line_if_with_colon_sequence() {
    let prog = parse("60 IF A > 0 THEN LET B = TRUE : GOTO 100\n70 END\n");
    let StmtKind::If { then_branch, .. } = &prog.main[0].kind else {
        panic!("expected IF");
    };
    let StmtKind::StmtList(stmts) = &then_branch.kind else {
        panic!("expected a statement list branch, got {:?}", then_branch.kind);
    };
    assert_eq!(stmts.len(), 2);
    assert!(matches!(stmts[0].kind, StmtKind::Let { .. }));
    assert!(matches!(stmts[1].kind, StmtKind::Goto { target: 100 }));
}

#[test]
fn test_block_if_with_elseif_and_else() {
    let prog = parse(
        "10 IF A > 0 THEN\n20 PRINT 1\n30 ELSEIF A < 0 THEN\n40 PRINT 2\n50 ELSE\n60 PRINT 3\n70 END IF\n80 END\n",
    );
    let StmtKind::If {
        elseifs,
        else_branch,
        ..
    } = &prog.main[0].kind
    else {
        panic!("expected IF");
    };
    assert_eq!(elseifs.len(), 1);
    assert!(else_branch.is_some());
}

#[test]
fn test_for_collects_body_through_next() {
    let prog = parse("10 FOR I = 1 TO 3\n20 PRINT I\n30 NEXT I\n40 END\n");
    assert_eq!(prog.main.len(), 2);
    let StmtKind::For { var, body, step, .. } = &prog.main[0].kind else {
        panic!("expected FOR");
    };
    assert_eq!(var, "I");
    assert!(step.is_none());
    assert_eq!(body.len(), 1);
}

#[test]
fn test_while_and_do_loops() {
    let prog = parse("10 WHILE X < 3\n20 PRINT X\n30 WEND\n40 DO\n50 PRINT 1\n60 LOOP UNTIL DONE\n70 END\n");
    assert!(matches!(prog.main[0].kind, StmtKind::While { .. }));
    let StmtKind::Do {
        test_pos,
        cond_kind,
        cond,
        body,
    } = &prog.main[1].kind
    else {
        panic!("expected DO");
    };
    assert_eq!(*test_pos, DoTestPos::Post);
    assert_eq!(*cond_kind, DoCond::Until);
    assert!(cond.is_some());
    assert_eq!(body.len(), 1);
}

#[test]
fn test_declarations_accumulate_into_procs() {
    let prog = parse(
        "10 FUNCTION F(A)\n20 RETURN A\n30 END FUNCTION\n40 SUB S(X$)\n50 PRINT X$\n60 END SUB\n70 END\n",
    );
    assert_eq!(prog.procs.len(), 2);
    assert_eq!(prog.main.len(), 1);
    let StmtKind::Function(func) = &prog.procs[0].kind else {
        panic!("expected FUNCTION decl");
    };
    assert_eq!(func.name, "F");
    assert_eq!(func.params.len(), 1);
    // RETURN inside a procedure is not a GOSUB return.
    let StmtKind::Return {
        is_gosub_return, ..
    } = &func.body[0].kind
    else {
        panic!("expected RETURN");
    };
    assert!(!is_gosub_return);
}

#[test]
fn test_top_level_bare_return_is_gosub_return() {
    let prog = parse("10 GOSUB 100\n20 END\n100 RETURN\n");
    let StmtKind::Return {
        is_gosub_return, ..
    } = &prog.main[2].kind
    else {
        panic!("expected RETURN, got {:?}", prog.main[2].kind);
    };
    assert!(is_gosub_return);
}

#[test]
fn test_implicit_let_and_call_statement() {
    let prog = parse("10 X = 1 + 2\n20 DOIT(X)\n30 END\n");
    assert!(matches!(prog.main[0].kind, StmtKind::Let { .. }));
    let StmtKind::CallStmt { call: Some(call) } = &prog.main[1].kind else {
        panic!("expected call statement");
    };
    assert!(matches!(&call.kind, ExprKind::Call { callee, .. } if callee == "DOIT"));
}

#[test]
fn test_array_assignment_target() {
    let prog = parse("10 DIM ARR(4)\n20 ARR(2) = 7\n30 END\n");
    let StmtKind::Let { target, .. } = &prog.main[1].kind else {
        panic!("expected LET");
    };
    assert!(matches!(&target.kind, ExprKind::Array { name, .. } if name == "ARR"));
}

#[test]
fn test_class_declaration_shape() {
    let prog = parse(
        "10 CLASS Point IMPLEMENTS Geo.Shape\n\
         20 DIM X AS INTEGER\n\
         30 STATIC COUNT AS INTEGER\n\
         40 CONSTRUCTOR (A, B)\n\
         50 ME.X = A\n\
         60 END CONSTRUCTOR\n\
         70 METHOD Norm() AS DOUBLE\n\
         80 RETURN 0\n\
         90 END METHOD\n\
         100 END CLASS\n\
         110 END\n",
    );
    assert_eq!(prog.procs.len(), 1);
    let StmtKind::Class(class) = &prog.procs[0].kind else {
        panic!("expected CLASS decl");
    };
    assert_eq!(class.name, "Point");
    assert_eq!(class.fields.len(), 2);
    assert!(class.fields[1].is_static);
    assert_eq!(class.implements, vec![vec!["Geo".to_string(), "Shape".to_string()]]);
    assert_eq!(class.members.len(), 2);
}

#[test]
fn test_builtin_calls_parse_into_builtin_nodes() {
    let prog = parse("10 PRINT LEN(\"abc\"), MID$(A$, 1, 2)\n20 END\n");
    let StmtKind::Print { items } = &prog.main[0].kind else {
        panic!("expected PRINT");
    };
    let exprs: Vec<_> = items
        .iter()
        .filter_map(|item| match item {
            PrintItem::Expr(e) => Some(&e.kind),
            _ => None,
        })
        .collect();
    assert!(matches!(
        exprs[0],
        ExprKind::Builtin {
            builtin: basic_ir::Builtin::Len,
            ..
        }
    ));
    assert!(matches!(
        exprs[1],
        ExprKind::Builtin {
            builtin: basic_ir::Builtin::Mid,
            ..
        }
    ));
}

#[test]
fn test_precedence_andalso_binds_loosest() {
    let prog = parse("10 LET X = A > 1 AND B > 2 ANDALSO C\n20 END\n");
    let StmtKind::Let { value, .. } = &prog.main[0].kind else {
        panic!("expected LET");
    };
    let ExprKind::Binary { op, .. } = &value.kind else {
        panic!("expected binary expression");
    };
    assert_eq!(*op, basic_ir::BinaryOp::AndAlso);
}

#[test]
fn test_recovery_continues_after_junk_line() {
    let src = "10 LET = 5\n20 PRINT 1\n30 END\n";
    let (prog, _, errors) = parse_with_diags(src, "junk.bas");
    assert!(errors >= 1);
    // The parser resynchronized and kept the following statements.
    assert!(prog
        .main
        .iter()
        .any(|s| matches!(s.kind, StmtKind::Print { .. })));
    assert!(prog.main.iter().any(|s| matches!(s.kind, StmtKind::End)));
}
