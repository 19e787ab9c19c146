//! End-to-end pipeline tests.

use basic_diagnostic::SourceManager;
use pretty_assertions::assert_eq;

use crate::{compile_basic, CompileInput, CompileOptions};

fn compile(src: &str) -> (crate::CompileResult, SourceManager) {
    let mut sm = SourceManager::new();
    let result = compile_basic(
        CompileInput {
            source: src,
            path: Some("test.bas"),
            file_id: None,
        },
        CompileOptions::default(),
        &mut sm,
    );
    (result, sm)
}

#[test]
fn test_clean_program_produces_module() {
    let (result, _) = compile("10 PRINT \"HELLO\"\n20 END\n");
    assert!(result.succeeded());
    assert!(result.module.is_some());
    assert_eq!(result.emitter.error_count(), 0);
}

#[test]
fn test_semantic_error_suppresses_module() {
    let (result, sm) = compile("10 PRINT \"A\" * 2\n20 END\n");
    assert!(!result.succeeded());
    assert!(result.module.is_none());
    assert!(result.emitter.render_all(&sm).contains("B2001"));
}

#[test]
fn test_parse_error_short_circuits_before_lowering() {
    let (result, sm) = compile("10 SELECT CASE X\n20 CASE\n30 END SELECT\n40 END\n");
    assert!(!result.succeeded());
    assert!(result.module.is_none());
    // The AST is still available for inspection.
    assert!(result.program.is_some());
    assert!(result
        .emitter
        .render_all(&sm)
        .contains("ERR_Case_EmptyLabelList"));
}

#[test]
fn test_diagnostics_are_ordered_by_location() {
    let src = "10 PRINT \"A\" * 2\n20 PRINT \"B\" * 3\n30 END\n";
    let (result, sm) = compile(src);
    let rendered = result.emitter.render_all(&sm);
    let first = rendered.find("test.bas:1:").unwrap_or(usize::MAX);
    let second = rendered.find("test.bas:2:").unwrap_or(usize::MAX);
    assert!(first < second, "got: {rendered}");
}

#[test]
fn test_full_pipeline_with_folding_and_procs() {
    let src = "\
10 FUNCTION AREA(W, H)
20 RETURN W * H
30 END FUNCTION
40 LET X = 2 + 3
50 PRINT AREA(X, 4)
60 END
";
    let (result, sm) = compile(src);
    assert!(
        result.succeeded(),
        "diagnostics: {}",
        result.emitter.render_all(&sm)
    );
    let module = result.module.expect("module");
    assert!(module.functions.iter().any(|f| f.name == "@AREA"));
    assert!(module.functions.iter().any(|f| f.name == "@main"));
}

#[test]
fn test_explicit_file_id_is_respected() {
    let mut sm = SourceManager::new();
    let fid = sm.add_file("explicit.bas");
    let result = compile_basic(
        CompileInput {
            source: "10 END\n",
            path: None,
            file_id: Some(fid),
        },
        CompileOptions::default(),
        &mut sm,
    );
    assert_eq!(result.file_id, fid);
    assert!(result.succeeded());
}

#[test]
fn test_file_id_zero_is_treated_as_absent() {
    // Id 0 is the exhaustion sentinel, never a valid file; the driver
    // allocates a fresh id instead of using it.
    let mut sm = SourceManager::new();
    let result = compile_basic(
        CompileInput {
            source: "10 END\n",
            path: Some("zero.bas"),
            file_id: Some(0),
        },
        CompileOptions::default(),
        &mut sm,
    );
    assert_ne!(result.file_id, 0);
    assert!(result.succeeded());
}
