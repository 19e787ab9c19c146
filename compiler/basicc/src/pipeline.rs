//! Driver entry point.

use basic_diagnostic::{DiagnosticEmitter, ErrorCode, SourceManager};
use basic_ir::Span;
use basic_lower::LowerOptions;
use tracing::{debug, info_span};

/// Compilation inputs.
#[derive(Clone, Debug, Default)]
pub struct CompileInput<'a> {
    pub source: &'a str,
    /// Path used in diagnostics; `<input>` when absent.
    pub path: Option<&'a str>,
    /// Pre-registered file id; a fresh one is allocated when absent.
    pub file_id: Option<u32>,
}

/// Pipeline configuration.
#[derive(Copy, Clone, Debug)]
pub struct CompileOptions {
    pub bounds_checks: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            bounds_checks: true,
        }
    }
}

/// Aggregated result of one compilation.
#[derive(Debug)]
pub struct CompileResult {
    /// Owns the diagnostic list and registered source buffers.
    pub emitter: DiagnosticEmitter,
    pub file_id: u32,
    /// Present iff every stage completed without errors.
    pub module: Option<basic_il::Module>,
    /// The analyzed AST, kept for `--dump-ast` and tooling.
    pub program: Option<basic_ir::Program>,
}

impl CompileResult {
    /// Whether compilation completed without recorded errors.
    pub fn succeeded(&self) -> bool {
        self.emitter.error_count() == 0 && self.module.is_some()
    }

    pub fn diagnostics(&self) -> &[basic_diagnostic::Diagnostic] {
        self.emitter.diagnostics()
    }
}

/// Compile BASIC source text into an IL module.
///
/// Stages run strictly in the order parse → fold → analyze → lower, and
/// the pipeline stops at the first stage boundary where `error_count()`
/// is non-zero. The returned result always carries the emitter; `module`
/// is present only on success.
pub fn compile_basic(
    input: CompileInput<'_>,
    options: CompileOptions,
    sm: &mut SourceManager,
) -> CompileResult {
    let mut emitter = DiagnosticEmitter::new();

    let file_id = match input.file_id {
        Some(id) if id != 0 => id,
        _ => sm.add_file(input.path.unwrap_or("<input>")),
    };
    if file_id == 0 {
        emitter.error(
            ErrorCode::B0005,
            0,
            Span::DUMMY,
            "source manager exhausted file identifier space",
        );
        return CompileResult {
            emitter,
            file_id,
            module: None,
            program: None,
        };
    }
    sm.set_source(file_id, input.source);
    emitter.add_source(file_id, input.source);

    let program = {
        let _span = info_span!("parse").entered();
        basic_parse::parse_program(input.source, file_id, Some(&mut emitter))
    };
    if emitter.error_count() > 0 {
        debug!(errors = emitter.error_count(), "stopping after parse");
        return CompileResult {
            emitter,
            file_id,
            module: None,
            program: Some(program),
        };
    }

    let mut program = program;
    {
        let _span = info_span!("fold").entered();
        basic_fold::fold_constants(&mut program);
    }

    let analysis = {
        let _span = info_span!("sema").entered();
        basic_sema::analyze(&mut program, &mut emitter, file_id)
    };
    if emitter.error_count() > 0 {
        debug!(errors = emitter.error_count(), "stopping after analysis");
        return CompileResult {
            emitter,
            file_id,
            module: None,
            program: Some(program),
        };
    }

    let module = {
        let _span = info_span!("lower").entered();
        basic_lower::lower(
            &program,
            &analysis,
            LowerOptions {
                bounds_checks: options.bounds_checks,
            },
        )
    };
    CompileResult {
        emitter,
        file_id,
        module: Some(module),
        program: Some(program),
    }
}
